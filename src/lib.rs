//! posterkit is a layered poster compositor.
//!
//! A poster is a [`LayerStack`]: one template background, any number of masked image slots and
//! auto-fitting text boxes. The same [`Compositor`] paints the stack for preview and for export
//! at any [`ExportSize`]; only the target canvas differs.
//!
//! - Load categories and fonts into a [`ConfigRegistry`]
//! - Drive edits through an [`EditorSession`] (commands, pointer gestures, undo/redo)
//! - Export with [`EditorSession::export`], or through a [`RemoteCompositor`] with local fallback
#![forbid(unsafe_code)]

mod assets;
mod foundation;

pub(crate) mod compile;
pub(crate) mod config;
pub(crate) mod export;
pub(crate) mod geometry;
pub(crate) mod history;
pub(crate) mod layers;
pub(crate) mod persist;
pub(crate) mod render;
pub(crate) mod session;
pub(crate) mod snap;
pub(crate) mod text;

pub use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rect, Rgba8Premul, Size, Vec2};
pub use crate::foundation::error::{PosterError, PosterResult};

pub use crate::assets::color::Color;
pub use crate::assets::decode::{decode_for_source, decode_image, decode_svg, mime_from_source};
pub use crate::assets::fonts::{FontBook, FontKey, PlacedGlyph, ShapedLine};
pub use crate::assets::store::{AssetState, AssetStore, PreparedImage, normalize_rel_path};

pub use crate::geometry::coords::{
    CenterOffset, FieldPosition, Frame, MIN_FRAME_EDGE, NormalizedFrame, SurfaceMapping,
    TextAlign, canvas_to_normalized, canvas_to_screen, normalized_to_canvas, point_in_rect,
    screen_to_canvas,
};
pub use crate::geometry::fit::{FitRect, contain_fit, cover_fit};
pub use crate::geometry::shapes::{MaskShape, mask_path, rounded_rect_path};

pub use crate::text::autofit::{
    AutoFitSettings, FitRequest, FitResult, FitStrategy, LINE_HEIGHT_FACTOR, auto_fit,
    block_height,
};
pub use crate::text::effects::{TextBackground, TextStroke};
pub use crate::text::measure::{FixedAdvance, FontMeasurer, TextMeasure};
pub use crate::text::wrap::{widest_line, wrap};

pub use crate::layers::model::{
    Background, BlendMode, Crop, EdgeFeather, Filters, ImageRef, ImageSlot, Layer, LayerId,
    LayerKind, Mask, SlotStroke, TextBox, TextStyle,
};
pub use crate::layers::stack::{
    DEFAULT_TEXT_HEIGHT, DUPLICATE_OFFSET, LayerStack, ModelError, TextBoxInit,
};

pub use crate::compile::compiler::{CompileContext, compile_frame};
pub use crate::compile::plan::{DrawOp, ImageOp, OutlineStroke, RenderPlan, TextLineOp, TextOp};
pub use crate::render::backend::{
    Compositor, FrameRGBA, RenderBackend, RenderOutput, RenderState,
};
pub use crate::render::cpu::CpuBackend;

pub use crate::snap::engine::{
    Axis, DEFAULT_SNAP_THRESHOLD, Guide, SnapCandidate, SnapResult, SnapSettings, SnapSource,
    compute_snap_candidates, find_snap_points, snap_edge, snap_frame,
};
pub use crate::snap::overlay::{GUIDE_LINGER, GuideOverlay};

pub use crate::history::{History, HistoryEntry, MAX_HISTORY};

pub use crate::persist::layout::{
    LAYOUT_VERSION, LayoutMemory, PersistedLayout, layout_key, migrate_layout,
};
pub use crate::persist::prefs::{GUIDE_PREFS_KEY, load_guide_prefs, save_guide_prefs};
pub use crate::persist::store::{FileStore, KeyValueStore, MemoryStore};

pub use crate::config::model::{
    Category, CategoryConfig, DEFAULT_CANVAS, FieldStyle, FontEntry, FontManifest, FontWeight,
    OVERRIDE_VERSION, OptionDef, OptionType, OverrideDoc, SlotDef,
};
pub use crate::config::registry::{ConfigRegistry, OVERRIDE_KEY};
pub use crate::config::validate::{
    SchemaError, SchemaErrors, category_config_from_value, font_manifest_from_value,
    migrate_override, parse_category_config, parse_font_manifest, parse_override,
    validate_option_value,
};

pub use crate::export::encode::{DEFAULT_JPEG_QUALITY, ExportSettings, encode_frame, write_export};
#[cfg(feature = "remote")]
pub use crate::export::http::HttpRemote;
pub use crate::export::preset::{
    ExportFormat, ExportPreset, ExportSize, PRESETS, export_filename, preset,
};
pub use crate::export::remote::{
    ExportJobRequest, ExportOutcome, ExportRoute, JobState, JobStatus, PollPolicy,
    RemoteCompositor, SubmittedJob, export_with_fallback, poll_job,
};

pub use crate::session::command::EditorCommand;
pub use crate::session::editor::{
    DocumentSnapshot, EditorSession, ExportedFile, PointerTarget, STATUS_LOG_LEN, SessionError,
    StatusKind, StatusMessage,
};
pub use crate::session::gesture::{
    ActiveGesture, GestureKind, GestureState, GestureUpdate, ROTATION_SNAP_DEG, ResizeHandle,
    drag_frame, resize_frame, rotate_angle,
};
pub use crate::session::scheduler::{DEFAULT_FALLBACK, FrameScheduler};
