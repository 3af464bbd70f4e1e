use smallvec::SmallVec;

use crate::assets::color::Color;
use crate::assets::fonts::{FontKey, PlacedGlyph};
use crate::assets::store::PreparedImage;
use crate::foundation::core::{Affine, BezPath, Rect, Size, Vec2};
use crate::layers::model::{BlendMode, EdgeFeather, LayerId};
use crate::text::effects::TextPass;

/// Backend-agnostic draw list for one target surface.
///
/// Ops are in paint order: background, image slots by z-index, foreground, then text by z-index.
#[derive(Clone, Debug)]
pub struct RenderPlan {
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
    /// Color the surface is cleared to before drawing.
    pub clear: Color,
    /// Draw ops in paint order.
    pub ops: Vec<DrawOp>,
    /// Image sources referenced by visible layers that were not ready at compile time.
    pub pending_sources: Vec<String>,
}

impl RenderPlan {
    /// Layer ids in draw order; template ops have no id and are skipped.
    pub fn layer_order(&self) -> Vec<LayerId> {
        self.ops.iter().filter_map(DrawOp::layer).collect()
    }
}

/// One compositing step.
#[derive(Clone, Debug)]
pub enum DrawOp {
    /// Raster content clipped to a frame (background, foreground and image slots).
    Image(ImageOp),
    /// A laid-out text block.
    Text(TextOp),
}

impl DrawOp {
    /// Source layer of the op.
    pub fn layer(&self) -> Option<LayerId> {
        match self {
            DrawOp::Image(op) => op.layer,
            DrawOp::Text(op) => Some(op.layer),
        }
    }
}

/// Stroke along the clip outline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutlineStroke {
    pub width: f64,
    pub color: Color,
}

/// Image drawn into a clip region centered on `transform`'s origin.
#[derive(Clone, Debug)]
pub struct ImageOp {
    /// Source layer; `None` for template background and foreground.
    pub layer: Option<LayerId>,
    pub image: PreparedImage,
    /// Source pixels used after cropping.
    pub src: Rect,
    /// Drawn size of the cropped source after cover-fit and content scale.
    pub dest_size: Size,
    /// Offset of the drawn image center from the clip center.
    pub dest_offset: Vec2,
    /// Size of the clip region: always the slot frame, masked or not.
    ///
    /// Overflow from cover-fit or content scale is cut at the frame edge, and the mask shape is
    /// sized from the frame rather than from `dest_size`, so a zoomed image stays inside its slot.
    pub clip_size: Size,
    /// Clip shape in local coordinates when masked; otherwise the clip rect is used.
    pub mask: Option<BezPath>,
    /// Local-to-target transform: translate to frame center, then rotate.
    pub transform: Affine,
    /// Mirror the drawn image about its own center.
    pub flip_h: bool,
    pub flip_v: bool,
    pub color_matrix: Option<[f32; 20]>,
    /// Gaussian blur standard deviation in target px.
    pub blur_px: f32,
    pub feather: Option<EdgeFeather>,
    pub stroke: Option<OutlineStroke>,
    pub opacity: f32,
    pub blend: BlendMode,
}

impl ImageOp {
    /// Local clip rect centered at the origin.
    pub fn clip_rect(&self) -> Rect {
        let (w, h) = (self.clip_size.width, self.clip_size.height);
        Rect::new(-w / 2.0, -h / 2.0, w / 2.0, h / 2.0)
    }

    /// Local rect the source is drawn into.
    pub fn dest_rect(&self) -> Rect {
        let (w, h) = (self.dest_size.width, self.dest_size.height);
        Rect::new(-w / 2.0, -h / 2.0, w / 2.0, h / 2.0) + self.dest_offset
    }
}

/// One shaped line placed in local coordinates.
#[derive(Clone, Debug)]
pub struct TextLineOp {
    pub text: String,
    /// Left edge of the line.
    pub x: f64,
    /// Top of the line box.
    pub y: f64,
    /// Offset from the line top to the glyph origin.
    pub baseline_shift: f64,
    pub glyphs: Vec<PlacedGlyph>,
}

/// Text block centered on `transform`'s origin.
#[derive(Clone, Debug)]
pub struct TextOp {
    pub layer: LayerId,
    /// `None` when the family is not registered; the block is then skipped at draw time.
    pub font: Option<FontKey>,
    pub font_size: f64,
    pub line_height: f64,
    pub lines: Vec<TextLineOp>,
    /// Paint passes with background rects in local coordinates.
    pub passes: SmallVec<[TextPass; 3]>,
    pub transform: Affine,
    pub opacity: f32,
    pub blend: BlendMode,
}
