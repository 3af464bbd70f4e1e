use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::assets::color::Color;
use crate::assets::fonts::FontBook;
use crate::assets::store::AssetStore;
use crate::compile::compiler::CompileContext;
use crate::config::model::Category;
use crate::config::registry::ConfigRegistry;
use crate::config::validate::{SchemaErrors, validate_option_value};
use crate::export::encode::{ExportSettings, encode_frame};
use crate::export::preset::export_filename;
use crate::export::remote::{
    ExportJobRequest, ExportRoute, PollPolicy, RemoteCompositor, export_with_fallback,
};
use crate::foundation::core::{Canvas, Point};
use crate::foundation::error::{PosterError, PosterResult};
use crate::geometry::coords::{FieldPosition, Frame, MIN_FRAME_EDGE, TextAlign};
use crate::history::History;
use crate::layers::model::{ImageRef, ImageSlot, Layer, LayerId, Mask};
use crate::layers::stack::{DEFAULT_TEXT_HEIGHT, LayerStack, ModelError, TextBoxInit};
use crate::persist::layout::{LayoutMemory, PersistedLayout, layout_key};
use crate::persist::prefs::{load_guide_prefs, save_guide_prefs};
use crate::persist::store::{KeyValueStore, MemoryStore};
use crate::render::backend::{Compositor, RenderOutput};
use crate::session::command::EditorCommand;
use crate::session::gesture::{
    ActiveGesture, GestureKind, GestureState, GestureUpdate, ResizeHandle,
};
use crate::session::scheduler::FrameScheduler;
use crate::snap::engine::{
    Axis, Guide, SnapSettings, compute_snap_candidates, snap_edge, snap_frame,
};
use crate::snap::overlay::GuideOverlay;

/// Status messages kept for the front end.
pub const STATUS_LOG_LEN: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Transient user-facing outcome of an import, export or save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

/// Why a session command was refused. The document is unchanged whenever one is returned.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("invalid document:\n{0}")]
    Schema(#[from] SchemaErrors),
    #[error(transparent)]
    Poster(#[from] PosterError),
    #[error("unknown category \"{0}\"")]
    UnknownCategory(String),
    #[error("category \"{category}\" has no template {index}")]
    UnknownTemplate { category: String, index: u32 },
    #[error("no template is open")]
    NoTemplate,
    #[error("unknown option \"{0}\"")]
    UnknownOption(String),
    #[error("invalid value for \"{key}\": {reason}")]
    InvalidOption { key: String, reason: String },
    #[error("this action must be confirmed")]
    ConfirmationRequired,
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
}

/// Undo state: the layers and option values at one committed moment.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentSnapshot {
    pub layers: Vec<Layer>,
    pub options: BTreeMap<String, String>,
}

/// What a pointer-down landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerTarget {
    /// The canvas; the topmost layer under the pointer is hit-tested.
    Body,
    Resize(LayerId, ResizeHandle),
    Rotate(LayerId),
}

/// An encoded export ready to save or download.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub route: ExportRoute,
}

/// One editing session: the single owner of every piece of mutable editor state.
#[derive(Debug)]
pub struct EditorSession<S: KeyValueStore = MemoryStore> {
    config: ConfigRegistry,
    current: Option<(String, u32)>,
    stack: LayerStack,
    options: BTreeMap<String, String>,
    history: History<DocumentSnapshot>,
    assets: AssetStore,
    fonts: FontBook,
    compositor: Compositor,
    scheduler: FrameScheduler,
    gesture: GestureState,
    gesture_changed: bool,
    guides: GuideOverlay,
    snap: SnapSettings,
    layouts: LayoutMemory<S>,
    statuses: VecDeque<StatusMessage>,
    clear: Color,
}

impl<S: KeyValueStore> EditorSession<S> {
    /// Session over `store`. Stored admin overrides and guide preferences are applied.
    pub fn new(mut config: ConfigRegistry, store: S, assets: AssetStore) -> Self {
        config.load_override(&store);
        let snap = load_guide_prefs(&store);
        Self {
            config,
            current: None,
            stack: LayerStack::new(crate::config::model::DEFAULT_CANVAS),
            options: BTreeMap::new(),
            history: History::default(),
            assets,
            fonts: FontBook::new(),
            compositor: Compositor::default(),
            scheduler: FrameScheduler::default(),
            gesture: GestureState::new(),
            gesture_changed: false,
            guides: GuideOverlay::new(),
            snap,
            layouts: LayoutMemory::new(store),
            statuses: VecDeque::new(),
            clear: Color::WHITE,
        }
    }

    pub fn config(&self) -> &ConfigRegistry {
        &self.config
    }

    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }

    pub fn history(&self) -> &History<DocumentSnapshot> {
        &self.history
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetStore {
        &mut self.assets
    }

    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    pub fn snap_settings(&self) -> &SnapSettings {
        &self.snap
    }

    pub fn guides(&self) -> &[Guide] {
        self.guides.guides()
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn layouts(&self) -> &LayoutMemory<S> {
        &self.layouts
    }

    /// Open category key and template index.
    pub fn current_template(&self) -> Option<(&str, u32)> {
        self.current.as_ref().map(|(c, i)| (c.as_str(), *i))
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear = color;
        self.request_render();
    }

    pub fn statuses(&self) -> impl Iterator<Item = &StatusMessage> {
        self.statuses.iter()
    }

    pub fn last_status(&self) -> Option<&StatusMessage> {
        self.statuses.back()
    }

    fn report(&mut self, kind: StatusKind, text: impl Into<String>) {
        let text = text.into();
        match kind {
            StatusKind::Error => warn!(%text, "status"),
            StatusKind::Info | StatusKind::Success => info!(%text, "status"),
        }
        self.statuses.push_back(StatusMessage { kind, text });
        while self.statuses.len() > STATUS_LOG_LEN {
            self.statuses.pop_front();
        }
    }

    /// Register every font of the effective manifest from the asset root.
    pub fn load_fonts(&mut self) -> Vec<String> {
        let root = self
            .assets
            .root()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let failed = self.fonts.load_manifest(self.config.fonts(), &root);
        if !failed.is_empty() {
            self.report(
                StatusKind::Error,
                format!("fonts failed to load: {}", failed.join(", ")),
            );
        }
        failed
    }

    /// Apply one command. Committing commands record a history snapshot; anything visible
    /// schedules a repaint.
    pub fn dispatch(&mut self, cmd: EditorCommand) -> Result<(), SessionError> {
        let label = cmd.history_label();
        let renders = cmd.affects_render();
        if let Err(e) = self.apply(cmd) {
            debug!(error = %e, "command rejected");
            return Err(e);
        }
        if let Some(label) = label {
            self.commit(label);
        }
        if renders {
            self.request_render();
        }
        Ok(())
    }

    fn apply(&mut self, cmd: EditorCommand) -> Result<(), SessionError> {
        match cmd {
            EditorCommand::OpenTemplate { category, index } => self.open_template(&category, index),
            EditorCommand::SetOption { key, value } => self.set_option(&key, &value),
            EditorCommand::AddTextBox(init) => {
                self.stack.add_text_box(init);
                Ok(())
            }
            EditorCommand::DeleteLayer { id, confirmed } => {
                confirm(confirmed)?;
                model(self.stack.delete(id))
            }
            EditorCommand::DuplicateTextBox(id) => model(self.stack.duplicate_text_box(id)),
            EditorCommand::Reorder { from, to } => model(self.stack.reorder(from, to)),
            EditorCommand::MoveUp(id) => model(self.stack.move_up(id)),
            EditorCommand::MoveDown(id) => model(self.stack.move_down(id)),
            EditorCommand::MoveToTop(id) => model(self.stack.move_to_top(id)),
            EditorCommand::MoveToBottom(id) => model(self.stack.move_to_bottom(id)),
            EditorCommand::Select(id) => model(self.stack.select(id)),
            EditorCommand::Deselect => {
                self.stack.deselect();
                Ok(())
            }
            EditorCommand::SetVisible { id, visible } => model(self.stack.set_visible(id, visible)),
            EditorCommand::SetLocked { id, locked } => model(self.stack.set_locked(id, locked)),
            EditorCommand::UpdateProperty { id, path, value } => {
                model(self.stack.update_property(id, &path, value))
            }
            EditorCommand::SetFrame { id, frame } => model(self.stack.set_frame(id, frame)),
            EditorCommand::SetRotation { id, degrees } => model(self.stack.set_rotation(id, degrees)),
            EditorCommand::SetImage { id, image } => {
                let source = image.source.clone();
                self.stack.set_image(id, image)?;
                self.assets.request(&source);
                Ok(())
            }
            EditorCommand::ClearImage(id) => model(self.stack.clear_image(id)),
            EditorCommand::Undo => {
                let snap = self
                    .history
                    .undo()
                    .map(|e| e.state.clone())
                    .ok_or(SessionError::NothingToUndo)?;
                self.restore(snap)
            }
            EditorCommand::Redo => {
                let snap = self
                    .history
                    .redo()
                    .map(|e| e.state.clone())
                    .ok_or(SessionError::NothingToRedo)?;
                self.restore(snap)
            }
            EditorCommand::SaveLayout => self.save_layout(),
            EditorCommand::ResetLayout { confirmed } => {
                confirm(confirmed)?;
                self.reset_layout()
            }
            EditorCommand::SetSnapSettings(settings) => {
                self.set_snap_settings(settings);
                Ok(())
            }
            EditorCommand::ImportCategories(text) => {
                let result = self.config.import_categories(&text);
                self.finish_import("category config", result.map(|_| ()))
            }
            EditorCommand::ImportOverride(text) => {
                let result = self.config.import_override(&text);
                self.finish_import("admin override", result)
            }
            EditorCommand::DeleteCategory { key, confirmed } => {
                confirm(confirmed)?;
                if !self.config.delete_category(&key) {
                    return Err(SessionError::UnknownCategory(key));
                }
                self.persist_override();
                self.report(StatusKind::Success, format!("category \"{key}\" deleted"));
                Ok(())
            }
            EditorCommand::ClearOverride { confirmed } => {
                confirm(confirmed)?;
                self.config.clear_override();
                self.persist_override();
                self.report(StatusKind::Success, "admin override cleared");
                Ok(())
            }
        }
    }

    fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            layers: self.stack.snapshot(),
            options: self.options.clone(),
        }
    }

    fn commit(&mut self, label: &str) {
        let snap = self.snapshot();
        self.history.push(label, snap);
    }

    fn restore(&mut self, snap: DocumentSnapshot) -> Result<(), SessionError> {
        let selected = self.stack.selected();
        let mut stack = LayerStack::from_layers(self.stack.canvas(), snap.layers)?;
        if let Some(id) = selected
            && stack.get(id).is_some()
        {
            stack.select(id)?;
        }
        self.stack = stack;
        self.options = snap.options;
        self.request_stack_assets();
        Ok(())
    }

    /// Switch template. The open layout is saved first; the new one is restored from layout
    /// memory or built from the category defaults.
    pub fn open_template(&mut self, category: &str, index: u32) -> Result<(), SessionError> {
        let cat = self
            .config
            .category(category)
            .cloned()
            .ok_or_else(|| SessionError::UnknownCategory(category.to_owned()))?;
        if !cat.has_template(index) {
            return Err(SessionError::UnknownTemplate {
                category: category.to_owned(),
                index,
            });
        }
        if let Err(e) = self.save_current_layout() {
            self.report(StatusKind::Error, format!("could not save layout: {e}"));
        }

        let key = layout_key(&cat.key, index);
        let restored = match self.layouts.load(&key, cat.canvas()) {
            Ok(Some(layout)) => match layout.into_stack() {
                Ok(pair) => Some(pair),
                Err(e) => {
                    warn!(%key, error = %e, "saved layout unusable; using defaults");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(%key, error = %e, "layout memory unavailable; using defaults");
                None
            }
        };
        let was_restored = restored.is_some();
        let mut options = default_options(&cat);
        let stack = match restored {
            Some((stack, saved)) => {
                options.extend(saved);
                stack
            }
            None => self.default_stack(&cat),
        };
        self.install(&cat, index, stack, options);
        self.history.clear();
        self.commit("Open template");
        info!(category = %cat.key, index, restored = was_restored, "template opened");
        Ok(())
    }

    fn install(
        &mut self,
        cat: &Category,
        index: u32,
        mut stack: LayerStack,
        options: BTreeMap<String, String>,
    ) {
        stack.set_template_images(
            Some(ImageRef::new(cat.template_background(index))),
            Some(ImageRef::new(cat.template_foreground(index))),
        );
        self.stack = stack;
        self.options = options;
        self.current = Some((cat.key.clone(), index));
        self.gesture.end();
        self.gesture_changed = false;
        self.guides.clear();
        self.request_stack_assets();
    }

    /// Background, one layer per category slot and one text box per text option.
    fn default_stack(&self, cat: &Category) -> LayerStack {
        let canvas = cat.canvas();
        let mut stack = LayerStack::new(canvas);
        for def in &cat.slots {
            let mut slot = ImageSlot::new(def.key.clone(), def.frame);
            slot.mask = Mask {
                shape: def.mask,
                radius: def.radius,
            };
            slot.accepts.clone_from(&def.accepts);
            slot.fixed = def.fixed;
            slot.reorderable = def.reorderable;
            let name = if def.label.is_empty() { &def.key } else { &def.label };
            stack.add_image_slot(name.clone(), slot);
        }

        let textual = cat.options.iter().filter(|o| o.kind.is_textual());
        for (row, opt) in textual.enumerate() {
            let style = self.config.text_style_for(&cat.key, &opt.key);
            let position = opt.position.unwrap_or(FieldPosition {
                x: match style.align {
                    TextAlign::Left => 0.1,
                    TextAlign::Center => 0.5,
                    TextAlign::Right => 0.9,
                },
                y: 0.1 + 0.1 * row as f64,
                max_width: 0.8,
            });
            let height = DEFAULT_TEXT_HEIGHT.max(style.font_size * style.line_height);
            stack.add_text_box(TextBoxInit {
                name: Some(opt.label.clone()),
                content: opt.default.clone().unwrap_or_default(),
                field: Some(opt.key.clone()),
                frame: Some(position.to_frame(canvas, style.align, height)),
                style: Some(style),
                ..TextBoxInit::default()
            });
        }
        stack.deselect();
        stack
    }

    fn set_option(&mut self, key: &str, value: &str) -> Result<(), SessionError> {
        let (category, _) = self.current.as_ref().ok_or(SessionError::NoTemplate)?;
        let def = self
            .config
            .category(category)
            .and_then(|c| c.option(key))
            .ok_or_else(|| SessionError::UnknownOption(key.to_owned()))?;
        let value = validate_option_value(def, value).map_err(|reason| SessionError::InvalidOption {
            key: key.to_owned(),
            reason,
        })?;
        self.options.insert(key.to_owned(), value);
        Ok(())
    }

    /// Persist the open layout. Returns whether anything was saved.
    pub fn save_current_layout(&mut self) -> PosterResult<bool> {
        let Some((category, index)) = &self.current else {
            return Ok(false);
        };
        let key = layout_key(category, *index);
        let layout = PersistedLayout::capture(&self.stack, &self.options);
        self.layouts.save(&key, &layout)?;
        Ok(true)
    }

    fn save_layout(&mut self) -> Result<(), SessionError> {
        match self.save_current_layout() {
            Ok(true) => {
                self.report(StatusKind::Success, "layout saved");
                Ok(())
            }
            Ok(false) => Err(SessionError::NoTemplate),
            Err(e) => {
                self.report(StatusKind::Error, format!("save failed: {e}"));
                Err(e.into())
            }
        }
    }

    fn reset_layout(&mut self) -> Result<(), SessionError> {
        let (category, index) = self.current.clone().ok_or(SessionError::NoTemplate)?;
        let cat = self
            .config
            .category(&category)
            .cloned()
            .ok_or(SessionError::UnknownCategory(category))?;
        self.layouts.remove(&layout_key(&cat.key, index))?;
        let stack = self.default_stack(&cat);
        self.install(&cat, index, stack, default_options(&cat));
        Ok(())
    }

    fn set_snap_settings(&mut self, settings: SnapSettings) {
        self.snap = settings;
        if !settings.show_guides {
            self.guides.clear();
        }
        if let Err(e) = save_guide_prefs(self.layouts.store_mut(), &settings) {
            warn!(error = %e, "guide preferences not saved");
        }
    }

    /// Adopt guide preferences stored on the backend. Local preferences stay in effect when the
    /// backend has none or cannot be reached.
    pub fn pull_remote_prefs(&mut self, remote: &mut dyn RemoteCompositor) -> bool {
        match remote.load_prefs() {
            Ok(Some(settings)) => {
                self.set_snap_settings(settings);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "remote preferences unavailable; keeping local");
                false
            }
        }
    }

    /// Store the current guide preferences on the backend.
    pub fn push_remote_prefs(&mut self, remote: &mut dyn RemoteCompositor) -> PosterResult<()> {
        remote.save_prefs(&self.snap)
    }

    fn finish_import(&mut self, what: &str, result: Result<(), SchemaErrors>) -> Result<(), SessionError> {
        match result {
            Ok(()) => {
                self.persist_override();
                self.report(StatusKind::Success, format!("{what} imported"));
                Ok(())
            }
            Err(errs) => {
                self.report(
                    StatusKind::Error,
                    format!("{what} rejected with {} problem(s)", errs.len()),
                );
                Err(errs.into())
            }
        }
    }

    fn persist_override(&mut self) {
        if let Err(e) = self.config.save_override(self.layouts.store_mut()) {
            self.report(StatusKind::Error, format!("could not store override: {e}"));
        }
    }

    /// Decode uploaded bytes as `source` and put them into slot `id`.
    pub fn upload_image(&mut self, id: LayerId, image: ImageRef, bytes: &[u8]) -> Result<(), SessionError> {
        if let Err(e) = self.assets.insert_bytes(&image.source, bytes) {
            self.report(StatusKind::Error, format!("could not read {}: {e}", image.source));
            return Err(e.into());
        }
        self.dispatch(EditorCommand::SetImage { id, image })
    }

    fn request_stack_assets(&mut self) {
        for source in self.stack.image_sources() {
            self.assets.request(&source);
        }
    }

    // Pointer interaction.

    /// Start a drag, resize or rotate. Returns the layer that was hit and selected.
    ///
    /// Locked layers are selected but do not move.
    pub fn pointer_down(&mut self, p: Point, target: PointerTarget) -> Option<LayerId> {
        self.gesture.end();
        self.gesture_changed = false;
        let (id, kind) = match target {
            PointerTarget::Body => match self.stack.hit_test(p) {
                Some(id) => (id, GestureKind::Drag),
                None => {
                    self.stack.deselect();
                    self.request_render();
                    return None;
                }
            },
            PointerTarget::Resize(id, handle) => (id, GestureKind::Resize(handle)),
            PointerTarget::Rotate(id) => (id, GestureKind::Rotate),
        };
        let layer = self.stack.get(id)?;
        let start_frame = *layer.frame()?;
        let start_rotation = layer.rotation_deg;
        let locked = layer.locked;
        self.stack.select(id).ok()?;
        if !locked {
            self.gesture.begin(ActiveGesture {
                kind,
                layer: id,
                start_pointer: p,
                start_frame,
                start_rotation,
            });
        }
        self.request_render();
        Some(id)
    }

    /// Continue the active gesture. Returns whether the layer changed.
    pub fn pointer_move(&mut self, p: Point, snap_angle: bool) -> bool {
        let Some(g) = self.gesture.active().copied() else {
            return false;
        };
        let Some(update) = self.gesture.update(p, snap_angle) else {
            return false;
        };
        let applied = match update {
            GestureUpdate::Frame(frame) => {
                let (frame, guides) = match g.kind {
                    GestureKind::Drag => self.snap_drag(g.layer, frame),
                    GestureKind::Resize(handle) if g.start_rotation == 0.0 => {
                        self.snap_resize(g.layer, frame, handle)
                    }
                    _ => (frame, Vec::new()),
                };
                if self.snap.show_guides {
                    self.guides.show(guides);
                }
                self.stack.set_frame(g.layer, frame)
            }
            GestureUpdate::Rotation(deg) => self.stack.set_rotation(g.layer, deg),
        };
        match applied {
            Ok(()) => {
                self.gesture_changed = true;
                self.request_render();
                true
            }
            Err(e) => {
                debug!(error = %e, "gesture update refused");
                false
            }
        }
    }

    /// Pointer released or left the canvas. Always ends the gesture; a gesture that moved
    /// something commits one history entry.
    pub fn pointer_up(&mut self, now: Instant) -> bool {
        let ended = self.gesture.end();
        self.guides.release(now);
        let changed = std::mem::take(&mut self.gesture_changed);
        match ended {
            Some(g) if changed => {
                self.commit(match g.kind {
                    GestureKind::Drag => "Move layer",
                    GestureKind::Resize(_) => "Resize layer",
                    GestureKind::Rotate => "Rotate layer",
                });
                true
            }
            _ => false,
        }
    }

    fn snap_drag(&self, id: LayerId, frame: Frame) -> (Frame, Vec<Guide>) {
        let r = snap_frame(
            &frame,
            Some(id),
            self.stack.layers(),
            self.stack.canvas(),
            &self.snap,
        );
        (Frame::new(r.x, r.y, frame.width, frame.height), r.guides)
    }

    /// Snap only the edges the handle moves.
    fn snap_resize(&self, id: LayerId, mut f: Frame, handle: ResizeHandle) -> (Frame, Vec<Guide>) {
        if !self.snap.enabled {
            return (f, Vec::new());
        }
        let candidates =
            compute_snap_candidates(Some(id), self.stack.layers(), self.stack.canvas(), &self.snap);
        let t = self.snap.threshold;
        let mut guides = Vec::new();
        let (ex, ey) = handle.edges();
        for (axis, edge) in [(Axis::X, ex), (Axis::Y, ey)] {
            let (pos, len) = match axis {
                Axis::X => (f.x, f.width),
                Axis::Y => (f.y, f.height),
            };
            let probe = match edge {
                1 => pos + len,
                -1 => pos,
                _ => continue,
            };
            let Some((v, g)) = snap_edge(probe, axis, &candidates, t) else {
                continue;
            };
            let (new_pos, new_len) = if edge == 1 {
                (pos, (v - pos).max(MIN_FRAME_EDGE))
            } else {
                let far = pos + len;
                let p = v.min(far - MIN_FRAME_EDGE);
                (p, far - p)
            };
            match axis {
                Axis::X => (f.x, f.width) = (new_pos, new_len),
                Axis::Y => (f.y, f.height) = (new_pos, new_len),
            }
            guides.push(g);
        }
        (f, guides)
    }

    // Rendering.

    /// Schedule a repaint on the next frame. Returns whether a new frame was scheduled.
    pub fn request_render(&mut self) -> bool {
        self.scheduler.request(Instant::now())
    }

    /// Frame callback: repaint when one is pending.
    pub fn on_frame(&mut self) -> PosterResult<Option<RenderOutput>> {
        if !self.scheduler.on_frame() {
            return Ok(None);
        }
        self.render_preview()
    }

    /// Timer tick: expire lingering guides and run a starved repaint.
    pub fn poll(&mut self, now: Instant) -> PosterResult<Option<RenderOutput>> {
        self.guides.tick(now);
        if !self.scheduler.poll_fallback(now) {
            return Ok(None);
        }
        self.render_preview()
    }

    /// Load every pending image; schedules a follow-up render when any became ready.
    pub fn resolve_assets(&mut self) -> Vec<String> {
        let ready = self.assets.resolve_pending();
        if !ready.is_empty() {
            self.request_render();
        }
        ready
    }

    /// Render at the working canvas size.
    pub fn render_preview(&mut self) -> PosterResult<Option<RenderOutput>> {
        let canvas = self.stack.canvas();
        self.render_at(canvas)
    }

    /// Render onto a `target`-sized surface. `Ok(None)` while another render is in flight.
    pub fn render_at(&mut self, target: Canvas) -> PosterResult<Option<RenderOutput>> {
        let mut cx = CompileContext {
            assets: &self.assets,
            fonts: &mut self.fonts,
            options: &self.options,
            clear: self.clear,
        };
        self.compositor.render(&self.stack, target, &mut cx)
    }

    // Export.

    /// Render and encode locally.
    pub fn export(&mut self, settings: &ExportSettings) -> PosterResult<ExportedFile> {
        self.export_with_remote(None, settings, PollPolicy::default(), std::thread::sleep)
    }

    /// Export through `remote` when given, falling back to the local renderer.
    pub fn export_with_remote(
        &mut self,
        remote: Option<&mut dyn RemoteCompositor>,
        settings: &ExportSettings,
        policy: PollPolicy,
        sleep: impl FnMut(Duration),
    ) -> PosterResult<ExportedFile> {
        settings.validate()?;
        let target = settings.size.canvas();
        let category = self
            .current
            .as_ref()
            .map_or("poster", |(c, _)| c.as_str());
        let filename = export_filename(category, &settings.size, settings.format);
        let request = ExportJobRequest {
            project_data: serde_json::to_value(PersistedLayout::capture(&self.stack, &self.options))?,
            format: settings.format,
            width: target.width,
            height: target.height,
            quality: settings.quality,
        };
        let outcome = export_with_fallback(remote, &request, policy, sleep, || {
            self.encode_local(target, settings)
        });
        match outcome {
            Ok(o) => {
                if let Some(err) = &o.remote_error {
                    self.report(
                        StatusKind::Info,
                        format!("remote export unavailable ({err}); exported locally"),
                    );
                }
                self.report(StatusKind::Success, format!("exported {filename}"));
                Ok(ExportedFile {
                    filename,
                    bytes: o.bytes,
                    route: o.route,
                })
            }
            Err(e) => {
                self.report(StatusKind::Error, format!("export failed: {e}"));
                Err(e)
            }
        }
    }

    fn encode_local(&mut self, target: Canvas, settings: &ExportSettings) -> PosterResult<Vec<u8>> {
        self.assets.resolve_pending();
        let out = self
            .render_at(target)?
            .ok_or_else(|| PosterError::render("a render is already in progress"))?;
        encode_frame(&out.frame, settings.format, settings.quality)
    }
}

fn confirm(confirmed: bool) -> Result<(), SessionError> {
    if confirmed {
        Ok(())
    } else {
        Err(SessionError::ConfirmationRequired)
    }
}

fn model<T>(result: Result<T, ModelError>) -> Result<(), SessionError> {
    result.map(drop).map_err(SessionError::from)
}

fn default_options(cat: &Category) -> BTreeMap<String, String> {
    cat.options
        .iter()
        .filter_map(|o| o.default.clone().map(|d| (o.key.clone(), d)))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;
