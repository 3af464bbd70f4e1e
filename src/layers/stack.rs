use serde_json::Value;
use tracing::debug;

use crate::assets::decode::mime_from_source;
use crate::foundation::core::{Canvas, Point, Vec2};
use crate::geometry::coords::Frame;
use crate::layers::model::{
    Background, ImageRef, ImageSlot, Layer, LayerId, LayerKind, TextBox, TextStyle,
};
use crate::layers::property::apply_property;
use crate::text::autofit::AutoFitSettings;
use crate::text::effects::{TextBackground, TextStroke};

/// Offset applied to a duplicated layer.
pub const DUPLICATE_OFFSET: f64 = 20.0;
/// Height of a new text box when none is given.
pub const DEFAULT_TEXT_HEIGHT: f64 = 60.0;

/// Failure of a layer-model operation. The stack is unchanged whenever one is returned.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("no layer with id {0}")]
    UnknownLayer(LayerId),
    #[error("the background layer cannot be deleted or reordered")]
    BackgroundImmutable,
    #[error("layers {0} and {1} are not both reorderable")]
    NotReorderable(LayerId, LayerId),
    #[error("slot {0} is fixed and already holds an image")]
    FixedSlot(LayerId),
    #[error("layer {0} is locked")]
    Locked(LayerId),
    #[error("slot {id} does not accept {mime}")]
    RejectedMime { id: LayerId, mime: String },
    #[error("invalid property \"{path}\": {reason}")]
    InvalidProperty { path: String, reason: String },
    #[error("layer {id} is a {actual} layer, expected {expected}")]
    WrongKind {
        id: LayerId,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("a layer stack needs exactly one background, found {0}")]
    BackgroundCount(usize),
}

/// Initial values for [`LayerStack::add_text_box`]. Unset geometry gets defaults.
#[derive(Clone, Debug, Default)]
pub struct TextBoxInit {
    pub name: Option<String>,
    pub content: String,
    pub field: Option<String>,
    pub frame: Option<Frame>,
    pub style: Option<TextStyle>,
    pub auto_fit: Option<AutoFitSettings>,
    pub stroke: Option<TextStroke>,
    pub background: Option<TextBackground>,
}

/// The layer collection of one document: one background, any number of slots and text boxes,
/// a single z-order and a single selection.
#[derive(Clone, Debug)]
pub struct LayerStack {
    canvas: Canvas,
    layers: Vec<Layer>,
    selected: Option<LayerId>,
}

impl LayerStack {
    /// Stack holding only an empty background.
    pub fn new(canvas: Canvas) -> Self {
        let bg = Layer {
            locked: true,
            ..Layer::new("Background", LayerKind::Background(Background::default()))
        };
        Self {
            canvas,
            layers: vec![bg],
            selected: None,
        }
    }

    /// Rebuild from saved layers. Exactly one background is required.
    pub fn from_layers(canvas: Canvas, layers: Vec<Layer>) -> Result<Self, ModelError> {
        let n = layers.iter().filter(|l| l.is_background()).count();
        if n != 1 {
            return Err(ModelError::BackgroundCount(n));
        }
        let mut stack = Self {
            canvas,
            layers,
            selected: None,
        };
        stack.pin_background();
        Ok(stack)
    }

    /// Working canvas the geometry is expressed in.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// All layers in insertion order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Deep copy of all layers.
    pub fn snapshot(&self) -> Vec<Layer> {
        self.layers.clone()
    }

    /// Number of layers including the background.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Never true: the background always exists.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer by id.
    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    fn get_mut(&mut self, id: LayerId) -> Result<&mut Layer, ModelError> {
        self.layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or(ModelError::UnknownLayer(id))
    }

    fn index_of(&self, id: LayerId) -> Result<usize, ModelError> {
        self.layers
            .iter()
            .position(|l| l.id == id)
            .ok_or(ModelError::UnknownLayer(id))
    }

    /// The background layer.
    pub fn background(&self) -> &Layer {
        // `new` and `from_layers` guarantee one background and `delete` refuses to remove it.
        self.layers
            .iter()
            .find(|l| l.is_background())
            .unwrap_or(&self.layers[0])
    }

    fn background_mut(&mut self) -> Option<&mut Background> {
        self.layers.iter_mut().find_map(|l| match &mut l.kind {
            LayerKind::Background(bg) => Some(bg),
            _ => None,
        })
    }

    /// Layers back to front: stable ascending sort by z-index, ties in insertion order.
    pub fn render_order(&self) -> Vec<&Layer> {
        let mut out: Vec<&Layer> = self.layers.iter().collect();
        out.sort_by_key(|l| (!l.is_background(), l.z_index));
        out
    }

    /// Visible layers back to front.
    pub fn visible_in_order(&self) -> Vec<&Layer> {
        self.render_order()
            .into_iter()
            .filter(|l| l.visible)
            .collect()
    }

    fn max_z(&self) -> i32 {
        self.layers
            .iter()
            .filter(|l| !l.is_background())
            .map(|l| l.z_index)
            .max()
            .unwrap_or(0)
    }

    /// Keep the background strictly below every other layer.
    fn pin_background(&mut self) {
        let min_other = self
            .layers
            .iter()
            .filter(|l| !l.is_background())
            .map(|l| l.z_index)
            .min();
        let z = min_other.map_or(0, |m| m.saturating_sub(1));
        for l in &mut self.layers {
            if l.is_background() {
                l.z_index = z;
            }
        }
    }

    fn push_top(&mut self, mut layer: Layer) -> LayerId {
        layer.z_index = self.max_z().saturating_add(1);
        let id = layer.id;
        self.layers.push(layer);
        self.pin_background();
        id
    }

    /// Add a text box on top and select it.
    ///
    /// Defaults: origin at 25%/25% of the canvas, 50% of the canvas width, 60px tall.
    pub fn add_text_box(&mut self, init: TextBoxInit) -> LayerId {
        let cw = f64::from(self.canvas.width);
        let ch = f64::from(self.canvas.height);
        let frame = init
            .frame
            .unwrap_or(Frame::new(cw * 0.25, ch * 0.25, cw * 0.5, DEFAULT_TEXT_HEIGHT));
        let name = init
            .name
            .unwrap_or_else(|| format!("Text {}", self.count_kind("text") + 1));
        let text = TextBox {
            content: init.content,
            field: init.field,
            frame: frame.sanitize(&frame),
            style: init.style.unwrap_or_default(),
            auto_fit: init.auto_fit.unwrap_or_default(),
            stroke: init.stroke.unwrap_or_default(),
            background: init.background.unwrap_or_default(),
        };
        let id = self.push_top(Layer::new(name, LayerKind::Text(text)));
        self.selected = Some(id);
        debug!(%id, "text box added");
        id
    }

    /// Add an image slot on top.
    pub fn add_image_slot(&mut self, name: impl Into<String>, slot: ImageSlot) -> LayerId {
        self.push_top(Layer::new(name, LayerKind::ImageSlot(slot)))
    }

    fn count_kind(&self, kind: &str) -> usize {
        self.layers.iter().filter(|l| l.kind_name() == kind).count()
    }

    /// Remove a layer. The background cannot be removed.
    pub fn delete(&mut self, id: LayerId) -> Result<Layer, ModelError> {
        let i = self.index_of(id)?;
        if self.layers[i].is_background() {
            return Err(ModelError::BackgroundImmutable);
        }
        let removed = self.layers.remove(i);
        if self.selected == Some(id) {
            self.selected = None;
        }
        self.pin_background();
        debug!(%id, kind = removed.kind_name(), "layer deleted");
        Ok(removed)
    }

    /// Clone a text box with a new id, `" copy"` name suffix, +20/+20 offset, on top and selected.
    pub fn duplicate_text_box(&mut self, id: LayerId) -> Result<LayerId, ModelError> {
        let src = self.get(id).ok_or(ModelError::UnknownLayer(id))?;
        if !matches!(src.kind, LayerKind::Text(_)) {
            return Err(ModelError::WrongKind {
                id,
                expected: "text",
                actual: src.kind_name(),
            });
        }
        let mut copy = src.clone();
        copy.id = LayerId::new();
        copy.name = format!("{} copy", src.name);
        if let Some(f) = copy.frame_mut() {
            *f = f.translate(Vec2::new(DUPLICATE_OFFSET, DUPLICATE_OFFSET));
        }
        let new_id = self.push_top(copy);
        self.selected = Some(new_id);
        Ok(new_id)
    }

    /// Swap the z-indices of two reorderable layers.
    pub fn reorder(&mut self, from: LayerId, to: LayerId) -> Result<(), ModelError> {
        let a = self.index_of(from)?;
        let b = self.index_of(to)?;
        if !(self.layers[a].is_reorderable() && self.layers[b].is_reorderable()) {
            return Err(ModelError::NotReorderable(from, to));
        }
        let za = self.layers[a].z_index;
        self.layers[a].z_index = self.layers[b].z_index;
        self.layers[b].z_index = za;
        Ok(())
    }

    /// Move one step toward the front.
    pub fn move_up(&mut self, id: LayerId) -> Result<(), ModelError> {
        self.move_within(id, |pos, n| (pos + 1).min(n - 1))
    }

    /// Move one step toward the back (never below the background).
    pub fn move_down(&mut self, id: LayerId) -> Result<(), ModelError> {
        self.move_within(id, |pos, _| pos.saturating_sub(1))
    }

    /// Move to the front.
    pub fn move_to_top(&mut self, id: LayerId) -> Result<(), ModelError> {
        self.move_within(id, |_, n| n - 1)
    }

    /// Move to just above the background.
    pub fn move_to_bottom(&mut self, id: LayerId) -> Result<(), ModelError> {
        self.move_within(id, |_, _| 0)
    }

    /// Reposition `id` among the non-background layers and renumber them from 1.
    fn move_within(
        &mut self,
        id: LayerId,
        target: impl FnOnce(usize, usize) -> usize,
    ) -> Result<(), ModelError> {
        let i = self.index_of(id)?;
        if self.layers[i].is_background() {
            return Err(ModelError::BackgroundImmutable);
        }
        let mut order: Vec<LayerId> = self
            .render_order()
            .into_iter()
            .filter(|l| !l.is_background())
            .map(|l| l.id)
            .collect();
        let pos = order
            .iter()
            .position(|x| *x == id)
            .ok_or(ModelError::UnknownLayer(id))?;
        let dest = target(pos, order.len());
        let moved = order.remove(pos);
        order.insert(dest.min(order.len()), moved);

        for (rank, lid) in order.iter().enumerate() {
            if let Some(l) = self.layers.iter_mut().find(|l| l.id == *lid) {
                l.z_index = i32::try_from(rank + 1).unwrap_or(i32::MAX);
            }
        }
        self.pin_background();
        Ok(())
    }

    /// Select `id`, replacing any previous selection.
    pub fn select(&mut self, id: LayerId) -> Result<(), ModelError> {
        self.index_of(id)?;
        self.selected = Some(id);
        Ok(())
    }

    /// Clear the selection.
    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Currently selected layer id.
    pub fn selected(&self) -> Option<LayerId> {
        self.selected
    }

    /// Show or hide a layer without removing it.
    pub fn set_visible(&mut self, id: LayerId, visible: bool) -> Result<(), ModelError> {
        self.get_mut(id)?.visible = visible;
        Ok(())
    }

    /// Lock or unlock a layer.
    pub fn set_locked(&mut self, id: LayerId, locked: bool) -> Result<(), ModelError> {
        self.get_mut(id)?.locked = locked;
        Ok(())
    }

    /// Set a dotted camelCase property, e.g. `crop.top` or `style.fontSize`.
    ///
    /// Locked layers only accept `locked` and `visible`. The background is exempt from the lock.
    pub fn update_property(
        &mut self,
        id: LayerId,
        path: &str,
        value: Value,
    ) -> Result<(), ModelError> {
        let layer = self.get_mut(id)?;
        if layer.locked && !layer.is_background() && !matches!(path, "locked" | "visible") {
            return Err(ModelError::Locked(id));
        }
        apply_property(layer, path, value)?;
        self.pin_background();
        Ok(())
    }

    /// Replace the frame of a slot or text box, sanitized against the previous one.
    pub fn set_frame(&mut self, id: LayerId, frame: Frame) -> Result<(), ModelError> {
        let layer = self.get_mut(id)?;
        if layer.locked {
            return Err(ModelError::Locked(id));
        }
        let f = layer.frame_mut().ok_or(ModelError::BackgroundImmutable)?;
        *f = frame.sanitize(f);
        Ok(())
    }

    /// Set rotation in degrees.
    pub fn set_rotation(&mut self, id: LayerId, deg: f64) -> Result<(), ModelError> {
        let layer = self.get_mut(id)?;
        if layer.locked {
            return Err(ModelError::Locked(id));
        }
        if deg.is_finite() {
            layer.rotation_deg = deg.rem_euclid(360.0);
        }
        Ok(())
    }

    /// Put an image into a slot after checking its MIME type and the fixed flag.
    pub fn set_image(&mut self, id: LayerId, image: ImageRef) -> Result<Option<ImageRef>, ModelError> {
        let layer = self.get_mut(id)?;
        let actual = layer.kind_name();
        let LayerKind::ImageSlot(slot) = &mut layer.kind else {
            return Err(ModelError::WrongKind {
                id,
                expected: "imageSlot",
                actual,
            });
        };
        if slot.fixed && slot.image.is_some() {
            return Err(ModelError::FixedSlot(id));
        }
        let mime = image
            .mime
            .clone()
            .or_else(|| mime_from_source(&image.source).map(str::to_owned))
            .unwrap_or_default();
        if !slot.accepts_mime(&mime) {
            return Err(ModelError::RejectedMime { id, mime });
        }
        Ok(slot.image.replace(image))
    }

    /// Remove the image from a slot. Fixed slots refuse.
    pub fn clear_image(&mut self, id: LayerId) -> Result<Option<ImageRef>, ModelError> {
        let layer = self.get_mut(id)?;
        let actual = layer.kind_name();
        let LayerKind::ImageSlot(slot) = &mut layer.kind else {
            return Err(ModelError::WrongKind {
                id,
                expected: "imageSlot",
                actual,
            });
        };
        if slot.fixed && slot.image.is_some() {
            return Err(ModelError::FixedSlot(id));
        }
        Ok(slot.image.take())
    }

    /// Swap the background and foreground template images.
    pub fn set_template_images(&mut self, image: Option<ImageRef>, foreground: Option<ImageRef>) {
        if let Some(bg) = self.background_mut() {
            bg.image = image;
            bg.foreground = foreground;
        }
    }

    /// Every image source referenced by the stack, template images first, without duplicates.
    pub fn image_sources(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for layer in self.render_order() {
            let refs: [Option<&ImageRef>; 2] = match &layer.kind {
                LayerKind::Background(bg) => [bg.image.as_ref(), bg.foreground.as_ref()],
                LayerKind::ImageSlot(slot) => [slot.image.as_ref(), None],
                LayerKind::Text(_) => [None, None],
            };
            for r in refs.into_iter().flatten() {
                if !out.contains(&r.source) {
                    out.push(r.source.clone());
                }
            }
        }
        out
    }

    /// Topmost visible non-background layer whose (rotated) frame contains `p`.
    pub fn hit_test(&self, p: Point) -> Option<LayerId> {
        self.render_order()
            .into_iter()
            .rev()
            .filter(|l| l.visible && !l.is_background())
            .find(|l| {
                l.frame().is_some_and(|f| {
                    let c = f.center();
                    let local = crate::foundation::core::Affine::rotate_about(
                        -l.rotation_deg.to_radians(),
                        c,
                    ) * p;
                    f.contains(local)
                })
            })
            .map(|l| l.id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/stack.rs"]
mod tests;
