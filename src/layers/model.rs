use serde::{Deserialize, Serialize};

use crate::assets::color::Color;
use crate::foundation::core::Rect;
use crate::geometry::coords::{CenterOffset, Frame, TextAlign};
use crate::geometry::shapes::MaskShape;
use crate::render::pixel;
use crate::text::autofit::{AutoFitSettings, LINE_HEIGHT_FACTOR};
use crate::text::effects::{TextBackground, TextStroke};

/// Stable layer identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub uuid::Uuid);

impl LayerId {
    /// Fresh random id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Layer blend mode applied when compositing onto what is below.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    SoftLight,
    HardLight,
    Difference,
    Exclusion,
}

/// Reference to an image by source path; pixels live in the asset store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// Store-relative path or caller-defined key.
    pub source: String,
    /// MIME type when known; otherwise inferred from the source extension.
    #[serde(default)]
    pub mime: Option<String>,
}

impl ImageRef {
    /// Reference with the MIME type left to inference.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            mime: None,
        }
    }
}

/// Pixels trimmed from each source edge before fitting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Crop {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Crop {
    /// Source rect left after cropping a `w` x `h` image.
    ///
    /// Negative values count as zero. When opposing edges would consume the whole image they are
    /// scaled down so at least one pixel remains.
    pub fn source_rect(&self, w: f64, h: f64) -> Rect {
        let (l, r) = clamp_pair(self.left, self.right, w);
        let (t, b) = clamp_pair(self.top, self.bottom, h);
        Rect::new(l, t, w - r, h - b)
    }
}

fn clamp_pair(a: f64, b: f64, extent: f64) -> (f64, f64) {
    let a = if a.is_finite() { a.max(0.0) } else { 0.0 };
    let b = if b.is_finite() { b.max(0.0) } else { 0.0 };
    let limit = (extent - 1.0).max(0.0);
    let sum = a + b;
    if sum > limit && sum > 0.0 {
        let k = limit / sum;
        (a * k, b * k)
    } else {
        (a, b)
    }
}

/// Clip shape of an image slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mask {
    #[serde(rename = "type")]
    pub shape: MaskShape,
    /// Corner radius for `roundRect`.
    pub radius: f64,
}

/// Percent deltas from neutral plus a blur radius in px.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
    pub blur: f64,
}

impl Filters {
    /// True when no filter changes the pixels.
    pub fn is_neutral(&self) -> bool {
        self.color_matrix().is_none() && self.blur <= 0.0
    }

    /// CSS filter string with only the non-zero deltas, `None` when neutral.
    pub fn css_filter(&self) -> Option<String> {
        let mut parts = Vec::new();
        if self.brightness != 0.0 {
            parts.push(format!("brightness({}%)", 100.0 + self.brightness));
        }
        if self.contrast != 0.0 {
            parts.push(format!("contrast({}%)", 100.0 + self.contrast));
        }
        if self.saturation != 0.0 {
            parts.push(format!("saturate({}%)", 100.0 + self.saturation));
        }
        if self.blur > 0.0 {
            parts.push(format!("blur({}px)", self.blur));
        }
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    /// Brightness, contrast and saturation composed in CSS order, `None` when all are zero.
    pub fn color_matrix(&self) -> Option<[f32; 20]> {
        let mut m: Option<[f32; 20]> = None;
        let mut then = |next: [f32; 20]| {
            m = Some(match m {
                Some(prev) => pixel::compose_color_matrix(next, prev),
                None => next,
            });
        };
        if self.brightness != 0.0 {
            then(pixel::brightness_matrix(pct(self.brightness)));
        }
        if self.contrast != 0.0 {
            then(pixel::contrast_matrix(pct(self.contrast)));
        }
        if self.saturation != 0.0 {
            then(pixel::saturate_matrix(pct(self.saturation)));
        }
        m
    }
}

fn pct(delta: f64) -> f32 {
    ((100.0 + delta) / 100.0).max(0.0) as f32
}

/// Border drawn along the slot frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotStroke {
    pub enabled: bool,
    pub width: f64,
    pub color: Color,
}

impl Default for SlotStroke {
    fn default() -> Self {
        Self {
            enabled: false,
            width: 4.0,
            color: Color::WHITE,
        }
    }
}

/// Soft alpha falloff toward the slot edges.
///
/// Side distances are px. `radial_size` and `linear_size` are percentages of the extent over which
/// alpha fades; `linear_angle` is in degrees, 0 fading toward +x.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EdgeFeather {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
    pub radial_enabled: bool,
    pub radial_size: f64,
    pub linear_enabled: bool,
    pub linear_angle: f64,
    pub linear_size: f64,
}

impl Default for EdgeFeather {
    fn default() -> Self {
        Self {
            top: 0.0,
            right: 0.0,
            bottom: 0.0,
            left: 0.0,
            radial_enabled: false,
            radial_size: 30.0,
            linear_enabled: false,
            linear_angle: 90.0,
            linear_size: 30.0,
        }
    }
}

impl EdgeFeather {
    /// Whether any falloff applies.
    pub fn is_active(&self) -> bool {
        self.top > 0.0
            || self.right > 0.0
            || self.bottom > 0.0
            || self.left > 0.0
            || (self.radial_enabled && self.radial_size > 0.0)
            || (self.linear_enabled && self.linear_size > 0.0)
    }

    /// Side distances multiplied by `k`.
    pub fn scaled(&self, k: f64) -> Self {
        Self {
            top: self.top * k,
            right: self.right * k,
            bottom: self.bottom * k,
            left: self.left * k,
            ..*self
        }
    }
}

/// The template image filling the whole canvas, plus an optional overlay above the slots.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Background {
    pub image: Option<ImageRef>,
    /// Template foreground drawn over image slots and beneath text.
    pub foreground: Option<ImageRef>,
}

fn default_true() -> bool {
    true
}

/// Placeholder for a user image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSlot {
    /// Category-defined role, e.g. `"logo"`.
    #[serde(default)]
    pub slot_key: String,
    pub frame: Frame,
    /// Image placement inside the frame.
    #[serde(default)]
    pub content: CenterOffset,
    #[serde(default)]
    pub crop: Crop,
    #[serde(default)]
    pub mask: Mask,
    #[serde(default)]
    pub flip_h: bool,
    #[serde(default)]
    pub flip_v: bool,
    #[serde(default)]
    pub filters: Filters,
    #[serde(default)]
    pub stroke: SlotStroke,
    #[serde(default)]
    pub edge_feather: EdgeFeather,
    #[serde(default)]
    pub image: Option<ImageRef>,
    /// MIME patterns such as `image/*`. Empty accepts any image.
    #[serde(default)]
    pub accepts: Vec<String>,
    #[serde(default = "default_true")]
    pub reorderable: bool,
    /// A fixed slot's image cannot be cleared or replaced once set.
    #[serde(default)]
    pub fixed: bool,
}

impl ImageSlot {
    /// Empty slot at `frame`.
    pub fn new(slot_key: impl Into<String>, frame: Frame) -> Self {
        Self {
            slot_key: slot_key.into(),
            frame,
            content: CenterOffset::default(),
            crop: Crop::default(),
            mask: Mask::default(),
            flip_h: false,
            flip_v: false,
            filters: Filters::default(),
            stroke: SlotStroke::default(),
            edge_feather: EdgeFeather::default(),
            image: None,
            accepts: Vec::new(),
            reorderable: true,
            fixed: false,
        }
    }

    /// Whether `mime` matches one of the accepted patterns.
    pub fn accepts_mime(&self, mime: &str) -> bool {
        let mime = mime.to_ascii_lowercase();
        if self.accepts.is_empty() {
            return mime.starts_with("image/");
        }
        self.accepts.iter().any(|pat| mime_matches(pat, &mime))
    }
}

fn mime_matches(pattern: &str, mime: &str) -> bool {
    let pattern = pattern.trim().to_ascii_lowercase();
    if pattern == "*/*" || pattern == "*" {
        return true;
    }
    match pattern.strip_suffix("/*") {
        Some(major) => mime
            .split_once('/')
            .is_some_and(|(m, _)| m == major),
        None => pattern == mime,
    }
}

/// Font and paint settings for a text box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: u16,
    pub color: Color,
    pub align: TextAlign,
    /// Multiple of font size between baselines.
    pub line_height: f64,
    /// Extra advance per character in px.
    pub letter_spacing: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Inter".to_owned(),
            font_size: 36.0,
            font_weight: 400,
            color: Color::BLACK,
            align: TextAlign::Left,
            line_height: LINE_HEIGHT_FACTOR,
            letter_spacing: 0.0,
        }
    }
}

/// Free-form or option-bound text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBox {
    #[serde(default)]
    pub content: String,
    /// Category option key whose current value replaces `content`.
    #[serde(default)]
    pub field: Option<String>,
    pub frame: Frame,
    #[serde(default)]
    pub style: TextStyle,
    #[serde(default)]
    pub auto_fit: AutoFitSettings,
    #[serde(default)]
    pub stroke: TextStroke,
    #[serde(default)]
    pub background: TextBackground,
}

/// Variant payload of a [`Layer`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LayerKind {
    Background(Background),
    ImageSlot(ImageSlot),
    Text(TextBox),
}

/// One entry in the layer stack.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: LayerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub rotation_deg: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub blend_mode: BlendMode,
    #[serde(flatten)]
    pub kind: LayerKind,
}

fn default_opacity() -> f64 {
    1.0
}

impl Layer {
    /// Layer with default shared fields and a fresh id.
    pub fn new(name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: LayerId::new(),
            name: name.into(),
            z_index: 0,
            visible: true,
            locked: false,
            rotation_deg: 0.0,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            kind,
        }
    }

    /// Whether this is the background.
    pub fn is_background(&self) -> bool {
        matches!(self.kind, LayerKind::Background(_))
    }

    /// Frame of slot and text layers.
    pub fn frame(&self) -> Option<&Frame> {
        match &self.kind {
            LayerKind::Background(_) => None,
            LayerKind::ImageSlot(s) => Some(&s.frame),
            LayerKind::Text(t) => Some(&t.frame),
        }
    }

    pub(crate) fn frame_mut(&mut self) -> Option<&mut Frame> {
        match &mut self.kind {
            LayerKind::Background(_) => None,
            LayerKind::ImageSlot(s) => Some(&mut s.frame),
            LayerKind::Text(t) => Some(&mut t.frame),
        }
    }

    /// Whether explicit reordering may move this layer.
    pub fn is_reorderable(&self) -> bool {
        match &self.kind {
            LayerKind::Background(_) => false,
            LayerKind::ImageSlot(s) => s.reorderable,
            LayerKind::Text(_) => true,
        }
    }

    /// Short kind label for logs and status messages.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            LayerKind::Background(_) => "background",
            LayerKind::ImageSlot(_) => "imageSlot",
            LayerKind::Text(_) => "text",
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/model.rs"]
mod tests;
