use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::assets::color::Color;
use crate::foundation::core::Canvas;
use crate::geometry::coords::{FieldPosition, Frame, TextAlign};
use crate::geometry::shapes::MaskShape;
use crate::layers::model::TextStyle;

/// Working canvas used when a category does not declare one.
pub const DEFAULT_CANVAS: Canvas = Canvas {
    width: 1200,
    height: 1680,
};

/// Shipped category definitions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub categories: Vec<Category>,
}

impl CategoryConfig {
    pub fn get(&self, key: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.key == key)
    }
}

/// One category: a numbered template set plus its editable options and image slots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub key: String,
    pub label: String,
    /// Folder holding the template images.
    pub folder: String,
    /// Template background extension (`png`, `jpg`, `svg` ...).
    pub ext: String,
    /// Number of templates, numbered from 1.
    pub count: u32,
    #[serde(default)]
    pub options: Vec<OptionDef>,
    #[serde(default)]
    pub slots: Vec<SlotDef>,
    #[serde(default)]
    pub canvas: Option<Canvas>,
}

impl Category {
    pub fn canvas(&self) -> Canvas {
        self.canvas.unwrap_or(DEFAULT_CANVAS)
    }

    /// Background image of template `index`.
    pub fn template_background(&self, index: u32) -> String {
        format!("{}/{}.{}", self.folder.trim_end_matches('/'), index, self.ext)
    }

    /// Optional overlay drawn above the slots.
    pub fn template_foreground(&self, index: u32) -> String {
        format!("{}/{}_fg.png", self.folder.trim_end_matches('/'), index)
    }

    pub fn has_template(&self, index: u32) -> bool {
        (1..=self.count).contains(&index)
    }

    pub fn option(&self, key: &str) -> Option<&OptionDef> {
        self.options.iter().find(|o| o.key == key)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Text,
    Textarea,
    Number,
    Color,
    Select,
}

impl OptionType {
    /// Whether a text box is created for this option by default.
    pub fn is_textual(self) -> bool {
        matches!(self, Self::Text | Self::Textarea)
    }
}

/// A user-editable category option.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDef {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: OptionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Choices of a `select`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Placement of the default text box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<FieldPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<FieldStyle>,
}

/// Image slot declared by a category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDef {
    pub key: String,
    #[serde(default)]
    pub label: String,
    pub frame: Frame,
    #[serde(default)]
    pub mask: MaskShape,
    #[serde(default)]
    pub radius: f64,
    #[serde(default)]
    pub accepts: Vec<String>,
    #[serde(default)]
    pub fixed: bool,
    #[serde(default = "default_true")]
    pub reorderable: bool,
}

fn default_true() -> bool {
    true
}

/// Partial text style; set fields replace the base style's.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
}

impl FieldStyle {
    pub fn apply(&self, style: &mut TextStyle) {
        if let Some(f) = &self.font_family {
            style.font_family.clone_from(f);
        }
        if let Some(s) = self.font_size {
            style.font_size = s;
        }
        if let Some(w) = self.font_weight {
            style.font_weight = w.value();
        }
        if let Some(c) = self.color {
            style.color = c;
        }
        if let Some(a) = self.align {
            style.align = a;
        }
        if let Some(l) = self.line_height {
            style.line_height = l;
        }
    }

    /// `self` with unset fields taken from `base`.
    pub fn or(&self, base: &FieldStyle) -> FieldStyle {
        FieldStyle {
            font_family: self.font_family.clone().or_else(|| base.font_family.clone()),
            font_size: self.font_size.or(base.font_size),
            font_weight: self.font_weight.or(base.font_weight),
            color: self.color.or(base.color),
            align: self.align.or(base.align),
            line_height: self.line_height.or(base.line_height),
        }
    }
}

/// CSS font weight. Accepts numbers, numeric strings and `normal`/`bold`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FontWeight(u16);

impl FontWeight {
    pub const NORMAL: Self = Self(400);
    pub const BOLD: Self = Self(700);

    /// Weight clamped to `1..=1000`.
    pub fn new(value: u16) -> Self {
        Self(value.clamp(1, 1000))
    }

    pub fn value(self) -> u16 {
        self.0
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" | "regular" => Some(Self::NORMAL),
            "bold" => Some(Self::BOLD),
            other => other
                .parse::<u16>()
                .ok()
                .filter(|w| (1..=1000).contains(w))
                .map(Self),
        }
    }
}

impl Serialize for FontWeight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.0)
    }
}

impl<'de> Deserialize<'de> for FontWeight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Str(String),
        }
        let raw = Raw::deserialize(deserializer)?;
        let parsed = match &raw {
            Raw::Num(n) => u16::try_from(*n)
                .ok()
                .filter(|w| (1..=1000).contains(w))
                .map(FontWeight),
            Raw::Str(s) => FontWeight::parse(s),
        };
        parsed.ok_or_else(|| serde::de::Error::custom("font weight must be 1..=1000, normal or bold"))
    }
}

/// Font faces to register before the first text render.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FontManifest {
    pub fonts: Vec<FontEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FontEntry {
    pub family: String,
    /// Font file relative to the asset root.
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// Current admin override document version.
pub const OVERRIDE_VERSION: u32 = 2;

/// Admin-supplied replacements that win over the shipped configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideDoc {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<CategoryConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fonts: Option<FontManifest>,
    /// Text style defaults keyed by option key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_styles: BTreeMap<String, FieldStyle>,
}

impl Default for OverrideDoc {
    fn default() -> Self {
        Self {
            version: OVERRIDE_VERSION,
            categories: None,
            fonts: None,
            field_styles: BTreeMap::new(),
        }
    }
}

impl OverrideDoc {
    pub fn is_empty(&self) -> bool {
        self.categories.is_none() && self.fonts.is_none() && self.field_styles.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/model.rs"]
mod tests;
