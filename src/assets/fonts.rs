use std::borrow::Cow;
use std::path::Path;

use tracing::{debug, warn};

use crate::assets::color::Color;
use crate::assets::store::normalize_rel_path;
use crate::config::model::FontManifest;
use crate::foundation::error::{PosterError, PosterResult};

/// Advance used for every character when a family is not registered, in ems.
pub const FALLBACK_ADVANCE_EM: f64 = 0.55;

/// Handle to one registered font face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FontKey(pub(crate) usize);

/// A glyph positioned relative to the top-left of its line box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedGlyph {
    /// Glyph id within the face.
    pub id: u32,
    /// Horizontal pen position.
    pub x: f32,
    /// Baseline position.
    pub y: f32,
}

/// One line of shaped text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapedLine {
    /// Advance width of the line.
    pub width: f64,
    /// Glyphs in visual order.
    pub glyphs: Vec<PlacedGlyph>,
}

struct LoadedFace {
    family_lc: String,
    weight: u16,
    parley_family: String,
    data: vello_cpu::peniko::FontData,
}

/// Registered font faces plus the Parley contexts used to shape text with them.
pub struct FontBook {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Color>,
    faces: Vec<LoadedFace>,
}

impl Default for FontBook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.faces.len())
            .finish()
    }
}

impl FontBook {
    /// Empty book with fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            faces: Vec::new(),
        }
    }

    /// Register one face under `family` at `weight`.
    ///
    /// Registering the same (family, weight) twice replaces the earlier face.
    pub fn register(&mut self, family: &str, weight: u16, bytes: Vec<u8>) -> PosterResult<FontKey> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            PosterError::asset(format!("no font families registered for \"{family}\""))
        })?;
        let parley_family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| PosterError::asset("registered font family has no name"))?
            .to_string();

        let face = LoadedFace {
            family_lc: family.to_lowercase(),
            weight,
            parley_family,
            data: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0),
        };

        if let Some(i) = self
            .faces
            .iter()
            .position(|f| f.family_lc == face.family_lc && f.weight == weight)
        {
            self.faces[i] = face;
            return Ok(FontKey(i));
        }
        self.faces.push(face);
        debug!(family, weight, "font registered");
        Ok(FontKey(self.faces.len() - 1))
    }

    /// Load every manifest entry from `root`. Failures are logged and returned, never fatal.
    pub fn load_manifest(&mut self, manifest: &FontManifest, root: &Path) -> Vec<String> {
        let mut failed = Vec::new();
        for entry in &manifest.fonts {
            let weight = entry.weight.map(|w| w.value()).unwrap_or(400);
            let loaded = normalize_rel_path(&entry.src)
                .and_then(|rel| {
                    std::fs::read(root.join(&rel))
                        .map_err(|e| PosterError::asset(format!("read font {rel}: {e}")))
                })
                .and_then(|bytes| self.register(&entry.family, weight, bytes));
            if let Err(e) = loaded {
                warn!(family = %entry.family, src = %entry.src, error = %e, "font load failed");
                failed.push(entry.family.clone());
            }
        }
        failed
    }

    /// Whether any face of `family` is registered.
    pub fn has_family(&self, family: &str) -> bool {
        let lc = family.to_lowercase();
        self.faces.iter().any(|f| f.family_lc == lc)
    }

    /// Face of `family` closest to `weight`; ties prefer the heavier face.
    pub fn resolve(&self, family: &str, weight: u16) -> Option<FontKey> {
        let lc = family.to_lowercase();
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.family_lc == lc)
            .min_by_key(|(_, f)| (f.weight.abs_diff(weight), std::cmp::Reverse(f.weight)))
            .map(|(i, _)| FontKey(i))
    }

    /// Font data for drawing glyphs of `key`.
    pub(crate) fn font_data(&self, key: FontKey) -> Option<&vello_cpu::peniko::FontData> {
        self.faces.get(key.0).map(|f| &f.data)
    }

    /// Width of `text` on a single line. Unknown families use [`FALLBACK_ADVANCE_EM`].
    pub fn measure(
        &mut self,
        family: &str,
        weight: u16,
        text: &str,
        size: f64,
        letter_spacing: f64,
    ) -> f64 {
        match self.resolve(family, weight) {
            Some(key) => match self.shape_line(key, text, size, letter_spacing) {
                Ok(line) => line.width,
                Err(_) => fallback_width(text, size, letter_spacing),
            },
            None => fallback_width(text, size, letter_spacing),
        }
    }

    /// Shape `text` as one unbroken line with face `key`.
    pub fn shape_line(
        &mut self,
        key: FontKey,
        text: &str,
        size: f64,
        letter_spacing: f64,
    ) -> PosterResult<ShapedLine> {
        if !size.is_finite() || size <= 0.0 {
            return Err(PosterError::validation("font size must be finite and > 0"));
        }
        let face = self
            .faces
            .get(key.0)
            .ok_or_else(|| PosterError::asset("unknown font key"))?;
        if text.is_empty() {
            return Ok(ShapedLine::default());
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(face.parley_family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::new(f32::from(face.weight)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size as f32));
        builder.push_default(parley::style::StyleProperty::LetterSpacing(
            letter_spacing as f32,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(Color::BLACK));

        let mut layout: parley::Layout<Color> = builder.build(text);
        layout.break_all_lines(None);

        let mut glyphs = Vec::new();
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                glyphs.extend(run.positioned_glyphs().map(|g| PlacedGlyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                }));
            }
        }

        Ok(ShapedLine {
            width: f64::from(layout.width()),
            glyphs,
        })
    }
}

pub(crate) fn fallback_width(text: &str, size: f64, letter_spacing: f64) -> f64 {
    let n = text.chars().count() as f64;
    n * (size * FALLBACK_ADVANCE_EM + letter_spacing)
}
