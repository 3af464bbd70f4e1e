use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::core::Canvas;
use crate::foundation::error::{PosterError, PosterResult};

/// A named export size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportPreset {
    pub key: &'static str,
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
}

impl ExportPreset {
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}

/// Built-in presets.
pub const PRESETS: &[ExportPreset] = &[
    ExportPreset { key: "ig-post", label: "Instagram post", width: 1080, height: 1350 },
    ExportPreset { key: "ig-square", label: "Instagram square", width: 1080, height: 1080 },
    ExportPreset { key: "ig-story", label: "Instagram story", width: 1080, height: 1920 },
    ExportPreset { key: "fb-post", label: "Facebook post", width: 1200, height: 630 },
    ExportPreset { key: "x-post", label: "X post", width: 1600, height: 900 },
    ExportPreset { key: "a4-300dpi", label: "A4 at 300 dpi", width: 2480, height: 3508 },
];

pub fn preset(key: &str) -> Option<&'static ExportPreset> {
    PRESETS.iter().find(|p| p.key == key)
}

/// Output size: a preset or a caller-chosen size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportSize {
    Preset(&'static ExportPreset),
    Custom(Canvas),
}

impl ExportSize {
    pub fn canvas(&self) -> Canvas {
        match self {
            Self::Preset(p) => p.canvas(),
            Self::Custom(c) => *c,
        }
    }

    /// Name used in file names: the preset key, or `custom`.
    pub fn name(&self) -> &str {
        match self {
            Self::Preset(p) => p.key,
            Self::Custom(_) => "custom",
        }
    }

    /// Parse a preset key or `WxH`.
    pub fn parse(s: &str) -> PosterResult<Self> {
        if let Some(p) = preset(s) {
            return Ok(Self::Preset(p));
        }
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| PosterError::validation(format!("unknown preset or size \"{s}\"")))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|_| PosterError::validation(format!("invalid size \"{s}\"")))
        };
        Ok(Self::Custom(Canvas::new(parse(w)?, parse(h)?)?))
    }
}

/// Raster encoding of an export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = PosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            other => Err(PosterError::validation(format!("unknown export format \"{other}\""))),
        }
    }
}

/// `{category}-{preset}-{width}x{height}.{ext}`
pub fn export_filename(category: &str, size: &ExportSize, format: ExportFormat) -> String {
    let c = size.canvas();
    format!(
        "{category}-{}-{}x{}.{}",
        size.name(),
        c.width,
        c.height,
        format.extension()
    )
}

#[cfg(test)]
#[path = "../../tests/unit/export/preset.rs"]
mod tests;
