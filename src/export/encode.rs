use std::io::Cursor;
use std::path::Path;

use anyhow::Context;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::export::preset::{ExportFormat, ExportSize};
use crate::foundation::error::{PosterError, PosterResult};
use crate::render::backend::FrameRGBA;

pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Output size, encoding and JPEG quality of one export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSettings {
    pub size: ExportSize,
    pub format: ExportFormat,
    /// JPEG quality in `1..=100`; ignored by the lossless formats.
    pub quality: u8,
}

impl ExportSettings {
    pub fn new(size: ExportSize, format: ExportFormat) -> Self {
        Self {
            size,
            format,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn validate(&self) -> PosterResult<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(PosterError::validation(format!(
                "quality must be 1..=100, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

/// Encode a rendered frame. Output pixels are straight alpha.
pub fn encode_frame(frame: &FrameRGBA, format: ExportFormat, quality: u8) -> PosterResult<Vec<u8>> {
    let expected = frame.width as usize * frame.height as usize * 4;
    if frame.data.len() != expected {
        return Err(PosterError::validation(format!(
            "frame data is {} bytes, expected {expected}",
            frame.data.len()
        )));
    }
    let straight = frame.clone().into_straight();
    let mut buf = Vec::new();
    let (w, h) = (frame.width, frame.height);
    match format {
        ExportFormat::Png => PngEncoder::new(Cursor::new(&mut buf))
            .write_image(&straight.data, w, h, ExtendedColorType::Rgba8)
            .context("encode png")?,
        ExportFormat::Jpeg => {
            let q = quality.clamp(1, 100);
            let rgb = flatten_on_white(&straight.data);
            JpegEncoder::new_with_quality(Cursor::new(&mut buf), q)
                .write_image(&rgb, w, h, ExtendedColorType::Rgb8)
                .context("encode jpeg")?
        }
        ExportFormat::Webp => WebPEncoder::new_lossless(Cursor::new(&mut buf))
            .write_image(&straight.data, w, h, ExtendedColorType::Rgba8)
            .context("encode webp")?,
    }
    Ok(buf)
}

/// Composite straight RGBA over opaque white, dropping alpha.
pub(crate) fn flatten_on_white(rgba: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let a = u16::from(px[3]);
        for &c in &px[..3] {
            let v = (u16::from(c) * a + 255 * (255 - a) + 127) / 255;
            out.push(v as u8);
        }
    }
    out
}

/// Write encoded bytes, creating parent directories.
pub fn write_export(path: &Path, bytes: &[u8]) -> PosterResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write export '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/export/encode.rs"]
mod tests;
