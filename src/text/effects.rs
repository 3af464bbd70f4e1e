use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::assets::color::Color;
use crate::foundation::core::Rect;
use crate::geometry::coords::TextAlign;

/// Outline drawn beneath the text fill.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextStroke {
    pub enabled: bool,
    pub width: f64,
    pub color: Color,
}

impl Default for TextStroke {
    fn default() -> Self {
        Self {
            enabled: false,
            width: 2.0,
            color: Color::BLACK,
        }
    }
}

/// Rounded box drawn behind the text block.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextBackground {
    pub enabled: bool,
    pub color: Color,
    /// Multiplies the color's alpha.
    pub opacity: f64,
    pub padding: f64,
    pub radius: f64,
}

impl Default for TextBackground {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Color::BLACK,
            opacity: 0.5,
            padding: 8.0,
            radius: 4.0,
        }
    }
}

/// A wrapped line with its measured width and pen origin.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    /// Left edge of the line.
    pub x: f64,
    /// Top of the line box.
    pub y: f64,
    pub width: f64,
}

/// Draw passes for one text block, in paint order.
#[derive(Clone, Debug, PartialEq)]
pub enum TextPass {
    Background { rect: Rect, radius: f64, color: Color },
    Stroke { width: f64, color: Color },
    Fill { color: Color },
}

/// Position each line against an alignment anchor.
///
/// `anchor_x` is the left edge, center or right edge depending on `align`.
pub fn place_lines(
    lines: &[(String, f64)],
    align: TextAlign,
    anchor_x: f64,
    top: f64,
    line_height: f64,
) -> Vec<PlacedLine> {
    lines
        .iter()
        .enumerate()
        .map(|(i, (text, width))| PlacedLine {
            text: text.clone(),
            x: aligned_left(align, anchor_x, *width),
            y: top + i as f64 * line_height,
            width: *width,
        })
        .collect()
}

/// Anchor x for a frame given the block alignment.
pub fn anchor_in_frame(align: TextAlign, frame_x: f64, frame_w: f64) -> f64 {
    match align {
        TextAlign::Left => frame_x,
        TextAlign::Center => frame_x + frame_w / 2.0,
        TextAlign::Right => frame_x + frame_w,
    }
}

fn aligned_left(align: TextAlign, anchor_x: f64, width: f64) -> f64 {
    match align {
        TextAlign::Left => anchor_x,
        TextAlign::Center => anchor_x - width / 2.0,
        TextAlign::Right => anchor_x - width,
    }
}

/// Background box for a `text_w` x `text_h` block anchored at (`x`, `y`), grown by `padding`.
///
/// The horizontal anchor follows `align` so the box stays under the text.
pub fn background_rect(
    align: TextAlign,
    x: f64,
    y: f64,
    text_w: f64,
    text_h: f64,
    padding: f64,
) -> Rect {
    let left = aligned_left(align, x, text_w) - padding;
    Rect::new(left, y - padding, left + text_w + 2.0 * padding, y + text_h + padding)
}

/// Passes to draw: background (if enabled), stroke (if enabled), then fill.
pub fn text_passes(
    fill: Color,
    stroke: &TextStroke,
    background: &TextBackground,
    background_box: Rect,
) -> SmallVec<[TextPass; 3]> {
    let mut passes = SmallVec::new();
    if background.enabled {
        passes.push(TextPass::Background {
            rect: background_box,
            radius: background.radius,
            color: background.color.with_opacity(background.opacity),
        });
    }
    if stroke.enabled && stroke.width > 0.0 {
        passes.push(TextPass::Stroke {
            width: stroke.width,
            color: stroke.color,
        });
    }
    passes.push(TextPass::Fill { color: fill });
    passes
}

#[cfg(test)]
#[path = "../../tests/unit/text/effects.rs"]
mod tests;
