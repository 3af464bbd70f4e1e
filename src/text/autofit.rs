use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::text::measure::TextMeasure;
use crate::text::wrap::{widest_line, wrap};

/// Line advance as a multiple of font size used by the fit height rule.
pub const LINE_HEIGHT_FACTOR: f64 = 1.4;

const SHRINK_STEP: f64 = 1.0;
const WIDTH_STEP: f64 = 10.0;
const REFLOW_FLOOR: f64 = 0.3;
const HYBRID_FLOOR: f64 = 0.5;
const MAX_FIT_STEPS: usize = 512;

/// How text is adjusted to fit its box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitStrategy {
    /// Decrease font size.
    #[default]
    Shrink,
    /// Keep font size, narrow the wrap width.
    Reflow,
    /// Narrow first, then shrink.
    Hybrid,
}

/// Per-layer auto-fit configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoFitSettings {
    /// Whether auto-fit runs at all.
    pub enabled: bool,
    /// Strategy.
    pub strategy: FitStrategy,
    /// Lower bound for the fitted size.
    pub min_font_size: f64,
    /// Upper bound for the fitted size.
    pub max_font_size: f64,
}

impl Default for AutoFitSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            strategy: FitStrategy::Shrink,
            min_font_size: 12.0,
            max_font_size: 120.0,
        }
    }
}

/// Box and font bounds for one fit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitRequest {
    /// Available width.
    pub max_width: f64,
    /// Available height.
    pub max_height: f64,
    /// Preferred size.
    pub base_size: f64,
    /// Smallest allowed size.
    pub min_size: f64,
    /// Largest allowed size.
    pub max_size: f64,
    /// Strategy.
    pub strategy: FitStrategy,
}

/// Outcome of [`auto_fit`].
#[derive(Clone, Debug, PartialEq)]
pub struct FitResult {
    /// Chosen size, never below the request's minimum.
    pub font_size: f64,
    /// Wrapped lines at that size.
    pub lines: Vec<String>,
    /// Width the lines were wrapped to.
    pub wrap_width: f64,
}

/// Height of `line_count` lines at `font_size`.
pub fn block_height(line_count: usize, font_size: f64) -> f64 {
    line_count as f64 * font_size * LINE_HEIGHT_FACTOR
}

/// Choose a font size and wrap for `text` so the block fits `req`.
///
/// - `Shrink` steps the size down by 1px from the base until the block fits or the minimum is hit.
/// - `Reflow` keeps the size and narrows the wrap width in 10px steps down to 30%; on failure the
///   full-width wrap is returned.
/// - `Hybrid` narrows down to 50%, then shrinks at that floor width.
pub fn auto_fit(text: &str, req: &FitRequest, measurer: &mut dyn TextMeasure) -> FitResult {
    let min = req.min_size.max(1.0);
    let start = req.base_size.min(req.max_size).max(min);

    let result = match req.strategy {
        FitStrategy::Shrink => shrink(text, req.max_width, req.max_height, start, min, measurer),
        FitStrategy::Reflow => {
            narrow(text, req, start, REFLOW_FLOOR, measurer).unwrap_or_else(|| FitResult {
                font_size: start,
                lines: wrap(text, req.max_width, start, measurer),
                wrap_width: req.max_width,
            })
        }
        FitStrategy::Hybrid => narrow(text, req, start, HYBRID_FLOOR, measurer).unwrap_or_else(|| {
            let floor = req.max_width * HYBRID_FLOOR;
            shrink(text, floor, req.max_height, start, min, measurer)
        }),
    };

    debug!(
        strategy = ?req.strategy,
        font_size = result.font_size,
        lines = result.lines.len(),
        "auto-fit"
    );
    result
}

fn fits(
    lines: &[String],
    size: f64,
    width: f64,
    height: f64,
    measurer: &mut dyn TextMeasure,
) -> bool {
    block_height(lines.len(), size) <= height && widest_line(lines, size, measurer) <= width
}

fn shrink(
    text: &str,
    width: f64,
    height: f64,
    start: f64,
    min: f64,
    measurer: &mut dyn TextMeasure,
) -> FitResult {
    let (step, count) = stride(start - min, SHRINK_STEP, f64::ceil);
    let mut size = start;
    for _ in 0..count {
        let lines = wrap(text, width, size, measurer);
        if fits(&lines, size, width, height, measurer) {
            return FitResult {
                font_size: size,
                lines,
                wrap_width: width,
            };
        }
        size = (size - step).max(min);
    }
    FitResult {
        font_size: size,
        lines: wrap(text, width, size, measurer),
        wrap_width: width,
    }
}

fn narrow(
    text: &str,
    req: &FitRequest,
    size: f64,
    floor_frac: f64,
    measurer: &mut dyn TextMeasure,
) -> Option<FitResult> {
    let floor = req.max_width * floor_frac;
    if req.max_width.is_nan() || req.max_width < floor {
        return None;
    }
    let (step, count) = stride(req.max_width - floor, WIDTH_STEP, f64::floor);
    (0..=count).find_map(|i| {
        let width = req.max_width - step * i as f64;
        let lines = wrap(text, width, size, measurer);
        fits(&lines, size, req.max_width, req.max_height, measurer).then_some(FitResult {
            font_size: size,
            lines,
            wrap_width: width,
        })
    })
}

/// Step length and count covering `span`. Spans needing more than [`MAX_FIT_STEPS`] steps are
/// divided evenly instead.
fn stride(span: f64, step: f64, round: fn(f64) -> f64) -> (f64, usize) {
    if !span.is_finite() || span <= 0.0 {
        return (step, 0);
    }
    let count = round(span / step);
    if count <= MAX_FIT_STEPS as f64 {
        (step, count as usize)
    } else {
        (span / MAX_FIT_STEPS as f64, MAX_FIT_STEPS)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/autofit.rs"]
mod tests;
