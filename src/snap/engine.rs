use serde::{Deserialize, Serialize};

use crate::foundation::core::Canvas;
use crate::geometry::coords::Frame;
use crate::layers::model::{Layer, LayerId};

/// Distance in canvas px within which a dragged edge snaps.
pub const DEFAULT_SNAP_THRESHOLD: f64 = 10.0;

/// Guide, grid and snap preferences.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapSettings {
    pub enabled: bool,
    pub threshold: f64,
    pub show_guides: bool,
    /// Add canvas thirds to the candidates.
    pub thirds: bool,
    pub grid_enabled: bool,
    /// Grid spacing in canvas px.
    pub grid_size: f64,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: DEFAULT_SNAP_THRESHOLD,
            show_guides: true,
            thirds: true,
            grid_enabled: false,
            grid_size: 50.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

/// Where a candidate line comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapSource {
    CanvasEdge,
    CanvasCenter,
    CanvasThird,
    Grid,
    Layer(LayerId),
}

/// A line a dragged edge or center may snap to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapCandidate {
    pub axis: Axis,
    /// Canvas px along `axis`.
    pub value: f64,
    pub source: SnapSource,
}

/// A guide line to draw after a snap.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Guide {
    pub axis: Axis,
    pub position: f64,
}

/// Snapped position of a dragged rect.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapResult {
    pub x: f64,
    pub y: f64,
    /// At most one guide per axis.
    pub guides: Vec<Guide>,
}

/// Candidate lines for dragging `moving` over `layers`.
///
/// Canvas edges and center come first, then thirds and grid lines when enabled, then the left,
/// center and right (top, center, bottom) of every other visible, unlocked layer.
pub fn compute_snap_candidates(
    moving: Option<LayerId>,
    layers: &[Layer],
    canvas: Canvas,
    settings: &SnapSettings,
) -> Vec<SnapCandidate> {
    let mut out = Vec::new();
    for (axis, extent) in [
        (Axis::X, f64::from(canvas.width)),
        (Axis::Y, f64::from(canvas.height)),
    ] {
        let mut push = |value: f64, source: SnapSource| out.push(SnapCandidate { axis, value, source });
        push(0.0, SnapSource::CanvasEdge);
        push(extent, SnapSource::CanvasEdge);
        push(extent / 2.0, SnapSource::CanvasCenter);
        if settings.thirds {
            push(extent / 3.0, SnapSource::CanvasThird);
            push(extent * 2.0 / 3.0, SnapSource::CanvasThird);
        }
        if settings.grid_enabled && settings.grid_size.is_finite() && settings.grid_size >= 1.0 {
            let mut v = settings.grid_size;
            while v < extent {
                push(v, SnapSource::Grid);
                v += settings.grid_size;
            }
        }
    }

    for layer in layers {
        if Some(layer.id) == moving || !layer.visible || layer.locked {
            continue;
        }
        let Some(f) = layer.frame() else { continue };
        let src = SnapSource::Layer(layer.id);
        for (axis, lo, len) in [(Axis::X, f.x, f.width), (Axis::Y, f.y, f.height)] {
            for value in [lo, lo + len / 2.0, lo + len] {
                out.push(SnapCandidate { axis, value, source: src });
            }
        }
    }
    out
}

/// Nearest candidate on `axis` to any of `probes`, if within `threshold`.
///
/// Returns the adjusted origin and the guide position. Ties keep the earlier candidate.
fn nearest(
    origin: f64,
    probes: &[f64],
    axis: Axis,
    candidates: &[SnapCandidate],
    threshold: f64,
) -> Option<(f64, Guide)> {
    let mut best: Option<(f64, f64, f64)> = None;
    for c in candidates.iter().filter(|c| c.axis == axis) {
        for &offset in probes {
            let d = (c.value - (origin + offset)).abs();
            if best.is_none_or(|(bd, _, _)| d < bd) {
                best = Some((d, c.value, offset));
            }
        }
    }
    let (d, value, offset) = best?;
    (d <= threshold).then_some((
        value - offset,
        Guide {
            axis,
            position: value,
        },
    ))
}

/// Snap a `w`×`h` rect at (`x`, `y`) against `candidates`.
///
/// Each axis tests the near edge, center and far edge and resolves independently.
pub fn find_snap_points(
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    candidates: &[SnapCandidate],
    threshold: f64,
) -> SnapResult {
    let mut result = SnapResult {
        x,
        y,
        guides: Vec::new(),
    };
    if let Some((nx, g)) = nearest(x, &[0.0, w / 2.0, w], Axis::X, candidates, threshold) {
        result.x = nx;
        result.guides.push(g);
    }
    if let Some((ny, g)) = nearest(y, &[0.0, h / 2.0, h], Axis::Y, candidates, threshold) {
        result.y = ny;
        result.guides.push(g);
    }
    result
}

/// Snap a single moving edge, used while resizing.
pub fn snap_edge(
    value: f64,
    axis: Axis,
    candidates: &[SnapCandidate],
    threshold: f64,
) -> Option<(f64, Guide)> {
    nearest(value, &[0.0], axis, candidates, threshold)
}

/// Snap a dragged frame of `moving` against the canvas and its siblings.
///
/// Disabled settings return the frame unchanged with no guides.
pub fn snap_frame(
    frame: &Frame,
    moving: Option<LayerId>,
    layers: &[Layer],
    canvas: Canvas,
    settings: &SnapSettings,
) -> SnapResult {
    if !settings.enabled {
        return SnapResult {
            x: frame.x,
            y: frame.y,
            guides: Vec::new(),
        };
    }
    let candidates = compute_snap_candidates(moving, layers, canvas, settings);
    find_snap_points(
        frame.x,
        frame.y,
        frame.width,
        frame.height,
        &candidates,
        settings.threshold,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/snap/engine.rs"]
mod tests;
