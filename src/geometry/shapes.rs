use kurbo::Shape;
use serde::{Deserialize, Serialize};

use crate::foundation::core::{BezPath, Point, Rect};

const PATH_TOLERANCE: f64 = 0.1;

/// Clip shape applied to an image slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MaskShape {
    /// No clipping beyond the slot frame.
    #[default]
    None,
    /// Circle of radius `min(w, h) / 2`.
    Circle,
    /// Ellipse inscribed in the frame.
    Ellipse,
    /// Rounded rectangle with an explicit corner radius.
    RoundRect,
    /// Rounded rectangle with radius `min(w, h) / 2`.
    Capsule,
}

/// Rounded rectangle with four circular corner arcs.
///
/// `radius` is clamped to half the shorter side; zero yields a plain rectangle.
pub fn rounded_rect_path(rect: Rect, radius: f64) -> BezPath {
    let r = clamp_radius(rect, radius);
    if r <= 0.0 {
        return rect.to_path(PATH_TOLERANCE);
    }
    kurbo::RoundedRect::from_rect(rect, r).to_path(PATH_TOLERANCE)
}

/// Mask path for a `w` x `h` box centered at the origin.
///
/// Returns `None` for [`MaskShape::None`].
pub fn mask_path(shape: MaskShape, w: f64, h: f64, radius: f64) -> Option<BezPath> {
    let rect = Rect::new(-w / 2.0, -h / 2.0, w / 2.0, h / 2.0);
    match shape {
        MaskShape::None => None,
        MaskShape::Circle => {
            let r = w.min(h) / 2.0;
            Some(kurbo::Circle::new(Point::ORIGIN, r.max(0.0)).to_path(PATH_TOLERANCE))
        }
        MaskShape::Ellipse => Some(kurbo::Ellipse::from_rect(rect).to_path(PATH_TOLERANCE)),
        MaskShape::RoundRect => Some(rounded_rect_path(rect, radius)),
        MaskShape::Capsule => Some(rounded_rect_path(rect, w.min(h) / 2.0)),
    }
}

fn clamp_radius(rect: Rect, radius: f64) -> f64 {
    if !radius.is_finite() {
        return 0.0;
    }
    radius.clamp(0.0, rect.width().min(rect.height()).abs() / 2.0)
}
