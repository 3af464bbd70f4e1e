use serde::{Deserialize, Serialize};

use crate::foundation::core::{Canvas, Point, Rect, Size, Vec2};

/// Smallest width/height a layer frame may shrink to.
pub const MIN_FRAME_EDGE: f64 = 20.0;

/// Canonical layer geometry: top-left plus size, in working-canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Frame {
    /// Frame from top-left and size.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Frame with the given center and size.
    pub fn from_center(center: Point, size: Size) -> Self {
        Self::new(
            center.x - size.width / 2.0,
            center.y - size.height / 2.0,
            size.width,
            size.height,
        )
    }

    /// Center point.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Size.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// As a kurbo rect.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Shifted by `delta`.
    pub fn translate(&self, delta: Vec2) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }

    /// Whether every component is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Width and height raised to at least `min`, keeping the top-left fixed.
    pub fn clamp_min(&self, min: f64) -> Self {
        Self::new(self.x, self.y, self.width.max(min), self.height.max(min))
    }

    /// Replace non-finite components with `prev`'s and enforce [`MIN_FRAME_EDGE`].
    pub fn sanitize(&self, prev: &Frame) -> Self {
        let pick = |v: f64, p: f64| if v.is_finite() { v } else { p };
        Self::new(
            pick(self.x, prev.x),
            pick(self.y, prev.y),
            pick(self.width, prev.width),
            pick(self.height, prev.height),
        )
        .clamp_min(MIN_FRAME_EDGE)
    }

    /// Inclusive point containment.
    pub fn contains(&self, p: Point) -> bool {
        point_in_rect(p, self.rect())
    }
}

/// Frame expressed as center and size fractions of the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedFrame {
    /// Center x in `0..=1`.
    pub cx: f64,
    /// Center y in `0..=1`.
    pub cy: f64,
    /// Width fraction.
    pub w: f64,
    /// Height fraction.
    pub h: f64,
}

impl NormalizedFrame {
    /// Normalize `frame` against `canvas`.
    pub fn from_frame(frame: &Frame, canvas: Canvas) -> Self {
        let cw = f64::from(canvas.width);
        let ch = f64::from(canvas.height);
        let c = frame.center();
        Self {
            cx: c.x / cw,
            cy: c.y / ch,
            w: frame.width / cw,
            h: frame.height / ch,
        }
    }

    /// Pixel frame on `canvas`.
    pub fn to_frame(&self, canvas: Canvas) -> Frame {
        let cw = f64::from(canvas.width);
        let ch = f64::from(canvas.height);
        Frame::from_center(
            Point::new(self.cx * cw, self.cy * ch),
            Size::new(self.w * cw, self.h * ch),
        )
    }
}

/// Horizontal alignment of a text block within its frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Left edge anchored.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Right edge anchored.
    Right,
}

/// Field-driven text placement: an anchor point plus maximum width, all as canvas fractions.
///
/// `x` is the anchor for the alignment (left edge, center or right edge), `y` the top edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPosition {
    /// Anchor x in `0..=1`.
    pub x: f64,
    /// Top y in `0..=1`.
    pub y: f64,
    /// Maximum width as a fraction of canvas width.
    pub max_width: f64,
}

impl FieldPosition {
    /// Pixel frame of `height` px for this anchor on `canvas`.
    pub fn to_frame(&self, canvas: Canvas, align: TextAlign, height: f64) -> Frame {
        let cw = f64::from(canvas.width);
        let ch = f64::from(canvas.height);
        let width = self.max_width * cw;
        let anchor = self.x * cw;
        let left = match align {
            TextAlign::Left => anchor,
            TextAlign::Center => anchor - width / 2.0,
            TextAlign::Right => anchor - width,
        };
        Frame::new(left, self.y * ch, width, height)
    }

    /// Anchor form of `frame`; the frame height is not represented.
    pub fn from_frame(frame: &Frame, canvas: Canvas, align: TextAlign) -> Self {
        let cw = f64::from(canvas.width);
        let ch = f64::from(canvas.height);
        let anchor = match align {
            TextAlign::Left => frame.x,
            TextAlign::Center => frame.x + frame.width / 2.0,
            TextAlign::Right => frame.right(),
        };
        Self {
            x: anchor / cw,
            y: frame.y / ch,
            max_width: frame.width / cw,
        }
    }
}

/// Slot placement as an offset and scale relative to a base frame's center.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CenterOffset {
    /// Horizontal center offset in px.
    pub offset_x: f64,
    /// Vertical center offset in px.
    pub offset_y: f64,
    /// Uniform scale of the base size.
    pub scale: f64,
}

impl Default for CenterOffset {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
        }
    }
}

impl CenterOffset {
    /// Pixel frame relative to `base`.
    pub fn to_frame(&self, base: &Frame) -> Frame {
        let c = base.center() + Vec2::new(self.offset_x, self.offset_y);
        Frame::from_center(c, base.size() * self.scale)
    }

    /// Offset form of `frame` relative to `base`. Scale is taken from the width ratio.
    pub fn from_frame(frame: &Frame, base: &Frame) -> Self {
        let d = frame.center() - base.center();
        let scale = if base.width > 0.0 {
            frame.width / base.width
        } else {
            1.0
        };
        Self {
            offset_x: d.x,
            offset_y: d.y,
            scale,
        }
    }
}

/// Map an element-space pointer position into logical canvas coordinates.
///
/// `element` is the on-screen bounding rect of the canvas element, which may be scaled by layout.
/// Returns `None` for a degenerate element rect.
pub fn screen_to_canvas(p: Point, element: Rect, canvas: Canvas) -> Option<Point> {
    if !(element.width() > 0.0 && element.height() > 0.0) {
        return None;
    }
    let sx = f64::from(canvas.width) / element.width();
    let sy = f64::from(canvas.height) / element.height();
    Some(Point::new((p.x - element.x0) * sx, (p.y - element.y0) * sy))
}

/// Inverse of [`screen_to_canvas`].
pub fn canvas_to_screen(p: Point, element: Rect, canvas: Canvas) -> Point {
    let sx = element.width() / f64::from(canvas.width);
    let sy = element.height() / f64::from(canvas.height);
    Point::new(element.x0 + p.x * sx, element.y0 + p.y * sy)
}

/// Canvas point as `0..=1` fractions.
pub fn canvas_to_normalized(p: Point, canvas: Canvas) -> Point {
    Point::new(p.x / f64::from(canvas.width), p.y / f64::from(canvas.height))
}

/// Fractions back to canvas pixels.
pub fn normalized_to_canvas(p: Point, canvas: Canvas) -> Point {
    Point::new(p.x * f64::from(canvas.width), p.y * f64::from(canvas.height))
}

/// Inclusive-bounds hit test.
pub fn point_in_rect(p: Point, r: Rect) -> bool {
    p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1
}

/// Mapping from the working canvas onto a differently sized target surface.
///
/// Positions and sizes scale per axis; scalar lengths (font size, stroke width, blur, radii)
/// scale by the smaller factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceMapping {
    /// Horizontal factor.
    pub sx: f64,
    /// Vertical factor.
    pub sy: f64,
}

impl SurfaceMapping {
    /// No scaling.
    pub const IDENTITY: Self = Self { sx: 1.0, sy: 1.0 };

    /// Mapping from `working` to `target`.
    pub fn between(working: Canvas, target: Canvas) -> Self {
        Self {
            sx: f64::from(target.width) / f64::from(working.width),
            sy: f64::from(target.height) / f64::from(working.height),
        }
    }

    /// Factor for scalar lengths.
    pub fn uniform(&self) -> f64 {
        self.sx.min(self.sy)
    }

    /// Map a point.
    pub fn point(&self, p: Point) -> Point {
        Point::new(p.x * self.sx, p.y * self.sy)
    }

    /// Map a frame.
    pub fn frame(&self, f: &Frame) -> Frame {
        Frame::new(f.x * self.sx, f.y * self.sy, f.width * self.sx, f.height * self.sy)
    }

    /// Map a scalar length.
    pub fn scalar(&self, v: f64) -> f64 {
        v * self.uniform()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/coords.rs"]
mod tests;
