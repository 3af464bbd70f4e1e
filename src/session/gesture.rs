use serde::{Deserialize, Serialize};

use crate::foundation::core::{Affine, Point, Vec2};
use crate::geometry::coords::{Frame, MIN_FRAME_EDGE};
use crate::layers::model::LayerId;

/// Rotation increment used when angle snapping is requested.
pub const ROTATION_SNAP_DEG: f64 = 15.0;

/// Resize handle on a layer's frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResizeHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
}

impl ResizeHandle {
    /// Which edges the handle moves, as (-1 | 0 | 1) per axis: -1 moves the near edge, 1 the far.
    pub(crate) fn edges(self) -> (i8, i8) {
        match self {
            Self::TopLeft => (-1, -1),
            Self::Top => (0, -1),
            Self::TopRight => (1, -1),
            Self::Right => (1, 0),
            Self::BottomRight => (1, 1),
            Self::Bottom => (0, 1),
            Self::BottomLeft => (-1, 1),
            Self::Left => (-1, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureKind {
    Drag,
    Resize(ResizeHandle),
    Rotate,
}

/// The one pointer interaction in progress.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveGesture {
    pub kind: GestureKind,
    pub layer: LayerId,
    pub start_pointer: Point,
    pub start_frame: Frame,
    pub start_rotation: f64,
}

/// Result of moving the pointer during a gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureUpdate {
    Frame(Frame),
    Rotation(f64),
}

/// Modal drag/resize/rotate state. At most one gesture is active; ending always clears it.
#[derive(Clone, Debug, Default)]
pub struct GestureState {
    active: Option<ActiveGesture>,
}

impl GestureState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a gesture. Refused while another one is active.
    pub fn begin(&mut self, gesture: ActiveGesture) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.active = Some(gesture);
        true
    }

    pub fn active(&self) -> Option<&ActiveGesture> {
        self.active.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.active, Some(ActiveGesture { kind: GestureKind::Drag, .. }))
    }

    pub fn is_resizing(&self) -> bool {
        matches!(self.active, Some(ActiveGesture { kind: GestureKind::Resize(_), .. }))
    }

    pub fn is_rotating(&self) -> bool {
        matches!(self.active, Some(ActiveGesture { kind: GestureKind::Rotate, .. }))
    }

    /// Geometry for the pointer at `pointer`, or `None` when idle.
    pub fn update(&self, pointer: Point, snap_angle: bool) -> Option<GestureUpdate> {
        let g = self.active.as_ref()?;
        Some(match g.kind {
            GestureKind::Drag => GestureUpdate::Frame(drag_frame(&g.start_frame, pointer - g.start_pointer)),
            GestureKind::Resize(handle) => GestureUpdate::Frame(resize_frame(
                &g.start_frame,
                g.start_rotation,
                handle,
                pointer - g.start_pointer,
            )),
            GestureKind::Rotate => GestureUpdate::Rotation(rotate_angle(
                g.start_frame.center(),
                g.start_pointer,
                pointer,
                g.start_rotation,
                snap_angle,
            )),
        })
    }

    /// Pointer up or leave. Always clears.
    pub fn end(&mut self) -> Option<ActiveGesture> {
        self.active.take()
    }
}

pub fn drag_frame(start: &Frame, delta: Vec2) -> Frame {
    start.translate(delta)
}

/// Resize from `handle` by a canvas-space pointer `delta`.
///
/// The delta is taken into the layer's rotated frame and the edge opposite the handle stays put
/// on the canvas. Edges never shrink below [`MIN_FRAME_EDGE`].
pub fn resize_frame(start: &Frame, rotation_deg: f64, handle: ResizeHandle, delta: Vec2) -> Frame {
    let rot = if rotation_deg.is_finite() { rotation_deg.to_radians() } else { 0.0 };
    let local = Affine::rotate(-rot) * delta.to_point();
    let (ex, ey) = handle.edges();

    let resize_axis = |pos: f64, len: f64, edge: i8, d: f64| -> (f64, f64) {
        match edge {
            1 => (pos, (len + d).max(MIN_FRAME_EDGE)),
            -1 => {
                let new_len = (len - d).max(MIN_FRAME_EDGE);
                (pos + len - new_len, new_len)
            }
            _ => (pos, len),
        }
    };
    let (x, width) = resize_axis(start.x, start.width, ex, local.x);
    let (y, height) = resize_axis(start.y, start.height, ey, local.y);
    let resized = Frame::new(x, y, width, height);
    if rot == 0.0 {
        return resized;
    }

    // Keep the anchor (the point opposite the handle) fixed in canvas space.
    let anchor = |f: &Frame| {
        let ax = match ex {
            1 => f.x,
            -1 => f.right(),
            _ => f.x + f.width / 2.0,
        };
        let ay = match ey {
            1 => f.y,
            -1 => f.bottom(),
            _ => f.y + f.height / 2.0,
        };
        Affine::rotate_about(rot, f.center()) * Point::new(ax, ay)
    };
    resized.translate(anchor(start) - anchor(&resized))
}

/// Rotation in degrees after turning the pointer about `center`, normalized to `0..360`.
pub fn rotate_angle(center: Point, start: Point, pointer: Point, start_rotation: f64, snap: bool) -> f64 {
    let a0 = (start - center).atan2();
    let a1 = (pointer - center).atan2();
    let mut deg = start_rotation + (a1 - a0).to_degrees();
    if snap {
        deg = (deg / ROTATION_SNAP_DEG).round() * ROTATION_SNAP_DEG;
    }
    deg.rem_euclid(360.0)
}

#[cfg(test)]
#[path = "../../tests/unit/session/gesture.rs"]
mod tests;
