/// Placement of a scaled source inside a destination box, relative to the box origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitRect {
    /// Scaled source width.
    pub draw_w: f64,
    /// Scaled source height.
    pub draw_h: f64,
    /// Left edge; negative when the source overflows horizontally.
    pub draw_x: f64,
    /// Top edge; negative when the source overflows vertically.
    pub draw_y: f64,
}

impl FitRect {
    /// Scale factor applied to the source.
    pub fn scale_from(&self, src_w: f64) -> f64 {
        if src_w > 0.0 { self.draw_w / src_w } else { 0.0 }
    }
}

/// Scale `src` so it fully covers `dst`, preserving aspect and centering the overflow axis.
///
/// Non-positive or non-finite inputs return the destination box unchanged.
pub fn cover_fit(src_w: f64, src_h: f64, dst_w: f64, dst_h: f64) -> FitRect {
    fit_with(src_w, src_h, dst_w, dst_h, f64::max)
}

/// Scale `src` so it fits inside `dst` (letterbox), centered.
pub fn contain_fit(src_w: f64, src_h: f64, dst_w: f64, dst_h: f64) -> FitRect {
    fit_with(src_w, src_h, dst_w, dst_h, f64::min)
}

fn fit_with(src_w: f64, src_h: f64, dst_w: f64, dst_h: f64, pick: fn(f64, f64) -> f64) -> FitRect {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if !(valid(src_w) && valid(src_h) && valid(dst_w) && valid(dst_h)) {
        return FitRect {
            draw_w: dst_w.max(0.0),
            draw_h: dst_h.max(0.0),
            draw_x: 0.0,
            draw_y: 0.0,
        };
    }

    let scale = pick(dst_w / src_w, dst_h / src_h);
    let draw_w = src_w * scale;
    let draw_h = src_h * scale;
    FitRect {
        draw_w,
        draw_h,
        draw_x: (dst_w - draw_w) / 2.0,
        draw_y: (dst_h - draw_h) / 2.0,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/fit.rs"]
mod tests;
