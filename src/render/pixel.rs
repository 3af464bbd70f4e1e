//! Integer and float kernels over tightly packed premultiplied RGBA8 buffers.

use crate::foundation::error::{PosterError, PosterResult};
use crate::foundation::math::{mul_div255_u8, smoothstep};
use crate::layers::model::{BlendMode, EdgeFeather};

/// 4×5 row-major color matrix that leaves pixels unchanged.
pub const IDENTITY_MATRIX: [f32; 20] = [
    1.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

/// CSS `brightness(amount)`: scales color channels.
pub fn brightness_matrix(amount: f32) -> [f32; 20] {
    let a = amount.max(0.0);
    [
        a, 0.0, 0.0, 0.0, 0.0, //
        0.0, a, 0.0, 0.0, 0.0, //
        0.0, 0.0, a, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]
}

/// CSS `contrast(amount)`: scales color channels about mid grey.
pub fn contrast_matrix(amount: f32) -> [f32; 20] {
    let c = amount.max(0.0);
    let t = 0.5 - 0.5 * c;
    [
        c, 0.0, 0.0, 0.0, t, //
        0.0, c, 0.0, 0.0, t, //
        0.0, 0.0, c, 0.0, t, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]
}

/// CSS `saturate(amount)` with the Rec. 709 luma weights.
pub fn saturate_matrix(amount: f32) -> [f32; 20] {
    let s = amount.max(0.0);
    [
        0.213 + 0.787 * s,
        0.715 - 0.715 * s,
        0.072 - 0.072 * s,
        0.0,
        0.0,
        0.213 - 0.213 * s,
        0.715 + 0.285 * s,
        0.072 - 0.072 * s,
        0.0,
        0.0,
        0.213 - 0.213 * s,
        0.715 - 0.715 * s,
        0.072 + 0.928 * s,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
        0.0,
    ]
}

/// Matrix applying `first`, then `then`.
pub fn compose_color_matrix(then: [f32; 20], first: [f32; 20]) -> [f32; 20] {
    let mut out = [0.0f32; 20];
    for row in 0..4 {
        for col in 0..5 {
            let mut acc = 0.0;
            for k in 0..4 {
                acc += then[row * 5 + k] * first[k * 5 + col];
            }
            if col == 4 {
                acc += then[row * 5 + 4];
            }
            out[row * 5 + col] = acc;
        }
    }
    out
}

/// Apply `m` to straight colors, in place.
pub(crate) fn color_matrix_rgba8_premul(buf: &mut [u8], m: &[f32; 20]) {
    for px in buf.chunks_exact_mut(4) {
        if px[3] == 0 {
            continue;
        }
        let pa = f32::from(px[3]) / 255.0;
        let inv_a = 1.0 / pa;
        let r = f32::from(px[0]) / 255.0 * inv_a;
        let g = f32::from(px[1]) / 255.0 * inv_a;
        let b = f32::from(px[2]) / 255.0 * inv_a;

        let out_r = (m[0] * r + m[1] * g + m[2] * b + m[3] * pa + m[4]).clamp(0.0, 1.0);
        let out_g = (m[5] * r + m[6] * g + m[7] * b + m[8] * pa + m[9]).clamp(0.0, 1.0);
        let out_b = (m[10] * r + m[11] * g + m[12] * b + m[13] * pa + m[14]).clamp(0.0, 1.0);
        let out_a = (m[15] * r + m[16] * g + m[17] * b + m[18] * pa + m[19]).clamp(0.0, 1.0);

        px[0] = to_u8(out_r * out_a);
        px[1] = to_u8(out_g * out_a);
        px[2] = to_u8(out_b * out_a);
        px[3] = to_u8(out_a);
    }
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

pub(crate) fn gaussian_kernel_q16(radius: u32, sigma: f32) -> PosterResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(PosterError::validation("blur sigma must be finite and > 0"));
    }

    let r = i32::try_from(radius)
        .ok()
        .filter(|r| *r <= MAX_BLUR_RADIUS as i32)
        .ok_or_else(|| {
            PosterError::validation(format!("blur radius {radius} exceeds {MAX_BLUR_RADIUS}"))
        })?;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    for i in -r..=r {
        let x = f64::from(i);
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(PosterError::render("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = (((wf / sum) * 65536.0).round() as i64).clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Rounding drift goes to the center tap so the kernel sums to exactly 1.0.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

/// Largest kernel half-width; wider blurs are flattened to this radius.
pub(crate) const MAX_BLUR_RADIUS: u32 = 512;

/// Separable Gaussian blur with standard deviation `sigma` px, in place.
///
/// The kernel never reaches past the long side of the buffer or [`MAX_BLUR_RADIUS`].
pub(crate) fn blur_rgba8_premul(
    buf: &mut [u8],
    width: u32,
    height: u32,
    sigma: f32,
) -> PosterResult<()> {
    if sigma <= 0.0 || !sigma.is_finite() {
        return Ok(());
    }
    check_len(buf.len(), width, height)?;
    let max_radius = width.max(height).clamp(1, MAX_BLUR_RADIUS);
    let radius = (f64::from(sigma) * 3.0).ceil().min(f64::from(max_radius)) as u32;
    let sigma = sigma.min(radius as f32 / 3.0);
    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; buf.len()];
    horizontal_blur_q16(buf, &mut tmp, width, height, &kernel);
    vertical_blur_q16(&tmp, buf, width, height, &kernel);
    Ok(())
}

fn check_len(len: usize, width: u32, height: u32) -> PosterResult<()> {
    let expected = (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4);
    if len != expected {
        return Err(PosterError::render(format!(
            "rgba8 buffer of {len} bytes does not match {width}x{height}"
        )));
    }
    Ok(())
}

fn horizontal_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

/// Multiply every channel by the mask's alpha, in place.
pub(crate) fn mask_apply_alpha(buf: &mut [u8], mask: &[u8]) -> PosterResult<()> {
    if buf.len() != mask.len() {
        return Err(PosterError::render("mask and image buffers differ in size"));
    }
    for (d, m) in buf.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let w = u16::from(m[3]);
        for c in d.iter_mut() {
            *c = mul_div255_u8(u16::from(*c), w);
        }
    }
    Ok(())
}

/// Source-over of premultiplied `src` onto `dst`.
pub(crate) fn premul_over_in_place(dst: &mut [u8], src: &[u8]) -> PosterResult<()> {
    premul_over_in_place_opacity(dst, src, 1.0)
}

fn premul_over_in_place_opacity(dst: &mut [u8], src: &[u8], opacity: f32) -> PosterResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(PosterError::render(
            "premul over expects equal-length rgba8 buffers",
        ));
    }
    let op = u16::from(to_u8(opacity.clamp(0.0, 1.0)));
    if op == 0 {
        return Ok(());
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = mul_div255_u8(u16::from(s[3]), op);
        if sa == 0 {
            continue;
        }
        let inv = 255u16 - u16::from(sa);
        d[3] = sa.saturating_add(mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let sc = mul_div255_u8(u16::from(s[c]), op);
            d[c] = sc.saturating_add(mul_div255_u8(u16::from(d[c]), inv));
        }
    }
    Ok(())
}

/// Composite `src` over `dst` with a layer opacity and blend mode.
pub(crate) fn composite_over_rgba8_premul(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
    blend: BlendMode,
) -> PosterResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(PosterError::render(
            "composite expects equal-length rgba8 buffers",
        ));
    }

    // Dispatch once per op; each arm monomorphizes its own kernel.
    match blend {
        BlendMode::Normal => premul_over_in_place_opacity(dst, src, opacity),
        BlendMode::Multiply => blend_over(dst, src, opacity, |s, d| s * d),
        BlendMode::Screen => blend_over(dst, src, opacity, |s, d| s + d - s * d),
        BlendMode::Overlay => blend_over(dst, src, opacity, |s, d| hard_light(d, s)),
        BlendMode::Darken => blend_over(dst, src, opacity, f32::min),
        BlendMode::Lighten => blend_over(dst, src, opacity, f32::max),
        BlendMode::ColorDodge => blend_over(dst, src, opacity, |s, d| {
            if s >= 1.0 { 1.0 } else { (d / (1.0 - s)).min(1.0) }
        }),
        BlendMode::ColorBurn => blend_over(dst, src, opacity, |s, d| {
            if s <= 0.0 { 0.0 } else { 1.0 - ((1.0 - d) / s).min(1.0) }
        }),
        BlendMode::SoftLight => blend_over(dst, src, opacity, |s, d| {
            if s <= 0.5 {
                d - (1.0 - 2.0 * s) * d * (1.0 - d)
            } else {
                let g = if d <= 0.25 {
                    ((16.0 * d - 12.0) * d + 4.0) * d
                } else {
                    d.sqrt()
                };
                d + (2.0 * s - 1.0) * (g - d)
            }
        }),
        BlendMode::HardLight => blend_over(dst, src, opacity, hard_light),
        BlendMode::Difference => blend_over(dst, src, opacity, |s, d| (d - s).abs()),
        BlendMode::Exclusion => blend_over(dst, src, opacity, |s, d| d + s - 2.0 * d * s),
    }
}

fn hard_light(s: f32, d: f32) -> f32 {
    if s <= 0.5 {
        2.0 * s * d
    } else {
        1.0 - 2.0 * (1.0 - s) * (1.0 - d)
    }
}

#[inline(always)]
fn blend_over<F>(dst: &mut [u8], src: &[u8], opacity: f32, blend_fn: F) -> PosterResult<()>
where
    F: Fn(f32, f32) -> f32,
{
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 {
        return Ok(());
    }
    let unpremul = |p: f32, a: f32| if a > 0.0 { (p / a).clamp(0.0, 1.0) } else { 0.0 };

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        // out_a = sa + da(1 - sa); out_p = sp(1 - da) + dp(1 - sa) + B(sc, dc)·sa·da
        let sa = f32::from(s[3]) / 255.0 * opacity;
        if sa <= 0.0 {
            continue;
        }
        let da = f32::from(d[3]) / 255.0;
        for c in 0..3 {
            let sp = f32::from(s[c]) / 255.0 * opacity;
            let dp = f32::from(d[c]) / 255.0;
            let b = blend_fn(unpremul(sp, sa), unpremul(dp, da)).clamp(0.0, 1.0);
            d[c] = to_u8((sp * (1.0 - da) + dp * (1.0 - sa) + b * sa * da).clamp(0.0, 1.0));
        }
        d[3] = to_u8((sa + da * (1.0 - sa)).clamp(0.0, 1.0));
    }
    Ok(())
}

/// Alpha multiplier of a feathered slot at local point `(x, y)`, measured from the frame's
/// top-left corner in a `w`×`h` frame.
pub fn feather_alpha(x: f64, y: f64, w: f64, h: f64, f: &EdgeFeather) -> f32 {
    if w <= 0.0 || h <= 0.0 {
        return 1.0;
    }
    let ramp = |dist: f64, size: f64| -> f64 {
        if size <= 0.0 {
            1.0
        } else {
            (dist / size).clamp(0.0, 1.0)
        }
    };
    let mut a = ramp(y, f.top) * ramp(h - y, f.bottom) * ramp(x, f.left) * ramp(w - x, f.right);

    let (hw, hh) = (w / 2.0, h / 2.0);
    let (dx, dy) = (x - hw, y - hh);

    if f.radial_enabled && f.radial_size > 0.0 {
        let r = ((dx / hw).powi(2) + (dy / hh).powi(2)).sqrt();
        let start = 1.0 - f.radial_size.clamp(0.0, 100.0) / 100.0;
        a *= 1.0 - f64::from(smoothstep(start as f32, 1.0, r as f32));
    }

    if f.linear_enabled && f.linear_size > 0.0 {
        let (sin, cos) = f.linear_angle.to_radians().sin_cos();
        let half_extent = (hw * cos).abs() + (hh * sin).abs();
        if half_extent > 0.0 {
            let u = ((dx * cos + dy * sin) / half_extent + 1.0) / 2.0;
            let start = 1.0 - f.linear_size.clamp(0.0, 100.0) / 100.0;
            a *= 1.0 - f64::from(smoothstep(start as f32, 1.0, u as f32));
        }
    }

    a.clamp(0.0, 1.0) as f32
}

#[cfg(test)]
#[path = "../../tests/unit/render/pixel.rs"]
mod tests;
