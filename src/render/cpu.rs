use std::sync::Arc;

use kurbo::Shape;
use tracing::{debug, warn};

use crate::assets::color::Color;
use crate::assets::fonts::FontBook;
use crate::compile::plan::{DrawOp, ImageOp, RenderPlan, TextOp};
use crate::foundation::core::{Affine, BezPath, Point};
use crate::foundation::error::{PosterError, PosterResult};
use crate::foundation::math::mul_div255_u8;
use crate::geometry::shapes::rounded_rect_path;
use crate::render::backend::{FrameRGBA, RenderBackend};
use crate::render::pixel::{
    blur_rgba8_premul, color_matrix_rgba8_premul, composite_over_rgba8_premul, feather_alpha,
    mask_apply_alpha, premul_over_in_place,
};
use crate::text::effects::TextPass;

/// CPU raster backend powered by `vello_cpu`.
///
/// Each op is rasterized into its own transparent surface, run through the pixel kernels and then
/// composited onto the frame with the layer's opacity and blend mode.
#[derive(Default)]
pub struct CpuBackend {
    ctx: Option<vello_cpu::RenderContext>,
}

impl std::fmt::Debug for CpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuBackend")
            .field("has_ctx", &self.ctx.is_some())
            .finish()
    }
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut vello_cpu::RenderContext) -> PosterResult<R>,
    ) -> PosterResult<R> {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(&mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    /// Rasterize whatever `draw` records into a fresh transparent pixmap.
    fn raster(
        &mut self,
        width: u16,
        height: u16,
        draw: impl FnOnce(&mut vello_cpu::RenderContext) -> PosterResult<()>,
    ) -> PosterResult<vello_cpu::Pixmap> {
        self.with_ctx_mut(width, height, |ctx| {
            draw(ctx)?;
            let mut pixmap = vello_cpu::Pixmap::new(width, height);
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            Ok(pixmap)
        })
    }

    fn draw_image(&mut self, op: &ImageOp, width: u16, height: u16) -> PosterResult<vello_cpu::Pixmap> {
        let img = &op.image;
        let source = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(source)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        let src = op.src;
        let dest = op.dest_rect();
        if src.width() <= 0.0 || src.height() <= 0.0 || dest.width() <= 0.0 || dest.height() <= 0.0 {
            return Ok(vello_cpu::Pixmap::new(width, height));
        }
        let center = dest.center().to_vec2();
        let flip = Affine::scale_non_uniform(
            if op.flip_h { -1.0 } else { 1.0 },
            if op.flip_v { -1.0 } else { 1.0 },
        );
        let placement = op.transform
            * Affine::translate(center)
            * flip
            * Affine::translate(-center)
            * Affine::translate((dest.x0, dest.y0))
            * Affine::scale_non_uniform(dest.width() / src.width(), dest.height() / src.height())
            * Affine::translate((-src.x0, -src.y0));

        let mut pixmap = self.raster(width, height, |ctx| {
            ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_transform(affine_to_cpu(placement));
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(src.x0, src.y0, src.x1, src.y1));
            Ok(())
        })?;

        let (w, h) = (u32::from(width), u32::from(height));
        if let Some(m) = &op.color_matrix {
            color_matrix_rgba8_premul(pixmap.data_as_u8_slice_mut(), m);
        }
        if op.blur_px > 0.0 {
            blur_rgba8_premul(pixmap.data_as_u8_slice_mut(), w, h, op.blur_px)?;
        }

        let outline = clip_outline(op);
        let clip = self.raster(width, height, |ctx| {
            ctx.set_transform(affine_to_cpu(op.transform));
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
            ctx.fill_path(&bezpath_to_cpu(&outline));
            Ok(())
        })?;
        mask_apply_alpha(pixmap.data_as_u8_slice_mut(), clip.data_as_u8_slice())?;

        if let Some(feather) = &op.feather {
            apply_feather(pixmap.data_as_u8_slice_mut(), w, h, op, feather);
        }

        if let Some(stroke) = op.stroke {
            let c = stroke.color;
            let ring = self.raster(width, height, |ctx| {
                ctx.set_transform(affine_to_cpu(op.transform));
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
                ctx.set_stroke(vello_cpu::kurbo::Stroke::new(stroke.width));
                ctx.stroke_path(&bezpath_to_cpu(&outline));
                Ok(())
            })?;
            premul_over_in_place(pixmap.data_as_u8_slice_mut(), ring.data_as_u8_slice())?;
        }

        Ok(pixmap)
    }

    fn draw_text(
        &mut self,
        op: &TextOp,
        fonts: &FontBook,
        width: u16,
        height: u16,
    ) -> PosterResult<Option<vello_cpu::Pixmap>> {
        let Some(font) = op.font.and_then(|k| fonts.font_data(k)) else {
            return Ok(None);
        };
        let size = op.font_size as f32;
        let glyphs_of = |line: &crate::compile::plan::TextLineOp| {
            let ox = line.x as f32;
            let oy = (line.y + line.baseline_shift) as f32;
            line.glyphs
                .iter()
                .map(move |g| vello_cpu::Glyph {
                    id: g.id,
                    x: ox + g.x,
                    y: oy + g.y,
                })
                .collect::<Vec<_>>()
        };

        let pixmap = self.raster(width, height, |ctx| {
            ctx.set_transform(affine_to_cpu(op.transform));
            for pass in &op.passes {
                match *pass {
                    TextPass::Background { rect, radius, color } => {
                        ctx.set_paint(cpu_color(color));
                        ctx.fill_path(&bezpath_to_cpu(&rounded_rect_path(rect, radius)));
                    }
                    TextPass::Stroke { width, color } => {
                        ctx.set_paint(cpu_color(color));
                        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
                        for line in &op.lines {
                            ctx.glyph_run(font)
                                .font_size(size)
                                .stroke_glyphs(glyphs_of(line).into_iter());
                        }
                    }
                    TextPass::Fill { color } => {
                        ctx.set_paint(cpu_color(color));
                        for line in &op.lines {
                            ctx.glyph_run(font)
                                .font_size(size)
                                .fill_glyphs(glyphs_of(line).into_iter());
                        }
                    }
                }
            }
            Ok(())
        })?;
        Ok(Some(pixmap))
    }
}

impl RenderBackend for CpuBackend {
    #[tracing::instrument(skip_all, fields(width = plan.width, height = plan.height, ops = plan.ops.len()))]
    fn render_plan(&mut self, plan: &RenderPlan, fonts: &FontBook) -> PosterResult<FrameRGBA> {
        let width: u16 = plan
            .width
            .try_into()
            .map_err(|_| PosterError::render("frame width exceeds u16"))?;
        let height: u16 = plan
            .height
            .try_into()
            .map_err(|_| PosterError::render("frame height exceeds u16"))?;
        if width == 0 || height == 0 {
            return Err(PosterError::render("frame must be at least 1x1"));
        }

        let mut data = vec![0u8; usize::from(width) * usize::from(height) * 4];
        let clear = plan.clear.to_premul().to_array();
        for px in data.chunks_exact_mut(4) {
            px.copy_from_slice(&clear);
        }

        let mut skipped_text = 0usize;
        for op in &plan.ops {
            match op {
                DrawOp::Image(img) => match self.draw_image(img, width, height) {
                    Ok(layer) => {
                        composite_over_rgba8_premul(
                            &mut data,
                            layer.data_as_u8_slice(),
                            img.opacity,
                            img.blend,
                        )?;
                    }
                    Err(e) => warn!(error = %e, "image layer not drawn"),
                },
                DrawOp::Text(text) => match self.draw_text(text, fonts, width, height)? {
                    Some(layer) => {
                        composite_over_rgba8_premul(
                            &mut data,
                            layer.data_as_u8_slice(),
                            text.opacity,
                            text.blend,
                        )?;
                    }
                    None => skipped_text += 1,
                },
            }
        }
        if skipped_text > 0 {
            warn!(skipped_text, "text layers without a registered font were not drawn");
        }
        debug!("frame rasterized");

        Ok(FrameRGBA {
            width: plan.width,
            height: plan.height,
            data,
            premultiplied: true,
        })
    }
}

fn clip_outline(op: &ImageOp) -> BezPath {
    match &op.mask {
        Some(path) => path.clone(),
        None => op.clip_rect().to_path(0.1),
    }
}

fn apply_feather(
    buf: &mut [u8],
    width: u32,
    height: u32,
    op: &ImageOp,
    feather: &crate::layers::model::EdgeFeather,
) {
    let clip = op.clip_rect();
    let bounds = op.transform.transform_rect_bbox(clip);
    let inverse = op.transform.inverse();
    let x0 = bounds.x0.floor().max(0.0) as u32;
    let y0 = bounds.y0.floor().max(0.0) as u32;
    let x1 = (bounds.x1.ceil().max(0.0) as u32).min(width);
    let y1 = (bounds.y1.ceil().max(0.0) as u32).min(height);
    let (cw, ch) = (clip.width(), clip.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let local = inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let a = feather_alpha(local.x - clip.x0, local.y - clip.y0, cw, ch, feather);
            if a >= 1.0 {
                continue;
            }
            let w = u16::from((a * 255.0).round() as u8);
            let i = (y as usize * width as usize + x as usize) * 4;
            for c in &mut buf[i..i + 4] {
                *c = mul_div255_u8(u16::from(*c), w);
            }
        }
    }
}

fn cpu_color(c: Color) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(bytes: &[u8], width: u32, height: u32) -> PosterResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| PosterError::render("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| PosterError::render("image height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(PosterError::render("image byte length mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
