use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::assets::color::Color;
use crate::assets::fonts::{FontBook, fallback_width};
use crate::assets::store::{AssetState, AssetStore, PreparedImage};
use crate::compile::plan::{DrawOp, ImageOp, OutlineStroke, RenderPlan, TextLineOp, TextOp};
use crate::foundation::core::{Affine, Canvas, Rect, Size, Vec2};
use crate::geometry::coords::{Frame, SurfaceMapping};
use crate::geometry::fit::cover_fit;
use crate::geometry::shapes::mask_path;
use crate::layers::model::{ImageRef, ImageSlot, Layer, LayerKind, TextBox};
use crate::layers::stack::LayerStack;
use crate::text::autofit::{FitRequest, auto_fit};
use crate::text::effects::{
    TextBackground, TextStroke, anchor_in_frame, background_rect, place_lines, text_passes,
};
use crate::text::measure::FontMeasurer;
use crate::text::wrap::wrap;

/// Inputs shared by every layer of one compile.
pub struct CompileContext<'a> {
    /// Decoded images by source.
    pub assets: &'a AssetStore,
    /// Registered fonts, used to measure and shape.
    pub fonts: &'a mut FontBook,
    /// Current category option values for field-bound text.
    pub options: &'a BTreeMap<String, String>,
    /// Surface clear color.
    pub clear: Color,
}

/// Resolve the visible layers of `stack` against a `target`-sized surface.
///
/// Geometry is authored on the stack's working canvas and mapped per axis onto `target`; text is
/// wrapped and fitted in working space so every target gets identical line breaks.
#[tracing::instrument(skip_all, fields(width = target.width, height = target.height))]
pub fn compile_frame(stack: &LayerStack, target: Canvas, cx: &mut CompileContext<'_>) -> RenderPlan {
    let mapping = SurfaceMapping::between(stack.canvas(), target);
    let mut plan = RenderPlan {
        width: target.width,
        height: target.height,
        clear: cx.clear,
        ops: Vec::new(),
        pending_sources: Vec::new(),
    };

    let mut texts: Vec<(&Layer, &TextBox)> = Vec::new();
    let mut foreground: Option<(&Layer, &ImageRef)> = None;

    for layer in stack.visible_in_order() {
        match &layer.kind {
            LayerKind::Background(bg) => {
                if let Some(r) = &bg.image
                    && let Some(img) = ready(cx.assets, &r.source, &mut plan.pending_sources)
                {
                    plan.ops.push(DrawOp::Image(full_surface_op(layer, img, target)));
                }
                foreground = bg.foreground.as_ref().map(|f| (layer, f));
            }
            LayerKind::ImageSlot(slot) => {
                if let Some(r) = &slot.image
                    && let Some(img) = ready(cx.assets, &r.source, &mut plan.pending_sources)
                {
                    plan.ops
                        .push(DrawOp::Image(slot_op(layer, slot, img, &mapping)));
                }
            }
            LayerKind::Text(t) => texts.push((layer, t)),
        }
    }

    if let Some((layer, r)) = foreground
        && let Some(img) = ready(cx.assets, &r.source, &mut plan.pending_sources)
    {
        plan.ops.push(DrawOp::Image(full_surface_op(layer, img, target)));
    }

    for (layer, t) in texts {
        plan.ops.push(DrawOp::Text(text_op(layer, t, &mapping, cx)));
    }

    debug!(
        ops = plan.ops.len(),
        pending = plan.pending_sources.len(),
        "render plan compiled"
    );
    plan
}

fn ready<'a>(
    assets: &'a AssetStore,
    source: &str,
    pending: &mut Vec<String>,
) -> Option<&'a PreparedImage> {
    match assets.state(source) {
        Some(AssetState::Ready(img)) => Some(img),
        Some(AssetState::Failed(_)) => None,
        Some(AssetState::Pending) | None => {
            pending.push(source.to_owned());
            None
        }
    }
}

/// Background and foreground: cover-fit over the whole target, ignoring per-layer transforms.
fn full_surface_op(layer: &Layer, img: &PreparedImage, target: Canvas) -> ImageOp {
    let size = target.size();
    let fit = cover_fit(
        f64::from(img.width),
        f64::from(img.height),
        size.width,
        size.height,
    );
    ImageOp {
        layer: None,
        image: img.clone(),
        src: Rect::new(0.0, 0.0, f64::from(img.width), f64::from(img.height)),
        dest_size: Size::new(fit.draw_w, fit.draw_h),
        dest_offset: Vec2::ZERO,
        clip_size: size,
        mask: None,
        transform: Affine::translate(target.rect().center().to_vec2()),
        flip_h: false,
        flip_v: false,
        color_matrix: None,
        blur_px: 0.0,
        feather: None,
        stroke: None,
        opacity: layer.opacity.clamp(0.0, 1.0) as f32,
        blend: layer.blend_mode,
    }
}

fn layer_transform(layer: &Layer, frame: &Frame) -> Affine {
    let rotation = if layer.rotation_deg.is_finite() {
        layer.rotation_deg.to_radians()
    } else {
        0.0
    };
    Affine::translate(frame.center().to_vec2()) * Affine::rotate(rotation)
}

fn slot_op(layer: &Layer, slot: &ImageSlot, img: &PreparedImage, mapping: &SurfaceMapping) -> ImageOp {
    let frame = mapping.frame(&slot.frame);
    let src = slot
        .crop
        .source_rect(f64::from(img.width), f64::from(img.height));
    let fit = cover_fit(src.width(), src.height(), frame.width, frame.height);
    let scale = if slot.content.scale.is_finite() && slot.content.scale > 0.0 {
        slot.content.scale
    } else {
        1.0
    };
    let offset = Vec2::new(
        finite_or_zero(slot.content.offset_x) * mapping.sx,
        finite_or_zero(slot.content.offset_y) * mapping.sy,
    );

    let stroke = (slot.stroke.enabled && slot.stroke.width > 0.0).then(|| OutlineStroke {
        width: mapping.scalar(slot.stroke.width),
        color: slot.stroke.color,
    });

    ImageOp {
        layer: Some(layer.id),
        image: img.clone(),
        src,
        dest_size: Size::new(fit.draw_w * scale, fit.draw_h * scale),
        dest_offset: offset,
        clip_size: frame.size(),
        mask: mask_path(
            slot.mask.shape,
            frame.width,
            frame.height,
            mapping.scalar(slot.mask.radius),
        ),
        transform: layer_transform(layer, &frame),
        flip_h: slot.flip_h,
        flip_v: slot.flip_v,
        color_matrix: slot.filters.color_matrix(),
        blur_px: mapping.scalar(slot.filters.blur).max(0.0) as f32,
        feather: slot
            .edge_feather
            .is_active()
            .then(|| slot.edge_feather.scaled(mapping.uniform())),
        stroke,
        opacity: layer.opacity.clamp(0.0, 1.0) as f32,
        blend: layer.blend_mode,
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Text content after resolving an option binding.
pub(crate) fn resolved_content<'a>(t: &'a TextBox, options: &'a BTreeMap<String, String>) -> &'a str {
    t.field
        .as_ref()
        .and_then(|f| options.get(f))
        .map_or(t.content.as_str(), String::as_str)
}

fn text_op(layer: &Layer, t: &TextBox, mapping: &SurfaceMapping, cx: &mut CompileContext<'_>) -> TextOp {
    let style = &t.style;
    let content = resolved_content(t, cx.options);

    let (size, lines) = {
        let mut m = FontMeasurer::new(
            cx.fonts,
            &style.font_family,
            style.font_weight,
            style.letter_spacing,
        );
        if t.auto_fit.enabled {
            let fit = auto_fit(
                content,
                &FitRequest {
                    max_width: t.frame.width,
                    max_height: t.frame.height,
                    base_size: style.font_size,
                    min_size: t.auto_fit.min_font_size,
                    max_size: t.auto_fit.max_font_size,
                    strategy: t.auto_fit.strategy,
                },
                &mut m,
            );
            (fit.font_size, fit.lines)
        } else {
            let size = style.font_size.max(1.0);
            (size, wrap(content, t.frame.width, size, &mut m))
        }
    };

    let size_t = mapping.scalar(size);
    let spacing_t = mapping.scalar(style.letter_spacing);
    let line_h = size_t * style.line_height;
    let frame = mapping.frame(&t.frame);
    let center = frame.center();
    let font = cx.fonts.resolve(&style.font_family, style.font_weight);
    if font.is_none() && !content.trim().is_empty() {
        warn!(family = %style.font_family, layer = %layer.id, "font family not registered; text skipped");
    }

    let mut shaped = Vec::with_capacity(lines.len());
    for line in &lines {
        let (width, glyphs) = match font {
            Some(key) => match cx.fonts.shape_line(key, line, size_t, spacing_t) {
                Ok(s) => (s.width, s.glyphs),
                Err(e) => {
                    warn!(error = %e, "text shaping failed");
                    (fallback_width(line, size_t, spacing_t), Vec::new())
                }
            },
            None => (fallback_width(line, size_t, spacing_t), Vec::new()),
        };
        shaped.push(((line.clone(), width), glyphs));
    }

    let anchor = anchor_in_frame(style.align, frame.x, frame.width) - center.x;
    let top = frame.y - center.y;
    let pairs: Vec<(String, f64)> = shaped.iter().map(|(p, _)| p.clone()).collect();
    let placed = place_lines(&pairs, style.align, anchor, top, line_h);
    let block_w = pairs.iter().map(|(_, w)| *w).fold(0.0, f64::max);
    let block_h = line_h * lines.len() as f64;
    let baseline_shift = (line_h - size_t) / 2.0;

    let stroke = TextStroke {
        width: mapping.scalar(t.stroke.width),
        ..t.stroke
    };
    let background = TextBackground {
        padding: mapping.scalar(t.background.padding),
        radius: mapping.scalar(t.background.radius),
        ..t.background
    };
    let bg_rect = background_rect(style.align, anchor, top, block_w, block_h, background.padding);

    TextOp {
        layer: layer.id,
        font,
        font_size: size_t,
        line_height: line_h,
        lines: placed
            .into_iter()
            .zip(shaped)
            .map(|(p, (_, glyphs))| TextLineOp {
                text: p.text,
                x: p.x,
                y: p.y,
                baseline_shift,
                glyphs,
            })
            .collect(),
        passes: text_passes(style.color, &stroke, &background, bg_rect),
        transform: layer_transform(layer, &frame),
        opacity: layer.opacity.clamp(0.0, 1.0) as f32,
        blend: layer.blend_mode,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/compiler.rs"]
mod tests;
