use std::sync::Arc;

use super::*;
use crate::assets::store::PreparedImage;
use crate::compile::plan::OutlineStroke;
use crate::foundation::core::{Rect, Size, Vec2};
use crate::layers::model::{BlendMode, EdgeFeather};

fn solid(w: u32, h: u32, px: [u8; 4]) -> PreparedImage {
    PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(px.repeat((w * h) as usize)),
    }
}

fn op(image: PreparedImage, clip: f64, center: (f64, f64)) -> ImageOp {
    let (w, h) = (f64::from(image.width), f64::from(image.height));
    ImageOp {
        layer: None,
        src: Rect::new(0.0, 0.0, w, h),
        image,
        dest_size: Size::new(clip, clip),
        dest_offset: Vec2::ZERO,
        clip_size: Size::new(clip, clip),
        mask: None,
        transform: Affine::translate(center),
        flip_h: false,
        flip_v: false,
        color_matrix: None,
        blur_px: 0.0,
        feather: None,
        stroke: None,
        opacity: 1.0,
        blend: BlendMode::Normal,
    }
}

fn plan(ops: Vec<DrawOp>) -> RenderPlan {
    RenderPlan {
        width: 40,
        height: 40,
        clear: Color::WHITE,
        ops,
        pending_sources: Vec::new(),
    }
}

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    frame.pixel(x, y).unwrap()
}

#[test]
fn empty_plan_clears_to_color() {
    let mut backend = CpuBackend::new();
    let frame = backend.render_plan(&plan(vec![]), &FontBook::new()).unwrap();
    assert_eq!((frame.width, frame.height), (40, 40));
    assert!(frame.premultiplied);
    assert!(frame.data.chunks_exact(4).all(|p| p == [255, 255, 255, 255]));
}

#[test]
fn image_is_clipped_to_its_frame() {
    let mut o = op(solid(4, 4, [255, 0, 0, 255]), 20.0, (20.0, 20.0));
    o.dest_size = Size::new(40.0, 40.0);
    let mut backend = CpuBackend::new();
    let frame = backend.render_plan(&plan(vec![DrawOp::Image(o)]), &FontBook::new()).unwrap();
    assert_eq!(px(&frame, 20, 20), [255, 0, 0, 255]);
    assert_eq!(px(&frame, 12, 12), [255, 0, 0, 255]);
    assert_eq!(px(&frame, 5, 5), [255, 255, 255, 255]);
    assert_eq!(px(&frame, 35, 20), [255, 255, 255, 255]);
}

#[test]
fn circle_mask_leaves_corners_uncovered() {
    let mut o = op(solid(2, 2, [0, 0, 255, 255]), 30.0, (20.0, 20.0));
    o.mask = crate::geometry::shapes::mask_path(
        crate::geometry::shapes::MaskShape::Circle,
        30.0,
        30.0,
        0.0,
    );
    let mut backend = CpuBackend::new();
    let frame = backend.render_plan(&plan(vec![DrawOp::Image(o)]), &FontBook::new()).unwrap();
    assert_eq!(px(&frame, 20, 20), [0, 0, 255, 255]);
    assert_eq!(px(&frame, 6, 6), [255, 255, 255, 255]);
}

#[test]
fn flip_mirrors_content_inside_the_frame() {
    // Left half red, right half green.
    let mut bytes = Vec::new();
    for _ in 0..2 {
        bytes.extend_from_slice(&[255, 0, 0, 255, 0, 255, 0, 255]);
    }
    let img = PreparedImage {
        width: 2,
        height: 2,
        rgba8_premul: Arc::new(bytes),
    };
    let mut o = op(img, 40.0, (20.0, 20.0));
    let mut backend = CpuBackend::new();
    let plain = backend
        .render_plan(&plan(vec![DrawOp::Image(o.clone())]), &FontBook::new())
        .unwrap();
    o.flip_h = true;
    let flipped = backend.render_plan(&plan(vec![DrawOp::Image(o)]), &FontBook::new()).unwrap();

    assert_eq!(px(&plain, 2, 20), [255, 0, 0, 255]);
    assert_eq!(px(&flipped, 2, 20), [0, 255, 0, 255]);
    assert_eq!(px(&flipped, 37, 20), [255, 0, 0, 255]);
}

#[test]
fn opacity_and_blend_apply_at_composite() {
    let mut o = op(solid(2, 2, [0, 0, 0, 255]), 40.0, (20.0, 20.0));
    o.opacity = 0.5;
    let mut backend = CpuBackend::new();
    let frame = backend.render_plan(&plan(vec![DrawOp::Image(o)]), &FontBook::new()).unwrap();
    assert_eq!(px(&frame, 20, 20), [127, 127, 127, 255]);

    let mut o = op(solid(2, 2, [0, 0, 0, 255]), 40.0, (20.0, 20.0));
    o.blend = BlendMode::Screen;
    let frame = backend.render_plan(&plan(vec![DrawOp::Image(o)]), &FontBook::new()).unwrap();
    assert_eq!(px(&frame, 20, 20), [255, 255, 255, 255]);
}

#[test]
fn stroke_draws_along_the_clip_edge() {
    let mut o = op(solid(2, 2, [255, 255, 255, 255]), 20.0, (20.0, 20.0));
    o.stroke = Some(OutlineStroke {
        width: 4.0,
        color: Color::BLACK,
    });
    let mut backend = CpuBackend::new();
    let frame = backend.render_plan(&plan(vec![DrawOp::Image(o)]), &FontBook::new()).unwrap();
    assert_eq!(px(&frame, 10, 20), [0, 0, 0, 255]);
    assert_eq!(px(&frame, 20, 20), [255, 255, 255, 255]);
}

#[test]
fn feather_softens_the_left_edge() {
    let mut o = op(solid(2, 2, [0, 0, 0, 255]), 40.0, (20.0, 20.0));
    o.feather = Some(EdgeFeather {
        left: 20.0,
        ..EdgeFeather::default()
    });
    let mut backend = CpuBackend::new();
    let frame = backend.render_plan(&plan(vec![DrawOp::Image(o)]), &FontBook::new()).unwrap();
    let edge = px(&frame, 0, 20)[0];
    let mid = px(&frame, 10, 20)[0];
    assert!(edge > mid, "edge {edge} should be lighter than {mid}");
    assert_eq!(px(&frame, 30, 20), [0, 0, 0, 255]);
}

#[test]
fn oversized_frames_are_rejected() {
    let mut p = plan(vec![]);
    p.width = 70_000;
    assert!(CpuBackend::new().render_plan(&p, &FontBook::new()).is_err());
}
