use std::collections::BTreeMap;

use super::*;
use crate::assets::color::Color;
use crate::assets::store::{AssetStore, PreparedImage};
use crate::geometry::coords::Frame;
use crate::layers::model::{ImageRef, ImageSlot};
use crate::render::cpu::CpuBackend;

fn working() -> Canvas {
    Canvas::new(200, 200).unwrap()
}

fn scene() -> (LayerStack, AssetStore) {
    let mut stack = LayerStack::new(working());
    let mut slot = ImageSlot::new("photo", Frame::new(50.0, 50.0, 100.0, 100.0));
    slot.image = Some(ImageRef::new("red.png"));
    stack.add_image_slot("Photo", slot);

    let mut assets = AssetStore::new();
    assets.insert_prepared(
        "red.png",
        PreparedImage::from_premul(2, 2, [255, 0, 0, 255].repeat(4)).unwrap(),
    );
    (stack, assets)
}

#[test]
fn preview_and_export_place_the_slot_proportionally() {
    let (stack, assets) = scene();
    let mut fonts = FontBook::new();
    let options = BTreeMap::new();
    let mut cx = CompileContext {
        assets: &assets,
        fonts: &mut fonts,
        options: &options,
        clear: Color::WHITE,
    };
    let mut compositor = Compositor::new(CpuBackend::new());

    let preview = compositor.render(&stack, working(), &mut cx).unwrap().unwrap();
    let export = compositor
        .render(&stack, Canvas::new(100, 100).unwrap(), &mut cx)
        .unwrap()
        .unwrap();

    assert_eq!(preview.frame.pixel(100, 100), Some([255, 0, 0, 255]));
    assert_eq!(preview.frame.pixel(10, 10), Some([255, 255, 255, 255]));
    assert_eq!(export.frame.pixel(50, 50), Some([255, 0, 0, 255]));
    assert_eq!(export.frame.pixel(10, 10), Some([255, 255, 255, 255]));
    assert_eq!(export.frame.width, 100);
    assert_eq!(compositor.state(), RenderState::Idle);
}

#[test]
fn nested_render_is_ignored_while_rendering() {
    let (stack, assets) = scene();
    let mut fonts = FontBook::new();
    let options = BTreeMap::new();
    let mut cx = CompileContext {
        assets: &assets,
        fonts: &mut fonts,
        options: &options,
        clear: Color::WHITE,
    };
    let mut compositor = Compositor::new(CpuBackend::new());

    assert!(compositor.begin_frame());
    assert!(!compositor.begin_frame());
    assert!(compositor.render(&stack, working(), &mut cx).unwrap().is_none());
    compositor.end_frame();
    assert!(compositor.render(&stack, working(), &mut cx).unwrap().is_some());
}

#[test]
fn pending_sources_are_reported() {
    let mut stack = LayerStack::new(working());
    stack.set_template_images(Some(ImageRef::new("bg/1.png")), None);
    let assets = AssetStore::new();
    let mut fonts = FontBook::new();
    let options = BTreeMap::new();
    let mut cx = CompileContext {
        assets: &assets,
        fonts: &mut fonts,
        options: &options,
        clear: Color::WHITE,
    };
    let out = Compositor::new(CpuBackend::new())
        .render(&stack, working(), &mut cx)
        .unwrap()
        .unwrap();
    assert_eq!(out.pending_sources, vec!["bg/1.png".to_owned()]);
    assert_eq!(out.frame.pixel(0, 0), Some([255, 255, 255, 255]));
}

#[test]
fn straight_conversion_unpremultiplies() {
    let frame = FrameRGBA {
        width: 1,
        height: 1,
        data: vec![64, 0, 0, 128],
        premultiplied: true,
    };
    let straight = frame.into_straight();
    assert!(!straight.premultiplied);
    assert_eq!(straight.data[3], 128);
    assert!(straight.data[0] >= 127 && straight.data[0] <= 128);
    assert_eq!(straight.pixel(1, 0), None);
}
