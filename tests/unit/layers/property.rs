use serde_json::json;

use super::*;
use crate::geometry::coords::Frame;
use crate::layers::model::{ImageSlot, LayerKind};

fn slot_layer() -> Layer {
    Layer::new(
        "Photo",
        LayerKind::ImageSlot(ImageSlot::new("photo", Frame::new(0.0, 0.0, 200.0, 100.0))),
    )
}

fn slot(layer: &Layer) -> &ImageSlot {
    match &layer.kind {
        LayerKind::ImageSlot(s) => s,
        _ => panic!("expected slot"),
    }
}

#[test]
fn dotted_paths_update_nested_fields() {
    let mut l = slot_layer();
    apply_property(&mut l, "crop.top", json!(12.0)).unwrap();
    apply_property(&mut l, "stroke.color", json!("#ff0000")).unwrap();
    apply_property(&mut l, "edgeFeather.radialEnabled", json!(true)).unwrap();
    apply_property(&mut l, "opacity", json!(0.25)).unwrap();

    let s = slot(&l);
    assert_eq!(s.crop.top, 12.0);
    assert_eq!(s.stroke.color.r, 255);
    assert!(s.edge_feather.radial_enabled);
    assert_eq!(l.opacity, 0.25);
}

#[test]
fn missing_intermediates_are_created() {
    let mut l = slot_layer();
    apply_property(&mut l, "image.source", json!("uploads/x.png")).unwrap();
    assert_eq!(slot(&l).image.as_ref().unwrap().source, "uploads/x.png");
}

#[test]
fn failures_leave_layer_untouched() {
    let mut l = slot_layer();
    let before = l.clone();

    assert!(apply_property(&mut l, "crop.top", json!("nope")).is_err());
    assert!(apply_property(&mut l, "noSuchField", json!(1)).is_err());
    assert!(apply_property(&mut l, "crop..top", json!(1)).is_err());
    assert!(apply_property(&mut l, "id", json!("x")).is_err());
    assert!(apply_property(&mut l, "type", json!("text")).is_err());
    assert!(apply_property(&mut l, "opacity.deep", json!(1)).is_err());
    assert_eq!(l, before);
}

#[test]
fn geometry_is_clamped_after_update() {
    let mut l = slot_layer();
    apply_property(&mut l, "frame.width", json!(3.0)).unwrap();
    assert_eq!(slot(&l).frame.width, 20.0);

    apply_property(&mut l, "opacity", json!(4.0)).unwrap();
    assert_eq!(l.opacity, 1.0);
}

#[test]
fn non_finite_opacity_keeps_previous_value() {
    let mut prev = slot_layer();
    prev.opacity = 0.4;
    let mut next = prev.clone();
    next.opacity = f64::NAN;
    sanitize_against(&prev, &mut next);
    assert_eq!(next.opacity, 0.4);

    next.opacity = f64::INFINITY;
    sanitize_against(&prev, &mut next);
    assert_eq!(next.opacity, 0.4);

    next.opacity = 1.5;
    sanitize_against(&prev, &mut next);
    assert_eq!(next.opacity, 1.0);
}
