use serde_json::json;

use super::*;

fn canvas() -> Canvas {
    Canvas::new(1200, 1680).unwrap()
}

fn slot_at(x: f64) -> ImageSlot {
    ImageSlot::new("photo", Frame::new(x, 100.0, 200.0, 200.0))
}

fn order(stack: &LayerStack) -> Vec<LayerId> {
    stack.render_order().into_iter().map(|l| l.id).collect()
}

#[test]
fn add_text_box_defaults_and_selects() {
    let mut s = LayerStack::new(canvas());
    let a = s.add_image_slot("A", slot_at(0.0));
    let t = s.add_text_box(TextBoxInit {
        content: "Hello".to_owned(),
        ..TextBoxInit::default()
    });

    let layer = s.get(t).unwrap();
    assert_eq!(layer.frame(), Some(&Frame::new(300.0, 420.0, 600.0, 60.0)));
    assert_eq!(layer.z_index, s.get(a).unwrap().z_index + 1);
    assert_eq!(s.selected(), Some(t));
}

#[test]
fn background_cannot_be_deleted() {
    let mut s = LayerStack::new(canvas());
    let bg = s.background().id;
    assert_eq!(s.delete(bg), Err(ModelError::BackgroundImmutable));
    assert_eq!(s.len(), 1);
    assert!(s.background().is_background());
}

#[test]
fn deleting_selected_clears_selection_and_unknown_id_fails() {
    let mut s = LayerStack::new(canvas());
    let t = s.add_text_box(TextBoxInit::default());
    s.delete(t).unwrap();
    assert_eq!(s.selected(), None);

    let ghost = LayerId::new();
    assert_eq!(s.delete(ghost), Err(ModelError::UnknownLayer(ghost)));
    assert!(s.select(ghost).is_err());
}

#[test]
fn duplicate_offsets_renames_and_goes_on_top() {
    let mut s = LayerStack::new(canvas());
    let t = s.add_text_box(TextBoxInit {
        name: Some("Title".to_owned()),
        frame: Some(Frame::new(10.0, 10.0, 100.0, 40.0)),
        ..TextBoxInit::default()
    });
    s.add_image_slot("A", slot_at(0.0));
    let d = s.duplicate_text_box(t).unwrap();

    let copy = s.get(d).unwrap();
    assert_ne!(d, t);
    assert_eq!(copy.name, "Title copy");
    assert_eq!(copy.frame(), Some(&Frame::new(30.0, 30.0, 100.0, 40.0)));
    assert_eq!(*order(&s).last().unwrap(), d);
    assert_eq!(s.selected(), Some(d));

    let a = s.add_image_slot("B", slot_at(0.0));
    assert!(matches!(s.duplicate_text_box(a), Err(ModelError::WrongKind { .. })));
}

#[test]
fn reorder_swaps_z_of_reorderable_pairs_only() {
    let mut s = LayerStack::new(canvas());
    let a = s.add_image_slot("A", slot_at(0.0));
    let b = s.add_image_slot("B", slot_at(10.0));
    let (za, zb) = (s.get(a).unwrap().z_index, s.get(b).unwrap().z_index);

    s.reorder(a, b).unwrap();
    assert_eq!(s.get(a).unwrap().z_index, zb);
    assert_eq!(s.get(b).unwrap().z_index, za);

    let mut pinned = slot_at(20.0);
    pinned.reorderable = false;
    let c = s.add_image_slot("C", pinned);
    assert_eq!(s.reorder(a, c), Err(ModelError::NotReorderable(a, c)));
    let bg = s.background().id;
    assert!(s.reorder(bg, a).is_err());
}

#[test]
fn move_ops_keep_background_at_bottom() {
    let mut s = LayerStack::new(canvas());
    let bg = s.background().id;
    let a = s.add_image_slot("A", slot_at(0.0));
    let b = s.add_image_slot("B", slot_at(0.0));
    let c = s.add_image_slot("C", slot_at(0.0));

    s.move_to_bottom(c).unwrap();
    assert_eq!(order(&s), vec![bg, c, a, b]);
    s.move_up(c).unwrap();
    assert_eq!(order(&s), vec![bg, a, c, b]);
    s.move_to_top(a).unwrap();
    assert_eq!(order(&s), vec![bg, c, b, a]);
    s.move_down(c).unwrap();
    assert_eq!(order(&s), vec![bg, c, b, a]);
    assert_eq!(s.move_up(bg), Err(ModelError::BackgroundImmutable));
}

#[test]
fn ties_render_in_insertion_order_and_are_stable() {
    let mut s = LayerStack::new(canvas());
    let a = s.add_image_slot("A", slot_at(0.0));
    let b = s.add_image_slot("B", slot_at(0.0));
    s.update_property(b, "zIndex", json!(s.get(a).unwrap().z_index)).unwrap();
    let first = order(&s);
    assert_eq!(first[1..], [a, b]);
    assert_eq!(order(&s), first);
}

#[test]
fn hidden_layers_are_retained_but_not_visible() {
    let mut s = LayerStack::new(canvas());
    let a = s.add_image_slot("A", slot_at(0.0));
    s.set_visible(a, false).unwrap();
    assert_eq!(s.len(), 2);
    assert!(s.visible_in_order().iter().all(|l| l.id != a));
    s.set_visible(a, true).unwrap();
    assert!(s.visible_in_order().iter().any(|l| l.id == a));
}

#[test]
fn locked_layers_refuse_edits_except_lock_and_visibility() {
    let mut s = LayerStack::new(canvas());
    let a = s.add_image_slot("A", slot_at(0.0));
    s.set_locked(a, true).unwrap();
    assert_eq!(s.update_property(a, "crop.top", json!(5.0)), Err(ModelError::Locked(a)));
    assert_eq!(s.set_frame(a, Frame::new(0.0, 0.0, 50.0, 50.0)), Err(ModelError::Locked(a)));
    s.update_property(a, "locked", json!(false)).unwrap();
    s.update_property(a, "crop.top", json!(5.0)).unwrap();
}

#[test]
fn set_image_checks_mime_and_fixed_slots() {
    let mut s = LayerStack::new(canvas());
    let mut slot = slot_at(0.0);
    slot.accepts = vec!["image/png".to_owned()];
    slot.fixed = true;
    let a = s.add_image_slot("Logo", slot);

    assert!(matches!(
        s.set_image(a, ImageRef::new("u/a.jpg")),
        Err(ModelError::RejectedMime { .. })
    ));
    assert_eq!(s.set_image(a, ImageRef::new("u/a.png")), Ok(None));
    assert_eq!(s.set_image(a, ImageRef::new("u/b.png")), Err(ModelError::FixedSlot(a)));
    assert_eq!(s.clear_image(a), Err(ModelError::FixedSlot(a)));

    let b = s.add_image_slot("Photo", slot_at(0.0));
    s.set_image(b, ImageRef::new("u/a.png")).unwrap();
    assert!(s.clear_image(b).unwrap().is_some());
}

#[test]
fn hit_test_picks_topmost_and_respects_rotation() {
    let mut s = LayerStack::new(canvas());
    let a = s.add_image_slot("A", ImageSlot::new("a", Frame::new(0.0, 0.0, 100.0, 100.0)));
    let b = s.add_image_slot("B", ImageSlot::new("b", Frame::new(50.0, 50.0, 100.0, 100.0)));
    assert_eq!(s.hit_test(Point::new(75.0, 75.0)), Some(b));
    assert_eq!(s.hit_test(Point::new(10.0, 10.0)), Some(a));
    assert_eq!(s.hit_test(Point::new(1000.0, 1000.0)), None);

    s.set_rotation(b, 45.0).unwrap();
    // The unrotated corner (149, 149) falls outside the diamond.
    assert_eq!(s.hit_test(Point::new(148.0, 148.0)), None);
}

#[test]
fn from_layers_requires_exactly_one_background() {
    let s = LayerStack::new(canvas());
    let mut layers = s.snapshot();
    assert!(LayerStack::from_layers(canvas(), layers.clone()).is_ok());
    layers.push(layers[0].clone());
    assert_eq!(
        LayerStack::from_layers(canvas(), layers).err(),
        Some(ModelError::BackgroundCount(2))
    );
    assert!(LayerStack::from_layers(canvas(), vec![]).is_err());
}

#[test]
fn image_sources_lists_template_then_slots_once() {
    let mut s = LayerStack::new(canvas());
    s.set_template_images(Some(ImageRef::new("t/1.png")), Some(ImageRef::new("t/1_fg.png")));
    let a = s.add_image_slot("A", slot_at(0.0));
    let b = s.add_image_slot("B", slot_at(300.0));
    s.add_image_slot("C", slot_at(600.0));
    s.set_image(a, ImageRef::new("u/me.png")).unwrap();
    s.set_image(b, ImageRef::new("u/me.png")).unwrap();
    assert_eq!(s.image_sources(), vec!["t/1.png", "t/1_fg.png", "u/me.png"]);
}
