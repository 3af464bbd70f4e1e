use super::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn frames_close(a: &Frame, b: &Frame) -> bool {
    close(a.x, b.x) && close(a.y, b.y) && close(a.width, b.width) && close(a.height, b.height)
}

#[test]
fn screen_to_canvas_follows_css_scaling() {
    let canvas = Canvas::new(1200, 1680).unwrap();
    let element = Rect::new(100.0, 50.0, 100.0 + 600.0, 50.0 + 840.0);
    let p = screen_to_canvas(Point::new(400.0, 470.0), element, canvas).unwrap();
    assert!(close(p.x, 600.0) && close(p.y, 840.0));

    let back = canvas_to_screen(p, element, canvas);
    assert!(close(back.x, 400.0) && close(back.y, 470.0));

    assert!(screen_to_canvas(Point::ORIGIN, Rect::new(0.0, 0.0, 0.0, 10.0), canvas).is_none());
}

#[test]
fn point_in_rect_is_inclusive() {
    let r = Rect::new(10.0, 10.0, 20.0, 20.0);
    assert!(point_in_rect(Point::new(10.0, 10.0), r));
    assert!(point_in_rect(Point::new(20.0, 20.0), r));
    assert!(!point_in_rect(Point::new(20.0001, 15.0), r));
}

#[test]
fn normalized_frame_round_trips() {
    let canvas = Canvas::new(1200, 1680).unwrap();
    let f = Frame::new(120.0, 300.0, 480.0, 200.0);
    let n = NormalizedFrame::from_frame(&f, canvas);
    assert!(frames_close(&n.to_frame(canvas), &f));
}

#[test]
fn field_position_round_trips_for_every_alignment() {
    let canvas = Canvas::new(1080, 1350).unwrap();
    for align in [TextAlign::Left, TextAlign::Center, TextAlign::Right] {
        let pos = FieldPosition {
            x: 0.5,
            y: 0.1,
            max_width: 0.8,
        };
        let f = pos.to_frame(canvas, align, 60.0);
        let back = FieldPosition::from_frame(&f, canvas, align);
        assert!(close(back.x, pos.x) && close(back.y, pos.y) && close(back.max_width, 0.8));
    }
    let f = FieldPosition {
        x: 0.5,
        y: 0.0,
        max_width: 0.5,
    }
    .to_frame(canvas, TextAlign::Center, 10.0);
    assert!(close(f.x, 270.0) && close(f.width, 540.0));
}

#[test]
fn center_offset_round_trips() {
    let base = Frame::new(100.0, 100.0, 400.0, 300.0);
    let co = CenterOffset {
        offset_x: 15.0,
        offset_y: -30.0,
        scale: 1.5,
    };
    let f = co.to_frame(&base);
    assert!(close(f.width, 600.0) && close(f.height, 450.0));
    let back = CenterOffset::from_frame(&f, &base);
    assert!(close(back.offset_x, 15.0) && close(back.offset_y, -30.0) && close(back.scale, 1.5));
}

#[test]
fn sanitize_replaces_non_finite_and_clamps_min_size() {
    let prev = Frame::new(1.0, 2.0, 100.0, 100.0);
    let f = Frame::new(f64::NAN, 5.0, 3.0, f64::INFINITY).sanitize(&prev);
    assert_eq!(f, Frame::new(1.0, 5.0, MIN_FRAME_EDGE, 100.0));
}

#[test]
fn surface_mapping_scales_positions_per_axis() {
    let working = Canvas::new(1200, 1680).unwrap();
    let target = Canvas::new(1080, 1350).unwrap();
    let m = SurfaceMapping::between(working, target);
    let p = m.point(Point::new(600.0, 840.0));
    assert!(close(p.x, 540.0) && close(p.y, 675.0));
    assert!(close(m.scalar(10.0), 10.0 * (1350.0 / 1680.0)));
}
