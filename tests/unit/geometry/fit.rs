use super::*;

const EPS: f64 = 1e-9;

#[test]
fn cover_fit_covers_and_preserves_aspect() {
    let cases = [
        (800.0, 600.0, 400.0, 400.0),
        (600.0, 800.0, 400.0, 300.0),
        (100.0, 100.0, 1080.0, 1350.0),
        (1920.0, 1080.0, 1080.0, 1920.0),
        (3.0, 7.0, 11.0, 5.0),
        (500.0, 250.0, 200.0, 100.0),
    ];
    for (sw, sh, dw, dh) in cases {
        let f = cover_fit(sw, sh, dw, dh);
        assert!(f.draw_w >= dw - EPS && f.draw_h >= dh - EPS, "{sw}x{sh} -> {dw}x{dh}");
        assert!((f.draw_w / f.draw_h - sw / sh).abs() < 1e-9);
        let touches_w = (f.draw_w - dw).abs() < EPS;
        let touches_h = (f.draw_h - dh).abs() < EPS;
        assert!(touches_w || touches_h);
        assert!((f.draw_x - (dw - f.draw_w) / 2.0).abs() < EPS);
        assert!((f.draw_y - (dh - f.draw_h) / 2.0).abs() < EPS);
    }
}

#[test]
fn cover_fit_centers_overflow_axis() {
    let f = cover_fit(800.0, 600.0, 300.0, 300.0);
    assert!((f.draw_h - 300.0).abs() < EPS);
    assert!((f.draw_w - 400.0).abs() < EPS);
    assert!((f.draw_x + 50.0).abs() < EPS);
    assert_eq!(f.draw_y, 0.0);
    assert!((f.scale_from(800.0) - 0.5).abs() < EPS);
}

#[test]
fn contain_fit_letterboxes() {
    let f = contain_fit(800.0, 600.0, 300.0, 300.0);
    assert!((f.draw_w - 300.0).abs() < EPS);
    assert!((f.draw_h - 225.0).abs() < EPS);
    assert!((f.draw_y - 37.5).abs() < EPS);
}

#[test]
fn degenerate_inputs_fall_back_to_destination() {
    let f = cover_fit(0.0, 10.0, 50.0, 40.0);
    assert_eq!((f.draw_w, f.draw_h, f.draw_x, f.draw_y), (50.0, 40.0, 0.0, 0.0));
    let f = cover_fit(f64::NAN, 10.0, 50.0, 40.0);
    assert_eq!((f.draw_w, f.draw_h), (50.0, 40.0));
}
