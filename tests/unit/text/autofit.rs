use super::*;
use crate::text::measure::FixedAdvance;

fn req(strategy: FitStrategy, max_width: f64, max_height: f64) -> FitRequest {
    FitRequest {
        max_width,
        max_height,
        base_size: 36.0,
        min_size: 12.0,
        max_size: 72.0,
        strategy,
    }
}

/// "Hello World" (11 chars) measures 260px at 36px.
fn hello_metrics() -> impl FnMut(&str, f64) -> f64 {
    |t: &str, size: f64| t.chars().count() as f64 * (260.0 / 11.0) * (size / 36.0)
}

#[test]
fn shrink_fits_hello_world_within_width() {
    let mut m = hello_metrics();
    assert!((m("Hello World", 36.0) - 260.0).abs() < 1e-9);

    let r = auto_fit("Hello World", &req(FitStrategy::Shrink, 200.0, 60.0), &mut m);
    assert!(r.font_size <= 36.0 && r.font_size >= 12.0);
    for line in &r.lines {
        assert!(m(line, r.font_size) <= 200.0);
    }
    assert!(block_height(r.lines.len(), r.font_size) <= 60.0);
    assert_eq!(r.font_size, 27.0);
    assert_eq!(r.lines, vec!["Hello World"]);
}

#[test]
fn shrink_is_bounded_by_base_and_min() {
    let texts = ["", "x", "Hello World", "a much longer headline that will not fit anywhere"];
    for text in texts {
        for height in [1.0, 30.0, 200.0, 10_000.0] {
            let mut m = FixedAdvance { em: 0.6 };
            let r = auto_fit(text, &req(FitStrategy::Shrink, 120.0, height), &mut m);
            assert!(r.font_size <= 36.0, "{text} {height}");
            assert!(r.font_size >= 12.0, "{text} {height}");
        }
    }
}

#[test]
fn shrink_returns_min_when_unreachable() {
    let mut m = FixedAdvance { em: 1.0 };
    let r = auto_fit("impossible", &req(FitStrategy::Shrink, 10.0, 5.0), &mut m);
    assert_eq!(r.font_size, 12.0);
}

#[test]
fn base_below_min_is_clamped_up() {
    let mut m = FixedAdvance { em: 1.0 };
    let mut q = req(FitStrategy::Shrink, 10.0, 5.0);
    q.base_size = 4.0;
    assert_eq!(auto_fit("x", &q, &mut m).font_size, 12.0);
}

#[test]
fn reflow_keeps_size_and_falls_back_to_full_width() {
    let mut m = FixedAdvance { em: 0.5 };
    let ok = auto_fit("aa bb", &req(FitStrategy::Reflow, 400.0, 100.0), &mut m);
    assert_eq!(ok.font_size, 36.0);
    assert_eq!(ok.wrap_width, 400.0);

    let fail = auto_fit("aa bb cc dd ee", &req(FitStrategy::Reflow, 40.0, 10.0), &mut m);
    assert_eq!(fail.font_size, 36.0);
    assert_eq!(fail.wrap_width, 40.0);
}

#[test]
fn hybrid_shrinks_at_floor_width_after_narrowing_fails() {
    let mut m = FixedAdvance { em: 0.5 };
    let r = auto_fit("aa bb cc dd", &req(FitStrategy::Hybrid, 200.0, 30.0), &mut m);
    assert_eq!(r.wrap_width, 100.0);
    assert!(r.font_size < 36.0);
    assert!(r.font_size >= 12.0);
}

#[test]
fn huge_boxes_and_sizes_terminate() {
    let text = "a headline that never fits";
    for strategy in [FitStrategy::Reflow, FitStrategy::Hybrid] {
        let mut m = FixedAdvance { em: 1.0 };
        let r = auto_fit(text, &req(strategy, 1e17, 1.0), &mut m);
        assert!(r.font_size >= 12.0, "{strategy:?}");
    }

    let mut m = FixedAdvance { em: 1.0 };
    let mut q = req(FitStrategy::Shrink, 10.0, 5.0);
    q.base_size = 1e17;
    q.max_size = 1e17;
    let r = auto_fit(text, &q, &mut m);
    assert_eq!(r.font_size, 12.0);
}
