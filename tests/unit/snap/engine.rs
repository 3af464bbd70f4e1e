use super::*;
use crate::layers::model::{ImageSlot, LayerKind};

fn canvas() -> Canvas {
    Canvas::new(1200, 1680).unwrap()
}

fn plain() -> SnapSettings {
    SnapSettings {
        thirds: false,
        ..SnapSettings::default()
    }
}

fn slot(x: f64, y: f64, w: f64, h: f64) -> Layer {
    Layer::new("s", LayerKind::ImageSlot(ImageSlot::new("s", Frame::new(x, y, w, h))))
}

fn values(c: &[SnapCandidate], axis: Axis) -> Vec<f64> {
    c.iter().filter(|c| c.axis == axis).map(|c| c.value).collect()
}

#[test]
fn canvas_candidates_are_always_present() {
    let c = compute_snap_candidates(None, &[], canvas(), &plain());
    assert_eq!(values(&c, Axis::X), vec![0.0, 1200.0, 600.0]);
    assert_eq!(values(&c, Axis::Y), vec![0.0, 1680.0, 840.0]);

    let c = compute_snap_candidates(None, &[], canvas(), &SnapSettings::default());
    assert!(values(&c, Axis::X).contains(&400.0));
    assert!(values(&c, Axis::X).contains(&800.0));
}

#[test]
fn grid_and_sibling_lines_are_added() {
    let grid = SnapSettings {
        grid_enabled: true,
        grid_size: 500.0,
        ..plain()
    };
    let c = compute_snap_candidates(None, &[], canvas(), &grid);
    assert_eq!(values(&c, Axis::X), vec![0.0, 1200.0, 600.0, 500.0, 1000.0]);

    let a = slot(100.0, 200.0, 100.0, 50.0);
    let me = slot(0.0, 0.0, 10.0, 10.0);
    let mut hidden = slot(7.0, 7.0, 1.0, 1.0);
    hidden.visible = false;
    let mut locked = slot(9.0, 9.0, 1.0, 1.0);
    locked.locked = true;
    let layers = vec![a.clone(), me.clone(), hidden, locked];

    let c = compute_snap_candidates(Some(me.id), &layers, canvas(), &plain());
    let from_layers: Vec<_> = c
        .iter()
        .filter(|c| matches!(c.source, SnapSource::Layer(_)))
        .collect();
    assert_eq!(from_layers.len(), 6);
    assert!(from_layers.iter().all(|c| c.source == SnapSource::Layer(a.id)));
    assert_eq!(values(&c, Axis::Y)[3..], [200.0, 225.0, 250.0]);
}

#[test]
fn threshold_boundary_is_inclusive() {
    let c = compute_snap_candidates(None, &[], canvas(), &plain());
    // Left edge 10px from 0 snaps.
    let r = find_snap_points(10.0, 300.0, 100.0, 100.0, &c, 10.0);
    assert_eq!(r.x, 0.0);
    assert_eq!(r.guides, vec![Guide { axis: Axis::X, position: 0.0 }]);
    // 11px does not.
    let r = find_snap_points(11.0, 300.0, 100.0, 100.0, &c, 10.0);
    assert_eq!(r.x, 11.0);
    assert!(r.guides.is_empty());
}

#[test]
fn axes_resolve_independently_using_center_and_far_edge() {
    let c = compute_snap_candidates(None, &[], canvas(), &plain());
    // Right edge 603 -> 600; bottom edge 1675 -> 1680.
    let r = find_snap_points(503.0, 1575.0, 100.0, 100.0, &c, 10.0);
    assert_eq!(r.x, 500.0);
    assert_eq!(r.y, 1580.0);
    assert_eq!(r.guides.len(), 2);

    let r = find_snap_points(300.0, 1575.0, 100.0, 100.0, &c, 10.0);
    assert_eq!(r.x, 300.0);
    assert_eq!(r.y, 1580.0);
    assert_eq!(r.guides, vec![Guide { axis: Axis::Y, position: 1680.0 }]);
}

#[test]
fn resize_edge_and_disabled_settings() {
    let c = compute_snap_candidates(None, &[], canvas(), &plain());
    assert_eq!(snap_edge(1195.0, Axis::X, &c, 10.0).map(|(v, _)| v), Some(1200.0));
    assert_eq!(snap_edge(1100.0, Axis::X, &c, 10.0), None);

    let off = SnapSettings {
        enabled: false,
        ..SnapSettings::default()
    };
    let r = snap_frame(&Frame::new(3.0, 3.0, 50.0, 50.0), None, &[], canvas(), &off);
    assert_eq!((r.x, r.y), (3.0, 3.0));
    assert!(r.guides.is_empty());
}
