use super::*;
use std::io::Cursor;
use std::sync::Arc;

use serde_json::json;

use crate::assets::store::{AssetState, PreparedImage};
use crate::export::preset::{ExportFormat, ExportSize};
use crate::layers::model::LayerKind;

const CONFIG: &str = r#"{
    "categories": [
        {"key": "classic", "label": "Classic", "folder": "t/classic", "ext": "png", "count": 2,
         "options": [
            {"key": "title", "label": "Title", "type": "text", "default": "Hello", "maxLength": 12},
            {"key": "tagline", "label": "Tagline", "type": "textarea"},
            {"key": "price", "label": "Price", "type": "number", "default": "10"}
         ],
         "slots": [
            {"key": "photo", "label": "Photo", "frame": {"x": 100, "y": 600, "width": 350, "height": 300}}
         ]}
    ]
}"#;

fn session() -> EditorSession {
    let config = ConfigRegistry::from_json(CONFIG, None).unwrap();
    let mut s = EditorSession::new(config, MemoryStore::default(), AssetStore::default());
    s.dispatch(EditorCommand::OpenTemplate {
        category: "classic".into(),
        index: 1,
    })
    .unwrap();
    s
}

fn text_contents(s: &EditorSession) -> Vec<String> {
    s.stack()
        .layers()
        .iter()
        .filter_map(|l| match &l.kind {
            LayerKind::Text(t) => Some(t.content.clone()),
            _ => None,
        })
        .collect()
}

fn slot_id(s: &EditorSession) -> LayerId {
    s.stack()
        .layers()
        .iter()
        .find(|l| matches!(l.kind, LayerKind::ImageSlot(_)))
        .unwrap()
        .id
}

#[test]
fn default_layers_follow_the_category() {
    let s = session();
    assert_eq!(s.current_template(), Some(("classic", 1)));
    assert_eq!(s.stack().layers().len(), 4);
    assert_eq!(text_contents(&s), vec!["Hello".to_owned(), String::new()]);
    assert_eq!(s.options().get("price").map(String::as_str), Some("10"));
    assert_eq!(s.stack().selected(), None);
    assert_eq!(s.history().len(), 1);

    let LayerKind::Background(bg) = &s.stack().background().kind else {
        panic!("background layer expected");
    };
    assert_eq!(bg.image.as_ref().unwrap().source, "t/classic/1.png");
    assert!(s.assets().state("t/classic/1_fg.png").is_some());
}

#[test]
fn unknown_template_is_refused() {
    let mut s = session();
    let err = s
        .dispatch(EditorCommand::OpenTemplate {
            category: "classic".into(),
            index: 3,
        })
        .unwrap_err();
    assert!(matches!(err, SessionError::UnknownTemplate { index: 3, .. }));
    assert_eq!(s.current_template(), Some(("classic", 1)));
}

#[test]
fn switching_templates_keeps_each_layout() {
    let mut s = session();
    s.dispatch(EditorCommand::AddTextBox(TextBoxInit {
        content: "Extra".into(),
        ..TextBoxInit::default()
    }))
    .unwrap();
    assert_eq!(text_contents(&s).len(), 3);

    s.dispatch(EditorCommand::OpenTemplate {
        category: "classic".into(),
        index: 2,
    })
    .unwrap();
    assert_eq!(text_contents(&s).len(), 2);

    s.dispatch(EditorCommand::OpenTemplate {
        category: "classic".into(),
        index: 1,
    })
    .unwrap();
    assert!(text_contents(&s).contains(&"Extra".to_owned()));
    assert_eq!(s.history().len(), 1);
}

#[test]
fn invalid_option_values_are_rejected() {
    let mut s = session();
    let err = s
        .dispatch(EditorCommand::SetOption {
            key: "price".into(),
            value: "cheap".into(),
        })
        .unwrap_err();
    assert!(matches!(err, SessionError::InvalidOption { .. }));
    assert_eq!(s.options().get("price").map(String::as_str), Some("10"));
    assert_eq!(s.history().len(), 1);

    let err = s
        .dispatch(EditorCommand::SetOption {
            key: "missing".into(),
            value: "x".into(),
        })
        .unwrap_err();
    assert!(matches!(err, SessionError::UnknownOption(_)));
}

#[test]
fn undo_and_redo_restore_options() {
    let mut s = session();
    s.dispatch(EditorCommand::SetOption {
        key: "title".into(),
        value: "Sale".into(),
    })
    .unwrap();
    assert_eq!(s.history().len(), 2);

    s.dispatch(EditorCommand::Undo).unwrap();
    assert_eq!(s.options().get("title").map(String::as_str), Some("Hello"));
    s.dispatch(EditorCommand::Redo).unwrap();
    assert_eq!(s.options().get("title").map(String::as_str), Some("Sale"));
    assert!(matches!(
        s.dispatch(EditorCommand::Redo),
        Err(SessionError::NothingToRedo)
    ));
}

#[test]
fn undo_restores_a_deleted_layer() {
    let mut s = session();
    let id = slot_id(&s);
    assert!(matches!(
        s.dispatch(EditorCommand::DeleteLayer { id, confirmed: false }),
        Err(SessionError::ConfirmationRequired)
    ));
    s.dispatch(EditorCommand::DeleteLayer { id, confirmed: true })
        .unwrap();
    assert!(s.stack().get(id).is_none());
    s.dispatch(EditorCommand::Undo).unwrap();
    assert!(s.stack().get(id).is_some());
}

#[test]
fn reset_needs_confirmation() {
    let mut s = session();
    s.dispatch(EditorCommand::AddTextBox(TextBoxInit::default()))
        .unwrap();
    assert!(matches!(
        s.dispatch(EditorCommand::ResetLayout { confirmed: false }),
        Err(SessionError::ConfirmationRequired)
    ));
    assert_eq!(text_contents(&s).len(), 3);
    s.dispatch(EditorCommand::ResetLayout { confirmed: true })
        .unwrap();
    assert_eq!(text_contents(&s).len(), 2);

    s.dispatch(EditorCommand::Undo).unwrap();
    assert_eq!(text_contents(&s).len(), 3);
}

#[test]
fn failed_import_reports_and_keeps_config() {
    let mut s = session();
    let err = s
        .dispatch(EditorCommand::ImportCategories(r#"{"categories": []}"#.into()))
        .unwrap_err();
    assert!(matches!(err, SessionError::Schema(_)));
    assert!(s.config().category("classic").is_some());
    assert_eq!(s.last_status().unwrap().kind, StatusKind::Error);
}

#[test]
fn save_layout_reports_success() {
    let mut s = session();
    s.dispatch(EditorCommand::SaveLayout).unwrap();
    assert_eq!(s.last_status().unwrap().kind, StatusKind::Success);
    assert_eq!(
        s.layouts().saved_keys().unwrap(),
        vec![layout_key("classic", 1)]
    );
}

#[test]
fn drag_snaps_to_canvas_edge_and_commits_once() {
    let mut s = session();
    let id = slot_id(&s);
    assert_eq!(
        s.pointer_down(Point::new(300.0, 750.0), PointerTarget::Body),
        Some(id)
    );
    assert!(s.gesture().is_dragging());
    assert!(s.pointer_move(Point::new(250.0, 750.0), false));
    assert!(s.pointer_move(Point::new(203.0, 750.0), false));
    let frame = *s.stack().get(id).unwrap().frame().unwrap();
    assert_eq!(frame.x, 0.0);
    assert_eq!(frame.y, 600.0);
    assert!(!s.guides().is_empty());

    assert!(s.pointer_up(Instant::now()));
    assert!(!s.gesture().is_dragging());
    assert_eq!(s.history().len(), 2);
    assert_eq!(
        s.history().current().unwrap().description,
        "Move layer"
    );
}

#[test]
fn locked_layer_is_selected_but_not_moved() {
    let mut s = session();
    let id = slot_id(&s);
    s.dispatch(EditorCommand::SetLocked { id, locked: true })
        .unwrap();
    assert_eq!(
        s.pointer_down(Point::new(300.0, 750.0), PointerTarget::Body),
        Some(id)
    );
    assert_eq!(s.stack().selected(), Some(id));
    assert!(!s.pointer_move(Point::new(200.0, 700.0), false));
    assert!(!s.pointer_up(Instant::now()));
}

#[test]
fn click_on_empty_canvas_deselects() {
    let mut s = session();
    let id = slot_id(&s);
    s.dispatch(EditorCommand::Select(id)).unwrap();
    s.pointer_down(Point::new(1150.0, 1600.0), PointerTarget::Body);
    assert_eq!(s.stack().selected(), None);
}

#[test]
fn render_requests_coalesce_until_the_frame() {
    let mut s = session();
    s.on_frame().unwrap();
    assert!(s.request_render());
    assert!(!s.request_render());
    let out = s.on_frame().unwrap().unwrap();
    assert_eq!((out.frame.width, out.frame.height), (1200, 1680));
    assert!(s.on_frame().unwrap().is_none());
}

#[test]
fn local_export_names_the_file_after_the_category() {
    let mut s = session();
    let settings = ExportSettings::new(ExportSize::parse("ig-post").unwrap(), ExportFormat::Png);
    let file = s.export(&settings).unwrap();
    assert_eq!(file.filename, "classic-ig-post-1080x1350.png");
    assert_eq!(file.route, ExportRoute::Local);
    assert_eq!(&file.bytes[..4], b"\x89PNG");
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 30, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn small_target() -> Canvas {
    Canvas::new(60, 84).unwrap()
}

#[test]
fn oversized_upload_fails_without_breaking_render() {
    let mut s = session();
    let id = slot_id(&s);
    let source = "uploads/pano.png";
    assert!(s.upload_image(id, ImageRef::new(source), &png(70_000, 1)).is_err());
    assert_eq!(s.last_status().unwrap().kind, StatusKind::Error);
    assert!(matches!(s.assets().state(source), Some(AssetState::Failed(_))));
    assert!(s.render_at(small_target()).unwrap().is_some());
}

#[test]
fn undrawable_image_leaves_only_its_layer_empty() {
    let mut s = session();
    let id = slot_id(&s);
    let source = "uploads/wide.png";
    s.assets_mut().insert_prepared(
        source,
        PreparedImage {
            width: 70_000,
            height: 1,
            rgba8_premul: Arc::new(vec![255; 70_000 * 4]),
        },
    );
    s.dispatch(EditorCommand::SetImage {
        id,
        image: ImageRef::new(source),
    })
    .unwrap();
    let out = s.render_at(small_target()).unwrap().unwrap();
    assert_eq!((out.frame.width, out.frame.height), (60, 84));
}

#[test]
fn huge_blur_renders() {
    let mut s = session();
    let id = slot_id(&s);
    s.upload_image(id, ImageRef::new("uploads/red.png"), &png(4, 4))
        .unwrap();
    s.dispatch(EditorCommand::UpdateProperty {
        id,
        path: "filters.blur".into(),
        value: json!(1e9),
    })
    .unwrap();
    assert!(s.render_at(small_target()).unwrap().is_some());
}
