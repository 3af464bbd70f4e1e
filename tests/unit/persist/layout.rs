use serde_json::json;

use super::*;
use crate::geometry::coords::Frame;
use crate::layers::model::{ImageRef, ImageSlot};
use crate::persist::store::{FileStore, MemoryStore};

fn canvas() -> Canvas {
    Canvas::new(1200, 1680).unwrap()
}

fn stack_with_photo() -> LayerStack {
    let mut s = LayerStack::new(canvas());
    let id = s.add_image_slot("Photo", ImageSlot::new("photo1", Frame::new(10.0, 20.0, 300.0, 200.0)));
    s.set_image(id, ImageRef::new("uploads/me.png")).unwrap();
    s
}

#[test]
fn key_pattern() {
    assert_eq!(layout_key("classic", 3), "classic:3");
}

#[test]
fn save_then_load_restores_layers_and_options() {
    let mut mem = LayoutMemory::new(MemoryStore::new());
    let stack = stack_with_photo();
    let options = BTreeMap::from([("title".to_owned(), "Hi".to_owned())]);
    mem.save("classic:1", &PersistedLayout::capture(&stack, &options))
        .unwrap();

    let loaded = mem.load("classic:1", canvas()).unwrap().unwrap();
    assert_eq!(loaded.version, LAYOUT_VERSION);
    let (restored, opts) = loaded.into_stack().unwrap();
    assert_eq!(restored.layers(), stack.layers());
    assert_eq!(opts, options);
    assert_eq!(mem.saved_keys().unwrap(), vec!["classic:1".to_owned()]);
}

#[test]
fn images_are_stored_as_paths() {
    let mut mem = LayoutMemory::new(MemoryStore::new());
    mem.save("k:0", &PersistedLayout::capture(&stack_with_photo(), &BTreeMap::new()))
        .unwrap();
    let raw = mem.store().get("posterkit.layout.k:0").unwrap().unwrap();
    assert!(raw.contains("uploads/me.png"));
    assert!(raw.len() < 4096);
}

#[test]
fn legacy_array_is_migrated() {
    let stack = stack_with_photo();
    let legacy = serde_json::to_value(stack.layers()).unwrap();
    let layout = migrate_layout(legacy, canvas()).unwrap();
    assert_eq!(layout.version, LAYOUT_VERSION);
    assert_eq!(layout.canvas, canvas());
    assert_eq!(layout.layers, stack.snapshot());
    assert!(layout.options.is_empty());
}

#[test]
fn future_and_malformed_versions_are_rejected() {
    assert!(migrate_layout(json!({"version": 9, "layers": []}), canvas()).is_err());
    assert!(migrate_layout(json!({"layers": []}), canvas()).is_err());
    assert!(migrate_layout(json!("text"), canvas()).is_err());
}

#[test]
fn unreadable_blob_loads_as_absent() {
    let mut mem = LayoutMemory::new(MemoryStore::new());
    mem.store_mut()
        .set("posterkit.layout.x:1", "[{\"id\": 5}]".to_owned())
        .unwrap();
    assert_eq!(mem.load("x:1", canvas()).unwrap(), None);
}

#[test]
fn layout_without_background_does_not_restore() {
    let layout = PersistedLayout {
        version: LAYOUT_VERSION,
        canvas: canvas(),
        layers: Vec::new(),
        options: BTreeMap::new(),
    };
    assert!(layout.into_stack().is_err());
}

#[test]
fn file_backed_memory_persists_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layouts.json");
    let stack = stack_with_photo();
    {
        let mut mem = LayoutMemory::new(FileStore::open(&path).unwrap());
        mem.save("classic:2", &PersistedLayout::capture(&stack, &BTreeMap::new()))
            .unwrap();
    }
    let mem = LayoutMemory::new(FileStore::open(&path).unwrap());
    let loaded = mem.load("classic:2", canvas()).unwrap().unwrap();
    assert_eq!(loaded.layers, stack.snapshot());
}
