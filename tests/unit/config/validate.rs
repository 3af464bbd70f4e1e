use serde_json::json;

use super::*;

fn paths(errs: &SchemaErrors) -> Vec<&str> {
    errs.iter().map(|e| e.path.as_str()).collect()
}

#[test]
fn missing_categories_is_rejected() {
    let errs = parse_category_config("{}").unwrap_err();
    assert_eq!(paths(&errs), vec!["$.categories"]);
    assert_eq!(errs.to_string(), "$.categories: is required");
}

#[test]
fn invalid_json_reports_root() {
    let errs = parse_category_config("{not json").unwrap_err();
    assert_eq!(paths(&errs), vec!["$"]);
}

#[test]
fn every_problem_is_itemized() {
    let doc = json!({
        "categories": [
            {"key": "a", "label": "A", "folder": "a", "ext": "png", "count": 1},
            {"key": "a", "label": "", "folder": "b", "ext": "bmp", "count": 0,
             "options": [
                {"key": "t", "label": "T", "type": "text"},
                {"key": "t", "label": "T2", "type": "rich"},
                {"key": "s", "label": "S", "type": "select"}
             ]}
        ]
    });
    let errs = category_config_from_value(doc).unwrap_err();
    assert_eq!(
        paths(&errs),
        vec![
            "$.categories[1].key",
            "$.categories[1].label",
            "$.categories[1].ext",
            "$.categories[1].count",
            "$.categories[1].options[1].key",
            "$.categories[1].options[1].type",
            "$.categories[1].options[2].options",
        ]
    );
    assert!(errs.0[0].message.contains("duplicate"));
    assert_eq!(errs.to_string().lines().count(), errs.len());
}

#[test]
fn slot_frames_are_checked() {
    let doc = json!({
        "categories": [{
            "key": "a", "label": "A", "folder": "a", "ext": "png", "count": 1,
            "slots": [
                {"key": "photo", "frame": {"x": 0, "y": 0, "width": 100, "height": 100}},
                {"key": "photo", "frame": {"x": 0, "y": 0, "width": 0, "height": 100}}
            ]
        }]
    });
    let errs = category_config_from_value(doc).unwrap_err();
    assert_eq!(
        paths(&errs),
        vec!["$.categories[0].slots[1].key", "$.categories[0].slots[1].frame.width"]
    );
}

#[test]
fn valid_config_parses() {
    let cfg = category_config_from_value(json!({
        "categories": [{"key": "a", "label": "A", "folder": "a", "ext": "svg", "count": 2,
            "options": [{"key": "c", "label": "C", "type": "color"}]}]
    }))
    .unwrap();
    assert_eq!(cfg.categories[0].count, 2);
}

#[test]
fn font_manifest_checks() {
    let errs = font_manifest_from_value(json!({
        "fonts": [{"family": "Inter"}, {"family": "Inter", "src": "x.ttf", "weight": "heavy"}]
    }))
    .unwrap_err();
    assert_eq!(paths(&errs), vec!["$.fonts[0].src", "$.fonts[1].weight"]);
}

#[test]
fn legacy_override_is_migrated() {
    let legacy = r#"{
        "categoryConfig": {"categories": [{"key": "x", "label": "X", "folder": "x", "ext": "png", "count": 1}]},
        "textDefaults": {"title": {"fontSize": 50}}
    }"#;
    let doc = parse_override(legacy).unwrap();
    assert_eq!(doc.version, OVERRIDE_VERSION);
    assert_eq!(doc.categories.unwrap().categories[0].key, "x");
    assert_eq!(doc.field_styles["title"].font_size, Some(50.0));
    assert!(doc.fonts.is_none());
}

#[test]
fn override_version_and_nested_errors() {
    let errs = parse_override(r#"{"version": 7}"#).unwrap_err();
    assert_eq!(paths(&errs), vec!["$.version"]);

    let errs = parse_override(r#"{"version": 2, "categories": {}}"#).unwrap_err();
    assert_eq!(paths(&errs), vec!["$.categories.categories"]);
}

fn def(kind: OptionType) -> OptionDef {
    OptionDef {
        key: "k".to_owned(),
        label: "Field".to_owned(),
        kind,
        max_length: None,
        options: None,
        default: None,
        position: None,
        style: None,
    }
}

#[test]
fn option_values_are_checked_by_type() {
    let mut text = def(OptionType::Text);
    text.max_length = Some(3);
    assert_eq!(validate_option_value(&text, "abc").unwrap(), "abc");
    assert!(validate_option_value(&text, "abcd").is_err());

    let num = def(OptionType::Number);
    assert_eq!(validate_option_value(&num, " 12.5 ").unwrap(), "12.5");
    assert!(validate_option_value(&num, "twelve").is_err());

    let color = def(OptionType::Color);
    assert_eq!(validate_option_value(&color, "#FF0000").unwrap(), "#ff0000");
    assert!(validate_option_value(&color, "red-ish").is_err());

    let mut select = def(OptionType::Select);
    select.options = Some(vec!["warm".to_owned(), "cool".to_owned()]);
    assert!(validate_option_value(&select, "cool").is_ok());
    assert!(validate_option_value(&select, "hot").is_err());
}
