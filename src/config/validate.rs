use std::collections::HashSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::assets::color::Color;
use crate::config::model::{
    CategoryConfig, FontManifest, FontWeight, OVERRIDE_VERSION, OptionDef, OptionType, OverrideDoc,
};

const TEMPLATE_EXTS: &[&str] = &["png", "jpg", "jpeg", "webp", "svg"];
const OPTION_TYPES: &[&str] = &["text", "textarea", "number", "color", "select"];

/// One problem found in an imported document, located by a JSON path like `$.categories[0].key`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaError {
    pub path: String,
    pub message: String,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every problem found in a document. Never empty when returned as an error.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaErrors(pub Vec<SchemaError>);

impl SchemaErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaError> {
        self.0.iter()
    }

    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(SchemaError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn single(path: &str, message: impl Into<String>) -> Self {
        let mut e = Self::default();
        e.push(path, message);
        e
    }

    fn into_result<T>(self, ok: impl FnOnce() -> Result<T, SchemaErrors>) -> Result<T, SchemaErrors> {
        if self.is_empty() { ok() } else { Err(self) }
    }
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}

fn parse_json(text: &str) -> Result<Value, SchemaErrors> {
    serde_json::from_str(text).map_err(|e| SchemaErrors::single("$", format!("invalid JSON: {e}")))
}

fn typed<T: DeserializeOwned>(value: Value, path: &str) -> Result<T, SchemaErrors> {
    serde_json::from_value(value).map_err(|e| SchemaErrors::single(path, e.to_string()))
}

/// Parse and validate a category config document.
pub fn parse_category_config(text: &str) -> Result<CategoryConfig, SchemaErrors> {
    category_config_from_value(parse_json(text)?)
}

pub fn category_config_from_value(value: Value) -> Result<CategoryConfig, SchemaErrors> {
    let mut errs = SchemaErrors::default();
    check_category_config(&value, "$", &mut errs);
    errs.into_result(|| typed(value, "$"))
}

/// Parse and validate a font manifest document.
pub fn parse_font_manifest(text: &str) -> Result<FontManifest, SchemaErrors> {
    font_manifest_from_value(parse_json(text)?)
}

pub fn font_manifest_from_value(value: Value) -> Result<FontManifest, SchemaErrors> {
    let mut errs = SchemaErrors::default();
    check_font_manifest(&value, "$", &mut errs);
    errs.into_result(|| typed(value, "$"))
}

/// Parse, migrate and validate an admin override document.
pub fn parse_override(text: &str) -> Result<OverrideDoc, SchemaErrors> {
    let value = migrate_override(parse_json(text)?)?;
    let mut errs = SchemaErrors::default();
    if let Some(c) = value.get("categories") {
        check_category_config(c, "$.categories", &mut errs);
    }
    if let Some(f) = value.get("fonts") {
        check_font_manifest(f, "$.fonts", &mut errs);
    }
    match value.get("fieldStyles") {
        None | Some(Value::Object(_)) => {}
        Some(_) => errs.push("$.fieldStyles", "must be an object keyed by option key"),
    }
    errs.into_result(|| typed(value, "$"))
}

/// Upgrade an override document to [`OVERRIDE_VERSION`].
///
/// Unversioned documents are version 1, which used `categoryConfig`, `fontConfig` and
/// `textDefaults` for the same three concerns.
pub fn migrate_override(value: Value) -> Result<Value, SchemaErrors> {
    let Value::Object(mut map) = value else {
        return Err(SchemaErrors::single("$", "override must be an object"));
    };
    let version = match map.get("version") {
        None => 1,
        Some(v) => v
            .as_u64()
            .ok_or_else(|| SchemaErrors::single("$.version", "must be a positive integer"))?,
    };
    if version == 1 {
        let mut upgraded = Map::new();
        upgraded.insert("version".to_owned(), Value::from(OVERRIDE_VERSION));
        for (old, new) in [
            ("categoryConfig", "categories"),
            ("fontConfig", "fonts"),
            ("textDefaults", "fieldStyles"),
        ] {
            if let Some(v) = map.remove(old).filter(|v| !v.is_null()) {
                upgraded.insert(new.to_owned(), v);
            }
        }
        map = upgraded;
    } else if version != u64::from(OVERRIDE_VERSION) {
        return Err(SchemaErrors::single(
            "$.version",
            format!("unsupported version {version} (expected <= {OVERRIDE_VERSION})"),
        ));
    }
    Ok(Value::Object(map))
}

fn required_str<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
    errs: &mut SchemaErrors,
) -> Option<&'a str> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::String(_)) => {
            errs.push(format!("{path}.{key}"), "must not be empty");
            None
        }
        Some(_) => {
            errs.push(format!("{path}.{key}"), "must be a string");
            None
        }
        None => {
            errs.push(format!("{path}.{key}"), "is required");
            None
        }
    }
}

fn check_category_config(value: &Value, path: &str, errs: &mut SchemaErrors) {
    let Some(root) = value.as_object() else {
        errs.push(path, "must be an object");
        return;
    };
    let Some(cats) = root.get("categories") else {
        errs.push(format!("{path}.categories"), "is required");
        return;
    };
    let Some(cats) = cats.as_array() else {
        errs.push(format!("{path}.categories"), "must be an array");
        return;
    };
    if cats.is_empty() {
        errs.push(format!("{path}.categories"), "must contain at least one category");
    }
    let mut seen = HashSet::new();
    for (i, cat) in cats.iter().enumerate() {
        let cpath = format!("{path}.categories[{i}]");
        let Some(obj) = cat.as_object() else {
            errs.push(cpath, "must be an object");
            continue;
        };
        if let Some(key) = required_str(obj, "key", &cpath, errs)
            && !seen.insert(key)
        {
            errs.push(format!("{cpath}.key"), format!("duplicate category key \"{key}\""));
        }
        required_str(obj, "label", &cpath, errs);
        required_str(obj, "folder", &cpath, errs);
        if let Some(ext) = required_str(obj, "ext", &cpath, errs)
            && !TEMPLATE_EXTS.contains(&ext.to_ascii_lowercase().as_str())
        {
            errs.push(
                format!("{cpath}.ext"),
                format!("unsupported extension \"{ext}\" (expected one of {})", TEMPLATE_EXTS.join(", ")),
            );
        }
        match obj.get("count").map(Value::as_u64) {
            Some(Some(n)) if n >= 1 && n <= u64::from(u32::MAX) => {}
            Some(_) => errs.push(format!("{cpath}.count"), "must be a positive integer"),
            None => errs.push(format!("{cpath}.count"), "is required"),
        }
        match obj.get("options") {
            None => {}
            Some(Value::Array(opts)) => check_options(opts, &cpath, errs),
            Some(_) => errs.push(format!("{cpath}.options"), "must be an array"),
        }
        match obj.get("slots") {
            None => {}
            Some(Value::Array(slots)) => check_slots(slots, &cpath, errs),
            Some(_) => errs.push(format!("{cpath}.slots"), "must be an array"),
        }
    }
}

fn check_options(opts: &[Value], cpath: &str, errs: &mut SchemaErrors) {
    let mut seen = HashSet::new();
    for (j, opt) in opts.iter().enumerate() {
        let opath = format!("{cpath}.options[{j}]");
        let Some(obj) = opt.as_object() else {
            errs.push(opath, "must be an object");
            continue;
        };
        if let Some(key) = required_str(obj, "key", &opath, errs)
            && !seen.insert(key)
        {
            errs.push(format!("{opath}.key"), format!("duplicate option key \"{key}\""));
        }
        required_str(obj, "label", &opath, errs);
        let kind = required_str(obj, "type", &opath, errs);
        if let Some(k) = kind
            && !OPTION_TYPES.contains(&k)
        {
            errs.push(
                format!("{opath}.type"),
                format!("unknown type \"{k}\" (expected one of {})", OPTION_TYPES.join(", ")),
            );
        }
        if let Some(m) = obj.get("maxLength")
            && !m.as_u64().is_some_and(|n| n > 0)
        {
            errs.push(format!("{opath}.maxLength"), "must be a positive integer");
        }
        match obj.get("options") {
            Some(Value::Array(choices)) => {
                if choices.iter().any(|c| !c.is_string()) {
                    errs.push(format!("{opath}.options"), "choices must be strings");
                }
                if kind == Some("select") && choices.is_empty() {
                    errs.push(format!("{opath}.options"), "select needs at least one choice");
                }
            }
            Some(_) => errs.push(format!("{opath}.options"), "must be an array"),
            None if kind == Some("select") => {
                errs.push(format!("{opath}.options"), "is required for select")
            }
            None => {}
        }
    }
}

fn check_slots(slots: &[Value], cpath: &str, errs: &mut SchemaErrors) {
    let mut seen = HashSet::new();
    for (j, slot) in slots.iter().enumerate() {
        let spath = format!("{cpath}.slots[{j}]");
        let Some(obj) = slot.as_object() else {
            errs.push(spath, "must be an object");
            continue;
        };
        if let Some(key) = required_str(obj, "key", &spath, errs)
            && !seen.insert(key)
        {
            errs.push(format!("{spath}.key"), format!("duplicate slot key \"{key}\""));
        }
        let Some(frame) = obj.get("frame").and_then(Value::as_object) else {
            errs.push(format!("{spath}.frame"), "is required");
            continue;
        };
        for dim in ["x", "y", "width", "height"] {
            let ok = frame
                .get(dim)
                .and_then(Value::as_f64)
                .is_some_and(|v| v.is_finite() && (matches!(dim, "x" | "y") || v > 0.0));
            if !ok {
                errs.push(format!("{spath}.frame.{dim}"), "must be a finite number (sizes > 0)");
            }
        }
    }
}

fn check_font_manifest(value: &Value, path: &str, errs: &mut SchemaErrors) {
    let Some(fonts) = value.get("fonts") else {
        errs.push(format!("{path}.fonts"), "is required");
        return;
    };
    let Some(fonts) = fonts.as_array() else {
        errs.push(format!("{path}.fonts"), "must be an array");
        return;
    };
    for (i, font) in fonts.iter().enumerate() {
        let fpath = format!("{path}.fonts[{i}]");
        let Some(obj) = font.as_object() else {
            errs.push(fpath, "must be an object");
            continue;
        };
        required_str(obj, "family", &fpath, errs);
        required_str(obj, "src", &fpath, errs);
        let weight_ok = match obj.get("weight") {
            None | Some(Value::Null) => true,
            Some(Value::Number(n)) => n.as_u64().is_some_and(|w| (1..=1000).contains(&w)),
            Some(Value::String(s)) => FontWeight::parse(s).is_some(),
            Some(_) => false,
        };
        if !weight_ok {
            errs.push(format!("{fpath}.weight"), "must be 1..=1000, \"normal\" or \"bold\"");
        }
    }
}

/// Check a user-entered option value against its definition; returns the value to store.
pub fn validate_option_value(def: &OptionDef, value: &str) -> Result<String, String> {
    if let Some(max) = def.max_length
        && value.chars().count() > max
    {
        return Err(format!("{} must be at most {max} characters", def.label));
    }
    match def.kind {
        OptionType::Text | OptionType::Textarea => Ok(value.to_owned()),
        OptionType::Number => {
            let t = value.trim();
            match t.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(t.to_owned()),
                _ => Err(format!("{} must be a number", def.label)),
            }
        }
        OptionType::Color => Color::parse_hex(value)
            .map(Color::to_hex)
            .map_err(|e| format!("{}: {e}", def.label)),
        OptionType::Select => {
            let choices = def.options.as_deref().unwrap_or_default();
            if choices.iter().any(|c| c == value) {
                Ok(value.to_owned())
            } else {
                Err(format!("{} must be one of {}", def.label, choices.join(", ")))
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/validate.rs"]
mod tests;
