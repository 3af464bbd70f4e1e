use serde_json::{Map, Value};

use crate::layers::model::Layer;
use crate::layers::stack::ModelError;

/// Fields that identify a layer and may not be rewritten through a property path.
const IMMUTABLE_ROOTS: [&str; 2] = ["id", "type"];

/// Set the camelCase dotted `path` of `layer` to `value`.
///
/// Intermediate objects are created as needed (`image.source` on an empty slot). The layer is only
/// replaced when the result deserializes and the path still exists afterwards; on any failure the
/// layer is left untouched.
pub(crate) fn apply_property(layer: &mut Layer, path: &str, value: Value) -> Result<(), ModelError> {
    let invalid = |reason: String| ModelError::InvalidProperty {
        path: path.to_owned(),
        reason,
    };

    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(invalid("empty path segment".to_owned()));
    }
    if IMMUTABLE_ROOTS.contains(&segments[0]) {
        return Err(invalid("property is immutable".to_owned()));
    }

    let mut doc = serde_json::to_value(&*layer).map_err(|e| invalid(e.to_string()))?;
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| invalid("empty path".to_owned()))?;

    let mut cur = &mut doc;
    for seg in parents {
        let obj = cur
            .as_object_mut()
            .ok_or_else(|| invalid(format!("\"{seg}\" is not inside an object")))?;
        let slot = obj
            .entry((*seg).to_owned())
            .or_insert_with(|| Value::Object(Map::new()));
        if slot.is_null() {
            *slot = Value::Object(Map::new());
        }
        cur = slot;
    }
    cur.as_object_mut()
        .ok_or_else(|| invalid(format!("\"{last}\" is not inside an object")))?
        .insert((*last).to_owned(), value);

    let mut updated: Layer = serde_json::from_value(doc).map_err(|e| invalid(e.to_string()))?;

    let check = serde_json::to_value(&updated).map_err(|e| invalid(e.to_string()))?;
    if lookup(&check, &segments).is_none() {
        return Err(invalid("unknown property".to_owned()));
    }

    sanitize_against(layer, &mut updated);
    *layer = updated;
    Ok(())
}

/// Replace non-finite geometry, rotation and opacity in `next` with the values of `prev`.
pub(crate) fn sanitize_against(prev: &Layer, next: &mut Layer) {
    if let (Some(before), Some(after)) = (prev.frame(), next.frame_mut()) {
        *after = after.sanitize(before);
    }
    if !next.rotation_deg.is_finite() {
        next.rotation_deg = prev.rotation_deg;
    }
    next.opacity = if next.opacity.is_finite() {
        next.opacity.clamp(0.0, 1.0)
    } else {
        prev.opacity
    };
}

fn lookup<'a>(v: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(v, |cur, seg| cur.as_object().and_then(|o| o.get(*seg)))
}

#[cfg(test)]
#[path = "../../tests/unit/layers/property.rs"]
mod tests;
