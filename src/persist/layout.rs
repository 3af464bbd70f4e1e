use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::foundation::core::Canvas;
use crate::foundation::error::{PosterError, PosterResult};
use crate::layers::model::Layer;
use crate::layers::stack::LayerStack;
use crate::persist::store::KeyValueStore;

/// Current layout document version.
pub const LAYOUT_VERSION: u32 = 2;

const KEY_PREFIX: &str = "posterkit.layout.";

/// Storage key of a template: `"{category}:{index}"`.
pub fn layout_key(category: &str, index: u32) -> String {
    format!("{category}:{index}")
}

/// Saved layers of one template. Images are kept as source paths, never pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLayout {
    pub version: u32,
    pub canvas: Canvas,
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl PersistedLayout {
    pub fn capture(stack: &LayerStack, options: &BTreeMap<String, String>) -> Self {
        Self {
            version: LAYOUT_VERSION,
            canvas: stack.canvas(),
            layers: stack.snapshot(),
            options: options.clone(),
        }
    }

    /// Rebuild a stack; fails when the saved layers do not hold exactly one background.
    pub fn into_stack(self) -> PosterResult<(LayerStack, BTreeMap<String, String>)> {
        let stack = LayerStack::from_layers(self.canvas, self.layers)
            .map_err(|e| PosterError::validation(format!("saved layout: {e}")))?;
        Ok((stack, self.options))
    }
}

/// Bring any stored layout up to [`LAYOUT_VERSION`].
///
/// Version 1 was a bare layer array without canvas or options; it adopts `canvas`.
pub fn migrate_layout(value: Value, canvas: Canvas) -> PosterResult<PersistedLayout> {
    let version = match &value {
        Value::Array(_) => 1,
        Value::Object(map) => map
            .get("version")
            .and_then(Value::as_u64)
            .ok_or_else(|| PosterError::validation("layout has no numeric version"))?,
        _ => return Err(PosterError::validation("layout must be an array or object")),
    };
    match version {
        1 => {
            let layers: Vec<Layer> = match value {
                Value::Object(mut map) => {
                    serde_json::from_value(map.remove("layers").unwrap_or(Value::Array(Vec::new())))?
                }
                other => serde_json::from_value(other)?,
            };
            Ok(PersistedLayout {
                version: LAYOUT_VERSION,
                canvas,
                layers,
                options: BTreeMap::new(),
            })
        }
        2 => Ok(serde_json::from_value(value)?),
        v => Err(PosterError::validation(format!(
            "layout version {v} is newer than supported {LAYOUT_VERSION}"
        ))),
    }
}

/// Per-template layout memory on top of a [`KeyValueStore`].
#[derive(Debug)]
pub struct LayoutMemory<S> {
    store: S,
}

impl<S: KeyValueStore> LayoutMemory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn save(&mut self, key: &str, layout: &PersistedLayout) -> PosterResult<()> {
        let text = serde_json::to_string(layout)?;
        self.store.set(&format!("{KEY_PREFIX}{key}"), text)?;
        info!(key, layers = layout.layers.len(), "layout saved");
        Ok(())
    }

    /// Saved layout for `key`, migrated to the current version.
    ///
    /// A blob that no longer parses is logged and treated as absent so the caller rebuilds defaults.
    pub fn load(&self, key: &str, canvas: Canvas) -> PosterResult<Option<PersistedLayout>> {
        let Some(text) = self.store.get(&format!("{KEY_PREFIX}{key}"))? else {
            return Ok(None);
        };
        let parsed = serde_json::from_str::<Value>(&text)
            .map_err(PosterError::from)
            .and_then(|v| migrate_layout(v, canvas));
        match parsed {
            Ok(layout) => Ok(Some(layout)),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable saved layout");
                Ok(None)
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> PosterResult<()> {
        self.store.remove(&format!("{KEY_PREFIX}{key}"))
    }

    /// Template keys with a saved layout.
    pub fn saved_keys(&self) -> PosterResult<Vec<String>> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter_map(|k| k.strip_prefix(KEY_PREFIX).map(str::to_owned))
            .collect())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/persist/layout.rs"]
mod tests;
