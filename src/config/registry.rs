use tracing::{info, warn};

use crate::config::model::{Category, CategoryConfig, FieldStyle, FontManifest, OverrideDoc};
use crate::config::validate::{
    SchemaErrors, parse_category_config, parse_font_manifest, parse_override,
};
use crate::foundation::error::PosterResult;
use crate::layers::model::TextStyle;
use crate::persist::store::KeyValueStore;

/// Storage key of the admin override document.
pub const OVERRIDE_KEY: &str = "posterkit.adminOverride";

/// Shipped configuration plus admin overrides.
///
/// Every import validates first and leaves the registry untouched when it fails.
#[derive(Clone, Debug, Default)]
pub struct ConfigRegistry {
    shipped: CategoryConfig,
    shipped_fonts: FontManifest,
    overrides: OverrideDoc,
}

impl ConfigRegistry {
    pub fn new(categories: CategoryConfig, fonts: FontManifest) -> Self {
        Self {
            shipped: categories,
            shipped_fonts: fonts,
            overrides: OverrideDoc::default(),
        }
    }

    /// Registry from shipped JSON documents.
    pub fn from_json(categories: &str, fonts: Option<&str>) -> Result<Self, SchemaErrors> {
        let categories = parse_category_config(categories)?;
        let fonts = fonts.map(parse_font_manifest).transpose()?.unwrap_or_default();
        Ok(Self::new(categories, fonts))
    }

    /// Effective categories: the override when present, else the shipped set.
    pub fn categories(&self) -> &CategoryConfig {
        self.overrides.categories.as_ref().unwrap_or(&self.shipped)
    }

    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories().get(key)
    }

    pub fn fonts(&self) -> &FontManifest {
        self.overrides.fonts.as_ref().unwrap_or(&self.shipped_fonts)
    }

    pub fn overrides(&self) -> &OverrideDoc {
        &self.overrides
    }

    /// Default text style of a category option: built-in style, then the option's own style,
    /// then any admin field style.
    pub fn text_style_for(&self, category: &str, option: &str) -> TextStyle {
        let mut style = TextStyle::default();
        let own = self
            .category(category)
            .and_then(|c| c.option(option))
            .and_then(|o| o.style.clone())
            .unwrap_or_default();
        match self.overrides.field_styles.get(option) {
            Some(admin) => admin.or(&own).apply(&mut style),
            None => own.apply(&mut style),
        }
        style
    }

    /// Replace the effective categories with an imported document.
    pub fn import_categories(&mut self, text: &str) -> Result<usize, SchemaErrors> {
        let config = parse_category_config(text)?;
        let n = config.categories.len();
        self.overrides.categories = Some(config);
        info!(categories = n, "category config imported");
        Ok(n)
    }

    pub fn import_fonts(&mut self, text: &str) -> Result<usize, SchemaErrors> {
        let manifest = parse_font_manifest(text)?;
        let n = manifest.fonts.len();
        self.overrides.fonts = Some(manifest);
        info!(fonts = n, "font manifest imported");
        Ok(n)
    }

    /// Replace the whole override document. Legacy documents are migrated first.
    pub fn import_override(&mut self, text: &str) -> Result<(), SchemaErrors> {
        self.overrides = parse_override(text)?;
        info!("admin override imported");
        Ok(())
    }

    pub fn export_override(&self) -> PosterResult<String> {
        Ok(serde_json::to_string_pretty(&self.overrides)?)
    }

    pub fn set_field_style(&mut self, option: impl Into<String>, style: FieldStyle) {
        self.overrides.field_styles.insert(option.into(), style);
    }

    /// Drop a category from the effective set. Returns whether it existed.
    pub fn delete_category(&mut self, key: &str) -> bool {
        let mut config = self.categories().clone();
        let before = config.categories.len();
        config.categories.retain(|c| c.key != key);
        if config.categories.len() == before {
            return false;
        }
        self.overrides.categories = Some(config);
        info!(key, "category deleted");
        true
    }

    pub fn clear_override(&mut self) {
        self.overrides = OverrideDoc::default();
        info!("admin override cleared");
    }

    /// Restore a stored override. A missing or invalid one leaves the shipped defaults active.
    pub fn load_override(&mut self, store: &impl KeyValueStore) {
        let text = match store.get(OVERRIDE_KEY) {
            Ok(Some(t)) => t,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "admin override unavailable");
                return;
            }
        };
        match parse_override(&text) {
            Ok(doc) => self.overrides = doc,
            Err(errs) => warn!(errors = %errs, "ignoring invalid stored admin override"),
        }
    }

    pub fn save_override(&self, store: &mut impl KeyValueStore) -> PosterResult<()> {
        if self.overrides.is_empty() {
            return store.remove(OVERRIDE_KEY);
        }
        store.set(OVERRIDE_KEY, self.export_override()?)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/registry.rs"]
mod tests;
