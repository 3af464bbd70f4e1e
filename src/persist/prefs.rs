use tracing::warn;

use crate::foundation::error::PosterResult;
use crate::persist::store::KeyValueStore;
use crate::snap::engine::SnapSettings;

/// Storage key of the guide, grid and snap preferences.
pub const GUIDE_PREFS_KEY: &str = "posterkit.guidePrefs";

/// Stored guide preferences, or defaults when absent or unreadable.
pub fn load_guide_prefs(store: &impl KeyValueStore) -> SnapSettings {
    let text = match store.get(GUIDE_PREFS_KEY) {
        Ok(Some(text)) => text,
        Ok(None) => return SnapSettings::default(),
        Err(e) => {
            warn!(error = %e, "guide preferences unavailable");
            return SnapSettings::default();
        }
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!(error = %e, "guide preferences unreadable; using defaults");
        SnapSettings::default()
    })
}

pub fn save_guide_prefs(store: &mut impl KeyValueStore, settings: &SnapSettings) -> PosterResult<()> {
    store.set(GUIDE_PREFS_KEY, serde_json::to_string(settings)?)
}
