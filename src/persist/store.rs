use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::foundation::error::PosterResult;

/// String key-value persistence boundary.
///
/// Values are opaque JSON strings; callers own their schema and versioning.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> PosterResult<Option<String>>;
    fn set(&mut self, key: &str, value: String) -> PosterResult<()>;
    fn remove(&mut self, key: &str) -> PosterResult<()>;
    /// All keys in ascending order.
    fn keys(&self) -> PosterResult<Vec<String>>;
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    map: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> PosterResult<Option<String>> {
        Ok(self.map.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> PosterResult<()> {
        self.map.insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> PosterResult<()> {
        self.map.remove(key);
        Ok(())
    }

    fn keys(&self) -> PosterResult<Vec<String>> {
        Ok(self.map.keys().cloned().collect())
    }
}

/// One JSON object file holding every key, rewritten on each change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    map: BTreeMap<String, String>,
}

impl FileStore {
    /// Open `path`, starting empty when it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> PosterResult<Self> {
        let path = path.into();
        let map = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("read store file '{}'", path.display()))?;
            serde_json::from_str(&text)?
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), keys = map.len(), "key-value store opened");
        Ok(Self { path, map })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> PosterResult<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create store dir '{}'", dir.display()))?;
        }
        let text = serde_json::to_string_pretty(&self.map)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, text).with_context(|| format!("write '{}'", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace '{}'", self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> PosterResult<Option<String>> {
        Ok(self.map.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> PosterResult<()> {
        self.map.insert(key.to_owned(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> PosterResult<()> {
        if self.map.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn keys(&self) -> PosterResult<Vec<String>> {
        Ok(self.map.keys().cloned().collect())
    }
}
