use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::assets::decode::decode_for_source;
use crate::foundation::error::{PosterError, PosterResult};

#[derive(Clone, Debug, PartialEq)]
/// Prepared raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Build from premultiplied bytes, checking the buffer length.
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> PosterResult<Self> {
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if width == 0 || height == 0 || rgba8_premul.len() != expected {
            return Err(PosterError::asset(format!(
                "image buffer of {} bytes does not match {width}x{height}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }
}

/// Load state of one image source.
#[derive(Clone, Debug)]
pub enum AssetState {
    /// Requested but not decoded yet; layers render without it.
    Pending,
    /// Decoded and ready to composite.
    Ready(PreparedImage),
    /// Load or decode failed. The layer behaves as if it had no image.
    Failed(String),
}

/// Per-source image cache with an explicit pending state.
///
/// Renders may run before a source resolves; [`AssetStore::resolve_pending`] reports which sources
/// became ready so the caller can schedule a follow-up render.
#[derive(Debug, Default)]
pub struct AssetStore {
    root: Option<PathBuf>,
    entries: HashMap<String, AssetState>,
}

impl AssetStore {
    /// Store without a filesystem root; sources must be inserted as bytes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that resolves relative sources under `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            entries: HashMap::new(),
        }
    }

    /// Filesystem root, if any.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Mark `source` as wanted. Already-known sources keep their state.
    pub fn request(&mut self, source: &str) -> &AssetState {
        self.entries
            .entry(source.to_owned())
            .or_insert(AssetState::Pending)
    }

    /// Current state of `source`.
    pub fn state(&self, source: &str) -> Option<&AssetState> {
        self.entries.get(source)
    }

    /// Decoded image for `source`, when ready.
    pub fn get_ready(&self, source: &str) -> Option<&PreparedImage> {
        match self.entries.get(source) {
            Some(AssetState::Ready(img)) => Some(img),
            _ => None,
        }
    }

    /// Decode `bytes` as `source`. A decode failure is recorded as [`AssetState::Failed`] and
    /// returned to the caller.
    pub fn insert_bytes(&mut self, source: &str, bytes: &[u8]) -> PosterResult<()> {
        match decode_for_source(source, bytes) {
            Ok(img) => {
                debug!(source, width = img.width, height = img.height, "asset ready");
                self.entries
                    .insert(source.to_owned(), AssetState::Ready(img));
                Ok(())
            }
            Err(e) => {
                warn!(source, error = %e, "asset decode failed");
                self.entries
                    .insert(source.to_owned(), AssetState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Insert an already-prepared image.
    pub fn insert_prepared(&mut self, source: &str, image: PreparedImage) {
        self.entries
            .insert(source.to_owned(), AssetState::Ready(image));
    }

    /// Forget `source` so a later request reloads it.
    pub fn evict(&mut self, source: &str) {
        self.entries.remove(source);
    }

    /// Read and decode `source` from the store root.
    ///
    /// Returns `true` when the source is ready afterwards. Failures are logged and recorded, never
    /// raised.
    pub fn load(&mut self, source: &str) -> bool {
        if self.get_ready(source).is_some() {
            return true;
        }
        match self.read_bytes(source) {
            Ok(bytes) => self.insert_bytes(source, &bytes).is_ok(),
            Err(e) => {
                warn!(source, error = %e, "asset load failed");
                self.entries
                    .insert(source.to_owned(), AssetState::Failed(e.to_string()));
                false
            }
        }
    }

    /// Load every pending source. Returns the sources that became ready.
    pub fn resolve_pending(&mut self) -> Vec<String> {
        let mut pending: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, s)| matches!(s, AssetState::Pending))
            .map(|(k, _)| k.clone())
            .collect();
        pending.sort();

        pending.into_iter().filter(|s| self.load(s)).collect()
    }

    /// Number of sources still pending.
    pub fn pending_count(&self) -> usize {
        self.entries
            .values()
            .filter(|s| matches!(s, AssetState::Pending))
            .count()
    }

    fn read_bytes(&self, source: &str) -> PosterResult<Vec<u8>> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| PosterError::asset(format!("no asset root to load \"{source}\"")))?;
        let rel = normalize_rel_path(source)?;
        let path = root.join(rel);
        std::fs::read(&path)
            .map_err(|e| PosterError::asset(format!("read {}: {e}", path.display())))
    }
}

/// Normalize and validate store-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> PosterResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(PosterError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(PosterError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(PosterError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(PosterError::validation(
            "asset path must contain a file name",
        ));
    }

    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
