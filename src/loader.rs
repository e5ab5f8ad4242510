//! Asset loader: resolves sound ids and prepares players.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use crate::{AudioBackend, BackendError, CacheConfig, ResourceHandle, SoundId, StreamCategory};

/// Resolves a [`SoundId`] to an asset and produces a prepared handle.
///
/// The asset location is the configured root and the id joined with `/`;
/// the id is appended as-is, without normalization.
pub struct AssetLoader {
    asset_root: PathBuf,
    category: StreamCategory,
    backend: Arc<dyn AudioBackend>,
}

impl AssetLoader {
    /// Creates a loader for the given backend and configuration.
    pub fn new(backend: Arc<dyn AudioBackend>, config: &CacheConfig) -> Self {
        Self {
            asset_root: config.asset_root.clone(),
            category: config.stream_category,
            backend,
        }
    }

    /// Returns the backend used to open assets.
    pub fn backend(&self) -> &Arc<dyn AudioBackend> {
        &self.backend
    }

    /// Returns the asset location for `id`.
    pub fn resolve(&self, id: &SoundId) -> PathBuf {
        let mut location = OsString::from(self.asset_root.as_os_str());
        if !location.is_empty() && !location.to_string_lossy().ends_with('/') {
            location.push("/");
        }
        location.push(id.as_str());
        PathBuf::from(location)
    }

    /// Opens, creates and prepares a player for `id`.
    ///
    /// Blocks until the player is prepared. The opened asset is closed on
    /// every path, and a player that fails to prepare is released before the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns the backend error from whichever step failed.
    pub fn load(&self, id: &SoundId) -> Result<Box<dyn ResourceHandle>, BackendError> {
        let path = self.resolve(id);
        let asset = self.backend.open_asset(&path)?;
        let mut handle = self.backend.create_player(&asset, self.category)?;

        if let Err(e) = handle.prepare() {
            handle.release();
            return Err(e);
        }

        tracing::debug!(
            "prepared '{}' from {} ({} bytes, backend: {})",
            id,
            path.display(),
            asset.length(),
            self.backend.name()
        );
        Ok(handle)
    }
}
