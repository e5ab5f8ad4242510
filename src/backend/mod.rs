//! Audio backend abstraction.
//!
//! An [`AudioBackend`] is the platform capability that turns a resolved asset
//! location into a playable [`ResourceHandle`]. The crate ships with:
//!
//! - A default [`AudioBackend::open_asset`] that opens assets from the filesystem
//! - [`MockBackend`]: an in-memory backend for tests and demos
//!
//! Implement [`AudioBackend`] to plug in a real platform player.

mod mock;

pub use mock::{MockBackend, MockHandleState};

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::{BackendError, ResourceHandle, StreamCategory};

/// An opened asset, ready to be handed to a player.
///
/// The descriptor owns whatever the backend opened (a file, a platform
/// asset descriptor). Dropping it closes that resource, so the loader only
/// needs to keep it in scope while the player is created.
pub struct AssetDescriptor {
    path: PathBuf,
    start_offset: u64,
    length: u64,
    file: Option<File>,
    on_close: Option<Box<dyn FnOnce() + Send>>,
}

impl AssetDescriptor {
    /// Opens an asset from the filesystem.
    ///
    /// # Errors
    ///
    /// Returns `OpenFailed` if the file cannot be opened or inspected.
    pub fn open(path: &Path) -> Result<Self, BackendError> {
        let file = File::open(path).map_err(|e| BackendError::open_failed(path, e))?;
        let metadata = file
            .metadata()
            .map_err(|e| BackendError::open_failed(path, e))?;
        if !metadata.is_file() {
            return Err(BackendError::open_failed(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        Ok(Self {
            path: path.to_path_buf(),
            start_offset: 0,
            length: metadata.len(),
            file: Some(file),
            on_close: None,
        })
    }

    /// Creates a descriptor that is not backed by an open file.
    ///
    /// Useful for backends that address assets by path or by their own
    /// handles.
    pub fn detached(path: impl Into<PathBuf>, length: u64) -> Self {
        Self {
            path: path.into(),
            start_offset: 0,
            length,
            file: None,
            on_close: None,
        }
    }

    /// Restricts the descriptor to a byte range inside the asset.
    #[must_use]
    pub fn with_range(mut self, start_offset: u64, length: u64) -> Self {
        self.start_offset = start_offset;
        self.length = length;
        self
    }

    /// Registers a hook that runs when the descriptor is closed.
    #[must_use]
    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_close = Some(Box::new(f));
        self
    }

    /// Returns the resolved asset location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the byte offset of the audio data.
    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    /// Returns the length of the audio data in bytes.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Returns the open file, if the descriptor is file-backed.
    pub fn file(&self) -> Option<&File> {
        self.file.as_ref()
    }
}

impl std::fmt::Debug for AssetDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetDescriptor")
            .field("path", &self.path)
            .field("start_offset", &self.start_offset)
            .field("length", &self.length)
            .field("file_backed", &self.file.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for AssetDescriptor {
    fn drop(&mut self) {
        // The file (if any) closes when the field drops.
        if let Some(on_close) = self.on_close.take() {
            on_close();
        }
    }
}

/// A platform that can open assets and create players for them.
///
/// # Example
///
/// ```
/// use ui_sounds::{AssetDescriptor, AudioBackend, BackendError, ResourceHandle, StreamCategory};
///
/// struct NullBackend;
///
/// impl AudioBackend for NullBackend {
///     fn name(&self) -> &str {
///         "null"
///     }
///
///     fn create_player(
///         &self,
///         asset: &AssetDescriptor,
///         _category: StreamCategory,
///     ) -> Result<Box<dyn ResourceHandle>, BackendError> {
///         Err(BackendError::create_failed(format!(
///             "no player for {}",
///             asset.path().display()
///         )))
///     }
/// }
/// ```
pub trait AudioBackend: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Opens the asset at `path`.
    ///
    /// Default implementation opens the path from the local filesystem.
    fn open_asset(&self, path: &Path) -> Result<AssetDescriptor, BackendError> {
        AssetDescriptor::open(path)
    }

    /// Creates an unprepared player for an opened asset.
    fn create_player(
        &self,
        asset: &AssetDescriptor,
        category: StreamCategory,
    ) -> Result<Box<dyn ResourceHandle>, BackendError>;
}
