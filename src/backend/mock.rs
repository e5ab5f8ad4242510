//! Mock audio backend for testing without a platform player.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{AssetDescriptor, AudioBackend};
use crate::{BackendError, ResourceHandle, StreamCategory};

/// Length reported for every mock asset.
const MOCK_ASSET_LENGTH: u64 = 4096;

#[derive(Debug, Clone)]
enum MockAsset {
    Playable,
    FailCreate(String),
    FailPrepare(String),
    PanicOnCreate,
}

/// Observable state of one mock player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockHandleState {
    /// `prepare` has succeeded and the player has not been stopped since.
    pub prepared: bool,
    /// Audio is currently playing.
    pub playing: bool,
    /// `release` has been called.
    pub released: bool,
    /// Current playback position.
    pub position_ms: u32,
    /// Last applied `(left, right)` volume.
    pub volume: (f32, f32),
    /// Number of successful `start` calls.
    pub starts: u32,
    /// Number of successful `pause` calls.
    pub pauses: u32,
    /// Number of `seek_to` calls.
    pub seeks: u32,
    /// Number of successful `stop` calls.
    pub stops: u32,
}

#[derive(Default)]
struct MockInner {
    assets: Mutex<HashMap<PathBuf, MockAsset>>,
    handles: Mutex<Vec<(PathBuf, Arc<Mutex<MockHandleState>>)>>,
    prepare_delay: Mutex<Option<Duration>>,
    opens: AtomicUsize,
    open_descriptors: Arc<AtomicUsize>,
}

/// An in-memory [`AudioBackend`] that records every player it creates.
///
/// Assets are registered by their resolved path (asset root included).
/// Opening an unregistered path fails like a missing file would.
///
/// # Example
///
/// ```
/// use ui_sounds::MockBackend;
///
/// let backend = MockBackend::new();
/// backend.add_asset("www/click.mp3");
/// backend.fail_prepare("www/broken.mp3", "corrupt header");
///
/// assert_eq!(backend.open_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<MockInner>,
}

impl MockBackend {
    /// Creates a backend with no registered assets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a playable asset.
    pub fn add_asset(&self, path: impl Into<PathBuf>) {
        self.inner
            .assets
            .lock()
            .insert(path.into(), MockAsset::Playable);
    }

    /// Registers an asset whose player cannot be created.
    pub fn fail_create(&self, path: impl Into<PathBuf>, reason: impl Into<String>) {
        self.inner
            .assets
            .lock()
            .insert(path.into(), MockAsset::FailCreate(reason.into()));
    }

    /// Registers an asset whose player fails to prepare.
    pub fn fail_prepare(&self, path: impl Into<PathBuf>, reason: impl Into<String>) {
        self.inner
            .assets
            .lock()
            .insert(path.into(), MockAsset::FailPrepare(reason.into()));
    }

    /// Registers an asset whose player creation panics.
    pub fn panic_on_create(&self, path: impl Into<PathBuf>) {
        self.inner
            .assets
            .lock()
            .insert(path.into(), MockAsset::PanicOnCreate);
    }

    /// Makes every `prepare` block for the given duration.
    pub fn set_prepare_delay(&self, delay: Duration) {
        *self.inner.prepare_delay.lock() = Some(delay);
    }

    /// Returns how many times an asset was opened successfully.
    pub fn open_count(&self) -> usize {
        self.inner.opens.load(Ordering::SeqCst)
    }

    /// Returns how many asset descriptors are currently open.
    pub fn open_descriptors(&self) -> usize {
        self.inner.open_descriptors.load(Ordering::SeqCst)
    }

    /// Returns how many players were created.
    pub fn created_count(&self) -> usize {
        self.inner.handles.lock().len()
    }

    /// Returns snapshots of every player created for `path`, oldest first.
    pub fn handles(&self, path: impl AsRef<Path>) -> Vec<MockHandleState> {
        let path = path.as_ref();
        self.inner
            .handles
            .lock()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, state)| state.lock().clone())
            .collect()
    }

    /// Returns the most recently created player for `path`.
    pub fn latest_handle(&self, path: impl AsRef<Path>) -> Option<MockHandleState> {
        self.handles(path).pop()
    }
}

impl AudioBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn open_asset(&self, path: &Path) -> Result<AssetDescriptor, BackendError> {
        if !self.inner.assets.lock().contains_key(path) {
            return Err(BackendError::open_failed(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "asset not found"),
            ));
        }

        self.inner.opens.fetch_add(1, Ordering::SeqCst);
        self.inner.open_descriptors.fetch_add(1, Ordering::SeqCst);
        let open_descriptors = self.inner.open_descriptors.clone();

        Ok(
            AssetDescriptor::detached(path, MOCK_ASSET_LENGTH).on_close(move || {
                open_descriptors.fetch_sub(1, Ordering::SeqCst);
            }),
        )
    }

    fn create_player(
        &self,
        asset: &AssetDescriptor,
        _category: StreamCategory,
    ) -> Result<Box<dyn ResourceHandle>, BackendError> {
        let kind = self.inner.assets.lock().get(asset.path()).cloned();
        let fail_prepare = match kind {
            None => return Err(BackendError::create_failed("asset was never opened")),
            Some(MockAsset::FailCreate(reason)) => return Err(BackendError::create_failed(reason)),
            Some(MockAsset::PanicOnCreate) => {
                panic!("mock player creation panicked for {}", asset.path().display())
            }
            Some(MockAsset::FailPrepare(reason)) => Some(reason),
            Some(MockAsset::Playable) => None,
        };

        let state = Arc::new(Mutex::new(MockHandleState {
            volume: (1.0, 1.0),
            ..Default::default()
        }));
        self.inner
            .handles
            .lock()
            .push((asset.path().to_path_buf(), state.clone()));

        Ok(Box::new(MockHandle {
            state,
            fail_prepare,
            prepare_delay: *self.inner.prepare_delay.lock(),
        }))
    }
}

/// A player created by [`MockBackend`].
///
/// Follows a strict state machine: starting requires a prepared player,
/// and pausing or stopping a player that is not playing is an illegal state.
struct MockHandle {
    state: Arc<Mutex<MockHandleState>>,
    fail_prepare: Option<String>,
    prepare_delay: Option<Duration>,
}

impl MockHandle {
    fn live(&self) -> Result<parking_lot::MutexGuard<'_, MockHandleState>, BackendError> {
        let state = self.state.lock();
        if state.released {
            return Err(BackendError::Released);
        }
        Ok(state)
    }
}

impl ResourceHandle for MockHandle {
    fn prepare(&mut self) -> Result<(), BackendError> {
        if let Some(delay) = self.prepare_delay {
            std::thread::sleep(delay);
        }
        let mut state = self.live()?;
        if let Some(reason) = &self.fail_prepare {
            return Err(BackendError::prepare_failed(reason.clone()));
        }
        state.prepared = true;
        Ok(())
    }

    fn start(&mut self) -> Result<(), BackendError> {
        let mut state = self.live()?;
        if !state.prepared {
            return Err(BackendError::IllegalState {
                operation: "start",
                state: "unprepared",
            });
        }
        state.playing = true;
        state.starts += 1;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), BackendError> {
        let mut state = self.live()?;
        if !state.playing {
            return Err(BackendError::IllegalState {
                operation: "pause",
                state: "not playing",
            });
        }
        state.playing = false;
        state.pauses += 1;
        Ok(())
    }

    fn seek_to(&mut self, position_ms: u32) -> Result<(), BackendError> {
        let mut state = self.live()?;
        state.position_ms = position_ms;
        state.seeks += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        let mut state = self.live()?;
        if !state.playing {
            return Err(BackendError::IllegalState {
                operation: "stop",
                state: "not playing",
            });
        }
        state.playing = false;
        state.prepared = false;
        state.stops += 1;
        Ok(())
    }

    fn release(&mut self) {
        let mut state = self.state.lock();
        state.released = true;
        state.playing = false;
        state.prepared = false;
    }

    fn set_volume(&mut self, left: f32, right: f32) -> Result<(), BackendError> {
        let mut state = self.live()?;
        state.volume = (left, right);
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playing
    }
}
