//! The keyed sound registry.
//!
//! [`SoundCache`] owns every loaded [`ResourceHandle`] and implements the
//! preload, batch preload, play and unload commands.
//!
//! # Locking
//!
//! Each id hashes onto one of a fixed set of lock stripes. Every command
//! holds its id's stripe for the whole check-and-mutate sequence (including
//! the blocking load), so two commands on the same id never interleave while
//! commands on ids in different stripes run in parallel. The map itself is
//! only locked for short lookups, inserts and removals, and is never held
//! while acquiring a stripe.

use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::{
    AssetLoader, BackendError, CacheEvent, EventCallback, ResourceHandle, SoundError, SoundId,
    SoundResult,
};

/// Label recorded in a batch failure for a parameter that is not a usable id.
pub const INVALID_BATCH_ENTRY: &str = "invalid string";

type SharedHandle = Arc<Mutex<Box<dyn ResourceHandle>>>;

/// Successful outcome of a cache command.
///
/// The `Display` text is the message reported to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    /// A sound was loaded into the cache.
    Loaded {
        /// The loaded sound.
        id: SoundId,
    },
    /// Every entry of a batch is now loaded.
    BatchLoaded {
        /// Sounds loaded by this batch.
        loaded: usize,
        /// Sounds that were already loaded and skipped.
        skipped: usize,
    },
    /// Playback started from the beginning.
    Played {
        /// The sound being played.
        id: SoundId,
        /// `true` if the sound was loaded on demand.
        lazy_loaded: bool,
    },
    /// A sound was released and removed.
    Unloaded {
        /// The removed sound.
        id: SoundId,
    },
}

impl std::fmt::Display for CacheOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loaded { id } => write!(f, "'{id}' loaded"),
            Self::BatchLoaded { .. } => write!(f, "all assets loaded"),
            Self::Played {
                id,
                lazy_loaded: true,
            } => write!(
                f,
                "'{id}' loaded and playback started. Call preloadSound() first for lower-latency playback."
            ),
            Self::Played {
                id,
                lazy_loaded: false,
            } => write!(f, "'{id}' playback started"),
            Self::Unloaded { id } => write!(f, "'{id}' unloaded"),
        }
    }
}

/// Snapshot of cache activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Sounds currently in the cache.
    pub loaded: usize,
    /// Successful loads (explicit and on demand).
    pub loads: u64,
    /// Failed load attempts.
    pub load_failures: u64,
    /// Loads triggered by playing a sound that was not preloaded.
    pub lazy_loads: u64,
    /// Playbacks started.
    pub plays: u64,
    /// Sounds released (by unload or shutdown).
    pub unloads: u64,
}

#[derive(Default)]
struct CacheCounters {
    loads: AtomicU64,
    load_failures: AtomicU64,
    lazy_loads: AtomicU64,
    plays: AtomicU64,
    unloads: AtomicU64,
}

/// Process-scoped registry mapping [`SoundId`]s to prepared handles.
///
/// At most one handle exists per id, every handle in the registry is
/// prepared (or mid-playback), and a released handle is never reachable.
///
/// Create it once at host startup and call [`shutdown()`](Self::shutdown)
/// at host teardown to release every handle. Dropping the cache releases
/// whatever is still loaded.
///
/// Events are delivered after a command has released its locks, so an
/// event callback may call back into the cache.
pub struct SoundCache {
    loader: AssetLoader,
    entries: Mutex<HashMap<SoundId, SharedHandle>>,
    stripes: Box<[Mutex<()>]>,
    hasher: RandomState,
    closed: AtomicBool,
    counters: CacheCounters,
    event_callback: Option<EventCallback>,
}

impl SoundCache {
    /// Creates an empty cache.
    ///
    /// `lock_stripes` is clamped to at least 1.
    pub fn new(loader: AssetLoader, lock_stripes: usize) -> Self {
        let stripes = (0..lock_stripes.max(1)).map(|_| Mutex::new(())).collect();
        Self {
            loader,
            entries: Mutex::new(HashMap::new()),
            stripes,
            hasher: RandomState::new(),
            closed: AtomicBool::new(false),
            counters: CacheCounters::default(),
            event_callback: None,
        }
    }

    /// Sets the event callback.
    #[must_use]
    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    /// Returns the asset loader.
    pub fn loader(&self) -> &AssetLoader {
        &self.loader
    }

    /// Loads `id` into the cache.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `id` is empty
    /// - `AlreadyLoaded` if `id` is already cached (the cache is unchanged)
    /// - `LoadFailure` if the loader fails (the cache is unchanged)
    /// - `ShutDown` after [`shutdown()`](Self::shutdown)
    pub fn preload(&self, id: &SoundId) -> SoundResult<CacheOutcome> {
        validate_id(id)?;

        let mut events = Vec::new();
        let result = self.preload_locked(id, &mut events);
        self.emit_all(events);
        result
    }

    /// Loads every id in order, continuing past failures.
    ///
    /// `None` and empty ids count as failures. Ids that are already cached
    /// are skipped. Ids that loaded stay loaded even if others fail.
    ///
    /// # Errors
    ///
    /// Returns `BatchFailure` listing every failed entry in request order,
    /// or `ShutDown` after [`shutdown()`](Self::shutdown).
    pub fn preload_batch<I>(&self, ids: I) -> SoundResult<CacheOutcome>
    where
        I: IntoIterator<Item = Option<SoundId>>,
    {
        let mut events = Vec::new();
        let result = self.preload_batch_locked(ids, &mut events);
        self.emit_all(events);
        result
    }

    /// Plays `id` from the beginning at `volume`, loading it first if needed.
    ///
    /// A sound that is already playing is paused and rewound before it is
    /// restarted, so playback never overlaps itself. The range check runs on
    /// the full-precision `volume`; it is narrowed only when applied.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `id` is empty or `volume` is outside `0.0..=1.0`
    ///   (nothing is looked up or loaded)
    /// - `LoadFailure` if the on-demand load fails (no entry is created)
    /// - `Playback` if the platform rejects pause, seek, volume or start
    /// - `ShutDown` after [`shutdown()`](Self::shutdown)
    pub fn play(&self, id: &SoundId, volume: f64) -> SoundResult<CacheOutcome> {
        validate_id(id)?;
        if !(0.0..=1.0).contains(&volume) {
            return Err(SoundError::invalid_argument(format!(
                "volume must be >= 0.0 and <= 1.0 (got {volume})"
            )));
        }

        let mut events = Vec::new();
        let result = self.play_locked(id, volume as f32, &mut events);
        self.emit_all(events);
        result
    }

    /// Stops and releases `id`, then removes it from the cache.
    ///
    /// Stopping is best effort: a stop failure (for example on a sound that
    /// is not playing) is ignored and the handle is released regardless.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `id` is empty
    /// - `NotLoaded` if `id` is not cached (the cache is unchanged)
    /// - `ShutDown` after [`shutdown()`](Self::shutdown)
    pub fn unload(&self, id: &SoundId) -> SoundResult<CacheOutcome> {
        validate_id(id)?;

        let mut events = Vec::new();
        let result = self.unload_locked(id, &mut events);
        self.emit_all(events);
        result
    }

    /// Releases every handle, empties the cache and closes it.
    ///
    /// Waits for in-flight commands to finish first. Commands that run
    /// afterwards fail with `ShutDown` and never load anything. Returns the
    /// number of handles released.
    pub fn shutdown(&self) -> usize {
        let mut events = Vec::new();
        let released = {
            let _stripes: Vec<MutexGuard<'_, ()>> = self
                .stripes
                .iter()
                .map(|stripe| stripe.lock())
                .collect();
            self.closed.store(true, Ordering::SeqCst);
            self.release_all(&mut events)
        };
        self.emit_all(events);
        released
    }

    /// Returns `true` once [`shutdown()`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Returns `true` if `id` is cached.
    pub fn is_loaded(&self, id: &SoundId) -> bool {
        self.entries.lock().contains_key(id)
    }

    /// Returns the number of cached sounds.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Returns the cached ids in sorted order.
    pub fn loaded_ids(&self) -> Vec<SoundId> {
        let mut ids: Vec<SoundId> = self.entries.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            loaded: self.len(),
            loads: self.counters.loads.load(Ordering::SeqCst),
            load_failures: self.counters.load_failures.load(Ordering::SeqCst),
            lazy_loads: self.counters.lazy_loads.load(Ordering::SeqCst),
            plays: self.counters.plays.load(Ordering::SeqCst),
            unloads: self.counters.unloads.load(Ordering::SeqCst),
        }
    }

    fn preload_locked(
        &self,
        id: &SoundId,
        events: &mut Vec<CacheEvent>,
    ) -> SoundResult<CacheOutcome> {
        let _stripe = self.stripe(id)?;

        if self.entries.lock().contains_key(id) {
            return Err(SoundError::AlreadyLoaded { id: id.clone() });
        }
        self.load_locked(id, events)?;

        Ok(CacheOutcome::Loaded { id: id.clone() })
    }

    fn preload_batch_locked<I>(
        &self,
        ids: I,
        events: &mut Vec<CacheEvent>,
    ) -> SoundResult<CacheOutcome>
    where
        I: IntoIterator<Item = Option<SoundId>>,
    {
        let mut failed = Vec::new();
        let mut loaded = 0;
        let mut skipped = 0;

        for id in ids {
            let Some(id) = id.filter(|id| !id.is_empty()) else {
                failed.push(INVALID_BATCH_ENTRY.to_string());
                continue;
            };

            let _stripe = self.stripe(&id)?;
            if self.entries.lock().contains_key(&id) {
                skipped += 1;
                continue;
            }
            match self.load_locked(&id, events) {
                Ok(()) => loaded += 1,
                Err(_) => failed.push(id.to_string()),
            }
        }

        if failed.is_empty() {
            Ok(CacheOutcome::BatchLoaded { loaded, skipped })
        } else {
            Err(SoundError::BatchFailure { failed })
        }
    }

    fn play_locked(
        &self,
        id: &SoundId,
        volume: f32,
        events: &mut Vec<CacheEvent>,
    ) -> SoundResult<CacheOutcome> {
        let _stripe = self.stripe(id)?;
        let mut lazy_loaded = false;
        let handle = if let Some(handle) = self.lookup(id) {
            handle
        } else {
            self.load_locked(id, events)?;
            lazy_loaded = true;
            self.counters.lazy_loads.fetch_add(1, Ordering::SeqCst);
            self.lookup(id).ok_or_else(|| {
                SoundError::Unexpected(format!("no handle for '{id}' after loading"))
            })?
        };

        restart(&mut **handle.lock(), volume).map_err(|e| SoundError::playback(id, e))?;

        self.counters.plays.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("playing '{}' at volume {} (lazy: {})", id, volume, lazy_loaded);
        events.push(CacheEvent::PlaybackStarted {
            id: id.clone(),
            volume,
            lazy_loaded,
        });

        Ok(CacheOutcome::Played {
            id: id.clone(),
            lazy_loaded,
        })
    }

    fn unload_locked(
        &self,
        id: &SoundId,
        events: &mut Vec<CacheEvent>,
    ) -> SoundResult<CacheOutcome> {
        let _stripe = self.stripe(id)?;

        let Some(handle) = self.lookup(id) else {
            return Err(SoundError::NotLoaded { id: id.clone() });
        };

        // Other commands on this id wait on the stripe, so nobody observes
        // the released handle before it is removed.
        self.stop_and_release(id, &mut **handle.lock(), events);
        self.entries.lock().remove(id);

        tracing::info!("unloaded '{}'", id);
        Ok(CacheOutcome::Unloaded { id: id.clone() })
    }

    /// Locks the stripe for `id`. Fails once the cache is shut down.
    fn stripe(&self, id: &SoundId) -> SoundResult<MutexGuard<'_, ()>> {
        let index = self.hasher.hash_one(id) % self.stripes.len() as u64;
        let guard = self.stripes[index as usize].lock();
        if self.closed.load(Ordering::SeqCst) {
            return Err(SoundError::ShutDown);
        }
        Ok(guard)
    }

    fn lookup(&self, id: &SoundId) -> Option<SharedHandle> {
        self.entries.lock().get(id).cloned()
    }

    /// Loads `id` and inserts it. The caller holds the id's stripe.
    fn load_locked(&self, id: &SoundId, events: &mut Vec<CacheEvent>) -> SoundResult<()> {
        match self.loader.load(id) {
            Ok(handle) => {
                self.entries
                    .lock()
                    .insert(id.clone(), Arc::new(Mutex::new(handle)));
                self.counters.loads.fetch_add(1, Ordering::SeqCst);
                tracing::info!("loaded '{}'", id);
                events.push(CacheEvent::SoundLoaded { id: id.clone() });
                Ok(())
            }
            Err(e) => {
                self.counters.load_failures.fetch_add(1, Ordering::SeqCst);
                tracing::warn!("failed to load '{}': {}", id, e);
                events.push(CacheEvent::LoadFailed {
                    id: id.clone(),
                    diagnostic: e.to_string(),
                });
                Err(SoundError::load_failure(id, e))
            }
        }
    }

    /// Drains the registry, stopping and releasing every handle.
    fn release_all(&self, events: &mut Vec<CacheEvent>) -> usize {
        let drained: Vec<(SoundId, SharedHandle)> = self.entries.lock().drain().collect();

        for (id, handle) in &drained {
            self.stop_and_release(id, &mut **handle.lock(), events);
        }

        if !drained.is_empty() {
            tracing::info!("released {} cached sounds", drained.len());
        }
        drained.len()
    }

    fn stop_and_release(
        &self,
        id: &SoundId,
        handle: &mut dyn ResourceHandle,
        events: &mut Vec<CacheEvent>,
    ) {
        if let Err(e) = handle.stop() {
            tracing::debug!("ignoring stop failure for '{}': {}", id, e);
            events.push(CacheEvent::StopIgnored {
                id: id.clone(),
                error: e.to_string(),
            });
        }
        handle.release();

        self.counters.unloads.fetch_add(1, Ordering::SeqCst);
        events.push(CacheEvent::SoundUnloaded { id: id.clone() });
    }

    /// Delivers events. Must not be called while a stripe is held.
    fn emit_all(&self, events: Vec<CacheEvent>) {
        if let Some(ref callback) = self.event_callback {
            for event in events {
                callback(event);
            }
        }
    }
}

impl Drop for SoundCache {
    fn drop(&mut self) {
        let mut events = Vec::new();
        let released = self.release_all(&mut events);
        if released > 0 {
            tracing::debug!("sound cache dropped with {} sounds loaded", released);
        }
        self.emit_all(events);
    }
}

impl std::fmt::Debug for SoundCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundCache")
            .field("loaded", &self.len())
            .field("stripes", &self.stripes.len())
            .finish_non_exhaustive()
    }
}

fn validate_id(id: &SoundId) -> SoundResult<()> {
    if id.is_empty() {
        return Err(SoundError::invalid_argument(
            "sound id must be a non-empty string",
        ));
    }
    Ok(())
}

/// Rewinds a playing handle, applies the volume to both channels and starts it.
fn restart(handle: &mut dyn ResourceHandle, volume: f32) -> Result<(), BackendError> {
    if handle.is_playing() {
        handle.pause()?;
        handle.seek_to(0)?;
    }
    handle.set_volume(volume, volume)?;
    handle.start()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{event_callback, CacheConfig, MockBackend};
    use std::sync::{OnceLock, Weak};
    use std::time::Duration;

    fn cache(backend: &MockBackend) -> SoundCache {
        let loader = AssetLoader::new(Arc::new(backend.clone()), &CacheConfig::default());
        SoundCache::new(loader, 4)
    }

    fn backend_with(assets: &[&str]) -> MockBackend {
        let backend = MockBackend::new();
        for asset in assets {
            backend.add_asset(format!("www/{asset}"));
        }
        backend
    }

    #[test]
    fn test_preload_inserts_entry() {
        let backend = backend_with(&["a.mp3"]);
        let cache = cache(&backend);

        let outcome = cache.preload(&SoundId::new("a.mp3")).unwrap();
        assert_eq!(outcome.to_string(), "'a.mp3' loaded");
        assert!(cache.is_loaded(&SoundId::new("a.mp3")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_preload_twice_is_already_loaded() {
        let backend = backend_with(&["a.mp3"]);
        let cache = cache(&backend);
        let id = SoundId::new("a.mp3");

        cache.preload(&id).unwrap();
        let err = cache.preload(&id).unwrap_err();

        assert_eq!(err, SoundError::AlreadyLoaded { id });
        assert_eq!(cache.len(), 1);
        assert_eq!(backend.created_count(), 1);
    }

    #[test]
    fn test_preload_failure_leaves_cache_unchanged() {
        let backend = MockBackend::new();
        backend.fail_prepare("www/bad.mp3", "corrupt");
        let cache = cache(&backend);

        let err = cache.preload(&SoundId::new("bad.mp3")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "error while attempting to load 'bad.mp3' - prepare failed: corrupt"
        );
        assert!(cache.is_empty());
        assert_eq!(cache.stats().load_failures, 1);
    }

    #[test]
    fn test_preload_empty_id_is_invalid() {
        let cache = cache(&MockBackend::new());
        let err = cache.preload(&SoundId::new("")).unwrap_err();
        assert!(matches!(err, SoundError::InvalidArgument { .. }));
    }

    #[test]
    fn test_batch_partial_failure() {
        let backend = backend_with(&["a", "c"]);
        backend.fail_prepare("www/b", "corrupt");
        let cache = cache(&backend);

        let ids = ["a", "b", "c"].map(|id| Some(SoundId::new(id)));
        let err = cache.preload_batch(ids).unwrap_err();

        assert_eq!(
            err,
            SoundError::BatchFailure {
                failed: vec!["b".to_string()]
            }
        );
        assert_eq!(cache.loaded_ids(), vec![SoundId::new("a"), SoundId::new("c")]);
    }

    #[test]
    fn test_batch_reports_every_failure_in_order() {
        let backend = backend_with(&["ok"]);
        let cache = cache(&backend);

        let ids = vec![
            Some(SoundId::new("missing-1")),
            None,
            Some(SoundId::new("ok")),
            Some(SoundId::new("missing-2")),
        ];
        let err = cache.preload_batch(ids).unwrap_err();

        assert_eq!(
            err.to_string(),
            "failed to load assets - 'missing-1', 'invalid string', 'missing-2'"
        );
        assert!(cache.is_loaded(&SoundId::new("ok")));
    }

    #[test]
    fn test_batch_skips_loaded_ids() {
        let backend = backend_with(&["a", "b"]);
        let cache = cache(&backend);
        cache.preload(&SoundId::new("a")).unwrap();

        let outcome = cache
            .preload_batch(["a", "b"].map(|id| Some(SoundId::new(id))))
            .unwrap();

        assert_eq!(
            outcome,
            CacheOutcome::BatchLoaded {
                loaded: 1,
                skipped: 1
            }
        );
        assert_eq!(outcome.to_string(), "all assets loaded");
        assert_eq!(backend.created_count(), 2);
    }

    #[test]
    fn test_empty_batch_succeeds() {
        let cache = cache(&MockBackend::new());
        assert!(cache.preload_batch(Vec::new()).is_ok());
    }

    #[test]
    fn test_play_lazy_loads() {
        let backend = backend_with(&["a.mp3"]);
        let cache = cache(&backend);

        let outcome = cache.play(&SoundId::new("a.mp3"), 0.5).unwrap();

        assert_eq!(
            outcome,
            CacheOutcome::Played {
                id: SoundId::new("a.mp3"),
                lazy_loaded: true
            }
        );
        assert!(outcome.to_string().contains("Call preloadSound() first"));
        let state = backend.latest_handle("www/a.mp3").unwrap();
        assert!(state.playing);
        assert_eq!(state.volume, (0.5, 0.5));
        assert_eq!(cache.stats().lazy_loads, 1);
    }

    #[test]
    fn test_play_preloaded_message() {
        let backend = backend_with(&["a.mp3"]);
        let cache = cache(&backend);
        let id = SoundId::new("a.mp3");
        cache.preload(&id).unwrap();

        let outcome = cache.play(&id, 1.0).unwrap();
        assert_eq!(outcome.to_string(), "'a.mp3' playback started");
    }

    #[test]
    fn test_play_lazy_load_failure_creates_no_entry() {
        let backend = MockBackend::new();
        let cache = cache(&backend);
        let id = SoundId::new("missing.mp3");

        let play_err = cache.play(&id, 1.0).unwrap_err();
        let preload_err = cache.preload(&id).unwrap_err();

        assert_eq!(play_err, preload_err);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_play_rejects_out_of_range_volume() {
        let backend = backend_with(&["a.mp3"]);
        let cache = cache(&backend);
        let id = SoundId::new("a.mp3");

        for volume in [-0.1, 1.1, f64::NAN, 1.000_000_01, -1e-50] {
            let err = cache.play(&id, volume).unwrap_err();
            assert!(matches!(err, SoundError::InvalidArgument { .. }));
        }
        assert!(cache.is_empty());
        assert_eq!(backend.open_count(), 0);
    }

    #[test]
    fn test_play_accepts_volume_bounds() {
        let backend = backend_with(&["a.mp3"]);
        let cache = cache(&backend);
        let id = SoundId::new("a.mp3");

        cache.play(&id, 0.0).unwrap();
        cache.play(&id, 1.0).unwrap();
        assert_eq!(backend.latest_handle("www/a.mp3").unwrap().volume, (1.0, 1.0));
    }

    #[test]
    fn test_play_twice_restarts_from_zero() {
        let backend = backend_with(&["a.mp3"]);
        let cache = cache(&backend);
        let id = SoundId::new("a.mp3");

        cache.play(&id, 1.0).unwrap();
        cache.play(&id, 0.8).unwrap();

        let handles = backend.handles("www/a.mp3");
        assert_eq!(handles.len(), 1);
        let state = &handles[0];
        assert!(state.playing);
        assert_eq!(state.starts, 2);
        assert_eq!(state.pauses, 1);
        assert_eq!(state.seeks, 1);
        assert_eq!(state.position_ms, 0);
        assert_eq!(state.volume, (0.8, 0.8));
    }

    #[test]
    fn test_unload_releases_and_removes() {
        let backend = backend_with(&["a.mp3"]);
        let cache = cache(&backend);
        let id = SoundId::new("a.mp3");
        cache.play(&id, 1.0).unwrap();

        let outcome = cache.unload(&id).unwrap();

        assert_eq!(outcome.to_string(), "'a.mp3' unloaded");
        assert!(!cache.is_loaded(&id));
        let state = backend.latest_handle("www/a.mp3").unwrap();
        assert!(state.released);
        assert_eq!(state.stops, 1);
    }

    #[test]
    fn test_unload_tolerates_stop_failure() {
        let backend = backend_with(&["a.mp3"]);
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        let cache = cache(&backend).with_event_callback(event_callback(move |event| {
            events_clone.lock().push(event);
        }));
        let id = SoundId::new("a.mp3");
        cache.preload(&id).unwrap();

        // Not playing, so the mock rejects stop().
        cache.unload(&id).unwrap();

        assert!(backend.latest_handle("www/a.mp3").unwrap().released);
        let events = events.lock();
        assert!(events
            .iter()
            .any(|e| matches!(e, CacheEvent::StopIgnored { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, CacheEvent::SoundUnloaded { .. })));
    }

    #[test]
    fn test_unload_not_loaded() {
        let cache = cache(&MockBackend::new());
        let id = SoundId::new("a.mp3");

        let err = cache.unload(&id).unwrap_err();
        assert_eq!(err.to_string(), "'a.mp3' is not loaded, cannot be unloaded");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unload_twice() {
        let backend = backend_with(&["a.mp3"]);
        let cache = cache(&backend);
        let id = SoundId::new("a.mp3");
        cache.preload(&id).unwrap();

        cache.unload(&id).unwrap();
        let err = cache.unload(&id).unwrap_err();
        assert_eq!(err, SoundError::NotLoaded { id });
    }

    #[test]
    fn test_reload_after_unload_creates_fresh_handle() {
        let backend = backend_with(&["a.mp3"]);
        let cache = cache(&backend);
        let id = SoundId::new("a.mp3");

        cache.preload(&id).unwrap();
        cache.unload(&id).unwrap();
        cache.play(&id, 1.0).unwrap();

        let handles = backend.handles("www/a.mp3");
        assert_eq!(handles.len(), 2);
        assert!(handles[0].released);
        assert!(handles[1].playing && !handles[1].released);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let backend = backend_with(&["a", "b"]);
        let cache = cache(&backend);
        cache.preload(&SoundId::new("a")).unwrap();
        cache.play(&SoundId::new("b"), 1.0).unwrap();

        assert_eq!(cache.shutdown(), 2);

        assert!(cache.is_empty());
        assert!(backend.latest_handle("www/a").unwrap().released);
        assert!(backend.latest_handle("www/b").unwrap().released);
        assert_eq!(cache.shutdown(), 0);
    }

    #[test]
    fn test_commands_after_shutdown_never_load() {
        let backend = backend_with(&["a", "b"]);
        let cache = cache(&backend);
        cache.preload(&SoundId::new("a")).unwrap();
        cache.shutdown();

        let id = SoundId::new("b");
        assert_eq!(cache.play(&id, 1.0).unwrap_err(), SoundError::ShutDown);
        assert_eq!(cache.preload(&id).unwrap_err(), SoundError::ShutDown);
        assert_eq!(
            cache.preload_batch(vec![Some(id.clone())]).unwrap_err(),
            SoundError::ShutDown
        );
        assert_eq!(cache.unload(&SoundId::new("a")).unwrap_err(), SoundError::ShutDown);

        assert!(cache.is_shut_down());
        assert!(cache.is_empty());
        assert_eq!(backend.open_count(), 1);
    }

    #[test]
    fn test_drop_releases_remaining_handles() {
        let backend = backend_with(&["a", "b"]);
        let cache = cache(&backend);
        cache.preload(&SoundId::new("a")).unwrap();
        cache.play(&SoundId::new("b"), 1.0).unwrap();

        drop(cache);

        assert!(backend.latest_handle("www/a").unwrap().released);
        let b = backend.latest_handle("www/b").unwrap();
        assert!(b.released);
        assert!(!b.playing);
    }

    #[test]
    fn test_event_callback_can_call_back_into_cache() {
        let backend = backend_with(&["a"]);
        let loader = AssetLoader::new(Arc::new(backend.clone()), &CacheConfig::default());
        let slot: Arc<OnceLock<Weak<SoundCache>>> = Arc::new(OnceLock::new());
        let hook = slot.clone();

        // A single stripe: every id shares the lock the command holds.
        let cache = Arc::new(SoundCache::new(loader, 1).with_event_callback(event_callback(
            move |event| {
                if let CacheEvent::SoundLoaded { id } = event {
                    if let Some(cache) = hook.get().and_then(Weak::upgrade) {
                        cache.play(&id, 0.5).unwrap();
                    }
                }
            },
        )));
        slot.set(Arc::downgrade(&cache)).unwrap();

        cache.preload(&SoundId::new("a")).unwrap();

        let state = backend.latest_handle("www/a").unwrap();
        assert!(state.playing);
        assert_eq!(state.volume, (0.5, 0.5));
    }

    #[test]
    fn test_stats() {
        let backend = backend_with(&["a"]);
        let cache = cache(&backend);
        let id = SoundId::new("a");

        cache.play(&id, 1.0).unwrap();
        cache.play(&id, 1.0).unwrap();
        let _ = cache.preload(&SoundId::new("missing"));
        cache.unload(&id).unwrap();

        assert_eq!(
            cache.stats(),
            CacheStats {
                loaded: 0,
                loads: 1,
                load_failures: 1,
                lazy_loads: 1,
                plays: 2,
                unloads: 1,
            }
        );
    }

    #[test]
    fn test_concurrent_preload_unload_never_exposes_released_handle() {
        let backend = backend_with(&["a.mp3"]);
        backend.set_prepare_delay(Duration::from_millis(1));
        let cache = cache(&backend);
        let id = SoundId::new("a.mp3");

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for _ in 0..50 {
                    let _ = cache.preload(&id);
                }
            });
            scope.spawn(|| {
                for _ in 0..50 {
                    let _ = cache.unload(&id);
                }
            });
            scope.spawn(|| {
                for _ in 0..50 {
                    cache.play(&id, 1.0).unwrap();
                }
            });
        });

        cache.play(&id, 1.0).unwrap();
        let handles = backend.handles("www/a.mp3");
        assert_eq!(handles.iter().filter(|h| !h.released).count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_ids_load_in_parallel() {
        let backend = backend_with(&["a", "b", "c", "d"]);
        let cache = cache(&backend);

        std::thread::scope(|scope| {
            for id in ["a", "b", "c", "d"] {
                let cache = &cache;
                scope.spawn(move || cache.preload(&SoundId::new(id)).unwrap());
            }
        });

        assert_eq!(cache.len(), 4);
    }
}
