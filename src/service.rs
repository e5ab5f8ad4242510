//! Host-facing sound service.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::{
    CacheStats, CommandDispatcher, CommandResult, Dispatch, Params, ResultCallback, SoundCache,
};

/// Handle to a running sound service.
///
/// The `SoundService` is returned by [`UiSoundsBuilder::build()`] and owns the
/// process-wide [`SoundCache`] together with the dispatcher that feeds it.
///
/// # Lifecycle
///
/// 1. Created by [`UiSoundsBuilder::build()`] with an empty cache
/// 2. Host commands arrive through [`execute()`](SoundService::execute)
/// 3. Call [`shutdown()`](SoundService::shutdown) at host teardown to release every sound;
///    commands still queued then report an error instead of loading
/// 4. Dropping the `SoundService` also releases everything (but prefer explicit `shutdown()`)
///
/// # Example
///
/// ```no_run
/// use ui_sounds::{result_callback, MockBackend, Params, UiSounds};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let service = UiSounds::builder().backend(MockBackend::new()).build()?;
///
/// service.execute(
///     "playSound",
///     Params::from_json(r#"["sounds/click.mp3", 0.5]"#)?,
///     result_callback(|result| println!("{result}")),
/// );
///
/// service.shutdown();
/// # Ok(())
/// # }
/// ```
///
/// [`UiSoundsBuilder::build()`]: crate::UiSoundsBuilder::build
pub struct SoundService {
    cache: Arc<SoundCache>,
    dispatcher: CommandDispatcher,
    running: AtomicBool,
}

impl SoundService {
    pub(crate) fn new(cache: Arc<SoundCache>, dispatcher: CommandDispatcher) -> Self {
        Self {
            cache,
            dispatcher,
            running: AtomicBool::new(true),
        }
    }

    /// Schedules a host command.
    ///
    /// See [`CommandDispatcher::execute`].
    pub fn execute(&self, action: &str, params: Params, callback: ResultCallback) -> Dispatch {
        self.dispatcher.execute(action, params, callback)
    }

    /// Schedules a host command and returns a future of its result.
    ///
    /// Returns `None` for unknown actions.
    pub fn submit(
        &self,
        action: &str,
        params: Params,
    ) -> Option<impl Future<Output = CommandResult> + Send + 'static> {
        self.dispatcher.submit(action, params)
    }

    /// Returns the sound cache for direct, synchronous use.
    pub fn cache(&self) -> &Arc<SoundCache> {
        &self.cache
    }

    /// Returns the command dispatcher.
    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Returns `true` until the service has been shut down.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Releases every cached sound and stops the service.
    ///
    /// Waits for commands currently touching the cache to finish. Returns the
    /// number of sounds released.
    pub fn shutdown(mut self) -> usize {
        self.shutdown_internal()
    }

    fn shutdown_internal(&mut self) -> usize {
        if !self.running.swap(false, Ordering::SeqCst) {
            // Already shut down
            return 0;
        }

        let released = self.cache.shutdown();
        tracing::info!("sound service stopped ({} sounds released)", released);
        released
    }
}

impl Drop for SoundService {
    fn drop(&mut self) {
        if self.is_running() {
            tracing::debug!("sound service dropped without shutdown()");
            self.shutdown_internal();
        }
    }
}

impl std::fmt::Debug for SoundService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundService")
            .field("cache", &self.cache)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MockBackend, SoundId, UiSounds};
    use serde_json::json;

    #[tokio::test]
    async fn test_shutdown_releases_sounds() {
        let backend = MockBackend::new();
        backend.add_asset("www/a.mp3");
        let service = UiSounds::builder().backend(backend.clone()).build().unwrap();

        let result = service
            .submit("preloadSound", Params::new(vec![json!("a.mp3")]))
            .unwrap()
            .await;
        assert!(result.is_ok());

        assert_eq!(service.shutdown(), 1);
        assert!(backend.latest_handle("www/a.mp3").unwrap().released);
    }

    #[tokio::test]
    async fn test_drop_releases_sounds() {
        let backend = MockBackend::new();
        backend.add_asset("www/a.mp3");
        let service = UiSounds::builder().backend(backend.clone()).build().unwrap();
        let cache = service.cache().clone();

        cache.preload(&SoundId::new("a.mp3")).unwrap();
        drop(service);

        assert!(cache.is_empty());
        assert!(backend.latest_handle("www/a.mp3").unwrap().released);
    }

    #[tokio::test]
    async fn test_stats_reflect_commands() {
        let backend = MockBackend::new();
        backend.add_asset("www/a.mp3");
        let service = UiSounds::builder().backend(backend).build().unwrap();

        service
            .submit("playSound", Params::new(vec![json!("a.mp3")]))
            .unwrap()
            .await;

        let stats = service.stats();
        assert_eq!(stats.loaded, 1);
        assert_eq!(stats.lazy_loads, 1);
        assert_eq!(stats.plays, 1);
    }
}
