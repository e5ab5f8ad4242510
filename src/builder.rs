//! Builder pattern for `UiSounds`.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::{
    event_callback, AssetLoader, AudioBackend, CacheConfig, CacheEvent, CommandDispatcher,
    EventCallback, SoundCache, SoundService, UiSoundsError,
};

/// Entry point for configuring the sound service.
///
/// Use [`UiSounds::builder()`] to create a builder.
#[derive(Debug, Clone, Copy)]
pub struct UiSounds;

impl UiSounds {
    /// Creates a new builder with default settings.
    pub fn builder() -> UiSoundsBuilder {
        UiSoundsBuilder::new()
    }
}

/// Builder for configuring and starting the sound service.
///
/// # Example
///
/// ```no_run
/// use ui_sounds::{MockBackend, UiSounds};
///
/// # async fn run() -> Result<(), ui_sounds::UiSoundsError> {
/// let service = UiSounds::builder()
///     .backend(MockBackend::new())
///     .asset_root("www")
///     .on_event(|event| tracing::debug!(?event, "cache event"))
///     .build()?;
///
/// service.shutdown();
/// # Ok(())
/// # }
/// ```
#[must_use]
pub struct UiSoundsBuilder {
    backend: Option<Arc<dyn AudioBackend>>,
    config: CacheConfig,
    event_callback: Option<EventCallback>,
    runtime: Option<Handle>,
}

impl Default for UiSoundsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl UiSoundsBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            backend: None,
            config: CacheConfig::default(),
            event_callback: None,
            runtime: None,
        }
    }

    /// Set the platform backend that opens assets and creates players.
    pub fn backend<B: AudioBackend + 'static>(mut self, backend: B) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    /// Set a backend that is shared with other owners.
    pub fn shared_backend(mut self, backend: Arc<dyn AudioBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the prefix that sound ids are resolved against.
    ///
    /// Default: `www`
    pub fn asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.asset_root = root.into();
        self
    }

    /// Set the number of per-id lock stripes.
    ///
    /// Default: 16
    pub fn lock_stripes(mut self, stripes: usize) -> Self {
        self.config.lock_stripes = stripes;
        self
    }

    /// Set the volume used when `playSound` omits it.
    ///
    /// Default: 1.0
    pub fn default_volume(mut self, volume: f32) -> Self {
        self.config.default_volume = volume;
        self
    }

    /// Set the whole cache configuration.
    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Set a callback to receive cache events.
    ///
    /// Events are delivered after the command that raised them has released
    /// its locks, so the callback may issue further cache commands.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(CacheEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(event_callback(callback));
        self
    }

    /// Set the runtime whose blocking pool runs commands.
    ///
    /// Default: the runtime `build()` is called from.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Validates the builder configuration.
    fn validate(&self) -> Result<(), UiSoundsError> {
        if self.backend.is_none() {
            return Err(UiSoundsError::NoBackendConfigured);
        }
        if self.config.asset_root.as_os_str().is_empty() {
            return Err(UiSoundsError::EmptyAssetRoot);
        }
        if self.config.lock_stripes == 0 {
            return Err(UiSoundsError::NoLockStripes);
        }
        if !(0.0..=1.0).contains(&self.config.default_volume) {
            return Err(UiSoundsError::InvalidDefaultVolume(
                self.config.default_volume,
            ));
        }
        Ok(())
    }

    /// Build the service with an empty cache.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No backend is configured
    /// - The asset root is empty
    /// - The lock stripe count is zero
    /// - The default volume is outside `0.0..=1.0`
    /// - No runtime was given and `build()` is called outside a tokio runtime
    pub fn build(self) -> Result<SoundService, UiSoundsError> {
        self.validate()?;

        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| UiSoundsError::NoRuntime)?,
        };
        let backend = self.backend.ok_or(UiSoundsError::NoBackendConfigured)?;

        tracing::info!(
            "starting sound service (backend: {}, asset root: {})",
            backend.name(),
            self.config.asset_root.display()
        );

        let loader = AssetLoader::new(backend, &self.config);
        let mut cache = SoundCache::new(loader, self.config.lock_stripes);
        if let Some(callback) = self.event_callback {
            cache = cache.with_event_callback(callback);
        }
        let cache = Arc::new(cache);

        let dispatcher = CommandDispatcher::new(cache.clone(), runtime)
            .with_default_volume(self.config.default_volume);

        Ok(SoundService::new(cache, dispatcher))
    }
}
