//! Cache events for monitoring.
//!
//! Events are non-fatal notifications about cache activity. They are for
//! logging and metrics; command outcomes are still delivered through the
//! result callback.

use std::sync::Arc;

use crate::SoundId;

/// Events emitted by the sound cache.
///
/// # Example
///
/// ```
/// use ui_sounds::CacheEvent;
///
/// fn handle_event(event: CacheEvent) {
///     match event {
///         CacheEvent::SoundLoaded { id } => eprintln!("loaded {id}"),
///         CacheEvent::LoadFailed { id, diagnostic } => eprintln!("{id} failed: {diagnostic}"),
///         CacheEvent::PlaybackStarted { id, lazy_loaded, .. } if lazy_loaded => {
///             eprintln!("{id} was played without being preloaded");
///         }
///         CacheEvent::PlaybackStarted { .. } => {}
///         CacheEvent::SoundUnloaded { id } => eprintln!("unloaded {id}"),
///         CacheEvent::StopIgnored { id, error } => eprintln!("{id}: stop ignored ({error})"),
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEvent {
    /// A sound was loaded and inserted into the cache.
    SoundLoaded {
        /// The sound that was loaded.
        id: SoundId,
    },

    /// Loading a sound failed; the cache is unchanged.
    LoadFailed {
        /// The sound that failed.
        id: SoundId,
        /// Diagnostic from the platform.
        diagnostic: String,
    },

    /// Playback of a cached sound started from the beginning.
    PlaybackStarted {
        /// The sound being played.
        id: SoundId,
        /// Applied volume.
        volume: f32,
        /// `true` if the sound had to be loaded first.
        lazy_loaded: bool,
    },

    /// A sound was released and removed from the cache.
    SoundUnloaded {
        /// The sound that was removed.
        id: SoundId,
    },

    /// Stopping a handle during unload failed and was ignored.
    ///
    /// This usually means the sound was not playing.
    StopIgnored {
        /// The sound being unloaded.
        id: SoundId,
        /// Description of the stop failure.
        error: String,
    },
}

/// Callback type for receiving cache events.
///
/// Register one via [`UiSoundsBuilder::on_event()`].
///
/// [`UiSoundsBuilder::on_event()`]: crate::UiSoundsBuilder::on_event
pub type EventCallback = Arc<dyn Fn(CacheEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// # Example
///
/// ```
/// use ui_sounds::{event_callback, CacheEvent};
///
/// let callback = event_callback(|event: CacheEvent| {
///     println!("Got event: {:?}", event);
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(CacheEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}
