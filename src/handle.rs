//! Resource handle trait for platform players.

use crate::BackendError;

/// A platform-provided, playable audio resource.
///
/// Handles are created by an [`AudioBackend`](crate::AudioBackend), prepared
/// once by the [`AssetLoader`](crate::AssetLoader), and then owned by the
/// [`SoundCache`](crate::SoundCache) until unloaded.
///
/// # Implementation Notes
///
/// - Methods take `&mut self`; the cache serializes access per sound id
/// - Every method may fail with a [`BackendError`]; the cache turns these
///   into diagnostics instead of panicking
/// - `stop` on a handle that is not playing may fail; callers treat that as
///   best effort
/// - After `release` the handle must not be used again
///
/// # Example
///
/// ```
/// use ui_sounds::{BackendError, ResourceHandle};
///
/// #[derive(Default)]
/// struct SilentHandle {
///     playing: bool,
/// }
///
/// impl ResourceHandle for SilentHandle {
///     fn prepare(&mut self) -> Result<(), BackendError> { Ok(()) }
///     fn start(&mut self) -> Result<(), BackendError> { self.playing = true; Ok(()) }
///     fn pause(&mut self) -> Result<(), BackendError> { self.playing = false; Ok(()) }
///     fn seek_to(&mut self, _position_ms: u32) -> Result<(), BackendError> { Ok(()) }
///     fn stop(&mut self) -> Result<(), BackendError> { self.playing = false; Ok(()) }
///     fn release(&mut self) {}
///     fn set_volume(&mut self, _left: f32, _right: f32) -> Result<(), BackendError> { Ok(()) }
///     fn is_playing(&self) -> bool { self.playing }
/// }
/// ```
pub trait ResourceHandle: Send {
    /// Prepares the resource for playback, blocking until it is ready.
    fn prepare(&mut self) -> Result<(), BackendError>;

    /// Starts (or resumes) playback.
    fn start(&mut self) -> Result<(), BackendError>;

    /// Pauses playback, keeping the current position.
    fn pause(&mut self) -> Result<(), BackendError>;

    /// Moves the playback position.
    fn seek_to(&mut self, position_ms: u32) -> Result<(), BackendError>;

    /// Stops playback.
    fn stop(&mut self) -> Result<(), BackendError>;

    /// Frees the underlying platform resource.
    fn release(&mut self);

    /// Sets per-channel volume in `0.0..=1.0`.
    fn set_volume(&mut self, left: f32, right: f32) -> Result<(), BackendError>;

    /// Returns `true` while audio is playing.
    fn is_playing(&self) -> bool;
}
