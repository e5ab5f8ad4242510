//! Error types for ui-sounds.
//!
//! Errors are split into three layers:
//! - **Configuration errors** ([`UiSoundsError`]): Prevent a [`SoundService`](crate::SoundService) from being built
//! - **Command errors** ([`SoundError`]): Returned by cache operations and reported to the host as an error result
//! - **Platform errors** ([`BackendError`]): Raised by an [`AudioBackend`](crate::AudioBackend) or
//!   [`ResourceHandle`](crate::ResourceHandle) and carried upward as a diagnostic

use std::path::PathBuf;

use crate::SoundId;

/// Fatal errors that prevent the sound service from being built.
#[derive(Debug, thiserror::Error)]
pub enum UiSoundsError {
    /// No audio backend was configured before building.
    #[error("no audio backend configured - call backend() before build()")]
    NoBackendConfigured,

    /// The asset root is empty.
    #[error("asset root must not be empty")]
    EmptyAssetRoot,

    /// The registry needs at least one lock stripe.
    #[error("lock stripe count must be at least 1")]
    NoLockStripes,

    /// The configured default volume is outside `[0.0, 1.0]`.
    #[error("default volume {0} is outside 0.0..=1.0")]
    InvalidDefaultVolume(f32),

    /// No runtime was given and the builder is not running inside one.
    #[error("no tokio runtime available - call runtime() or build inside a runtime")]
    NoRuntime,
}

/// Errors produced by a sound cache command.
///
/// None of these are fatal: the cache stays usable after any of them, and
/// every one is reported to the host as an error result whose message is the
/// `Display` text below.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SoundError {
    /// A parameter was missing or malformed, or the volume was out of range.
    #[error("{reason}")]
    InvalidArgument {
        /// What was wrong with the argument.
        reason: String,
    },

    /// The sound is already in the cache.
    #[error("'{id}' is already loaded")]
    AlreadyLoaded {
        /// The sound that was already loaded.
        id: SoundId,
    },

    /// The sound is not in the cache.
    #[error("'{id}' is not loaded, cannot be unloaded")]
    NotLoaded {
        /// The sound that was requested.
        id: SoundId,
    },

    /// The asset loader failed to produce a prepared handle.
    #[error("error while attempting to load '{id}' - {diagnostic}")]
    LoadFailure {
        /// The sound that failed to load.
        id: SoundId,
        /// Diagnostic from the platform, unmodified.
        diagnostic: String,
    },

    /// One or more sounds in a batch failed to load.
    ///
    /// Entries are in request order; invalid parameters appear as
    /// `invalid string`.
    #[error("failed to load assets - {}", quote_all(.failed))]
    BatchFailure {
        /// Every id that failed, in request order.
        failed: Vec<String>,
    },

    /// The platform rejected a playback operation on a cached handle.
    #[error("playback of '{id}' failed - {diagnostic}")]
    Playback {
        /// The sound being played.
        id: SoundId,
        /// Diagnostic from the platform, unmodified.
        diagnostic: String,
    },

    /// The cache was shut down before the command ran.
    #[error("sound cache has been shut down")]
    ShutDown,

    /// A failure nobody anticipated, such as a panic inside a worker task.
    #[error("unexpected failure - {0}")]
    Unexpected(String),
}

impl SoundError {
    /// Creates an invalid argument error with the given reason.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Creates a load failure carrying a platform diagnostic.
    pub fn load_failure(id: &SoundId, diagnostic: impl ToString) -> Self {
        Self::LoadFailure {
            id: id.clone(),
            diagnostic: diagnostic.to_string(),
        }
    }

    /// Creates a playback error carrying a platform diagnostic.
    pub fn playback(id: &SoundId, diagnostic: impl ToString) -> Self {
        Self::Playback {
            id: id.clone(),
            diagnostic: diagnostic.to_string(),
        }
    }
}

fn quote_all(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("'{item}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result alias for sound cache commands.
pub type SoundResult<T> = Result<T, SoundError>;

/// Errors raised by an audio backend or one of its handles.
///
/// These are surfaced upward as free-text diagnostics and are never
/// reinterpreted by the cache.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The asset could not be opened.
    #[error("cannot open asset {}: {source}", .path.display())]
    OpenFailed {
        /// Resolved asset location.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The platform could not create a player for the asset.
    #[error("cannot create player: {reason}")]
    CreateFailed {
        /// Why creation failed.
        reason: String,
    },

    /// The player could not be prepared for playback.
    #[error("prepare failed: {reason}")]
    PrepareFailed {
        /// Why preparation failed.
        reason: String,
    },

    /// The operation is not valid in the handle's current state.
    #[error("illegal state: cannot {operation} while {state}")]
    IllegalState {
        /// The operation that was attempted.
        operation: &'static str,
        /// The state the handle was in.
        state: &'static str,
    },

    /// The handle was already released.
    #[error("handle has been released")]
    Released,

    /// Custom error for user-implemented backends.
    #[error("{0}")]
    Custom(String),
}

impl BackendError {
    /// Creates a custom backend error with the given message.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Creates an open failure for the given path.
    pub fn open_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OpenFailed {
            path: path.into(),
            source,
        }
    }

    /// Creates a player creation failure with the given reason.
    pub fn create_failed(reason: impl Into<String>) -> Self {
        Self::CreateFailed {
            reason: reason.into(),
        }
    }

    /// Creates a prepare failure with the given reason.
    pub fn prepare_failed(reason: impl Into<String>) -> Self {
        Self::PrepareFailed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_loaded_display() {
        let err = SoundError::AlreadyLoaded {
            id: SoundId::new("click.mp3"),
        };
        assert_eq!(err.to_string(), "'click.mp3' is already loaded");
    }

    #[test]
    fn test_batch_failure_lists_every_id() {
        let err = SoundError::BatchFailure {
            failed: vec!["b.mp3".to_string(), "invalid string".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "failed to load assets - 'b.mp3', 'invalid string'"
        );
    }

    #[test]
    fn test_load_failure_keeps_diagnostic() {
        let id = SoundId::new("missing.mp3");
        let err = SoundError::load_failure(&id, BackendError::prepare_failed("bad header"));
        assert_eq!(
            err.to_string(),
            "error while attempting to load 'missing.mp3' - prepare failed: bad header"
        );
    }

    #[test]
    fn test_backend_open_failed_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = BackendError::open_failed("www/click.mp3", io_err);
        assert!(err.to_string().contains("www/click.mp3"));
        assert!(err.to_string().contains("no such file"));
    }

    #[test]
    fn test_illegal_state_display() {
        let err = BackendError::IllegalState {
            operation: "stop",
            state: "idle",
        };
        assert_eq!(err.to_string(), "illegal state: cannot stop while idle");
    }

    #[test]
    fn test_config_error_display() {
        assert_eq!(
            UiSoundsError::InvalidDefaultVolume(1.5).to_string(),
            "default volume 1.5 is outside 0.0..=1.0"
        );
    }
}
