//! Command results reported back to the host.

use serde::Serialize;

use crate::{CacheOutcome, SoundError, SoundResult};

/// Binary outcome of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The command succeeded.
    Ok,
    /// The command failed.
    Error,
}

/// The single response delivered for every handled command.
///
/// Serializes as `{"status": "ok", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub status: Status,
    /// Human-readable description of the outcome.
    pub message: String,
}

impl CommandResult {
    /// Creates a successful result.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            message: message.into(),
        }
    }

    /// Creates a failed result.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
        }
    }

    /// Returns `true` if the command succeeded.
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

impl std::fmt::Display for CommandResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Status::Ok => write!(f, "ok: {}", self.message),
            Status::Error => write!(f, "error: {}", self.message),
        }
    }
}

impl From<SoundError> for CommandResult {
    fn from(err: SoundError) -> Self {
        Self::error(err.to_string())
    }
}

impl From<CacheOutcome> for CommandResult {
    fn from(outcome: CacheOutcome) -> Self {
        Self::ok(outcome.to_string())
    }
}

impl From<SoundResult<CacheOutcome>> for CommandResult {
    fn from(result: SoundResult<CacheOutcome>) -> Self {
        match result {
            Ok(outcome) => outcome.into(),
            Err(err) => err.into(),
        }
    }
}

/// Single-shot callback receiving a command's result.
pub type ResultCallback = Box<dyn FnOnce(CommandResult) + Send>;

/// Creates a [`ResultCallback`] from a closure.
pub fn result_callback<F>(f: F) -> ResultCallback
where
    F: FnOnce(CommandResult) + Send + 'static,
{
    Box::new(f)
}
