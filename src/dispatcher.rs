//! Command dispatcher: validates host commands and runs them off-thread.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::{
    result_callback, CommandResult, Params, ResultCallback, SoundCache, SoundError, SoundResult,
};

/// A command the dispatcher recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// `preloadSound(id)`
    PreloadSound,
    /// `preloadMultiple(id, id, ...)`
    PreloadMultiple,
    /// `playSound(id, volume?)`
    PlaySound,
    /// `unloadSound(id)`
    UnloadSound,
}

impl Action {
    /// Every recognized action.
    pub const ALL: [Action; 4] = [
        Action::PreloadSound,
        Action::PreloadMultiple,
        Action::PlaySound,
        Action::UnloadSound,
    ];

    /// Returns the host-facing action name.
    pub fn name(self) -> &'static str {
        match self {
            Self::PreloadSound => "preloadSound",
            Self::PreloadMultiple => "preloadMultiple",
            Self::PlaySound => "playSound",
            Self::UnloadSound => "unloadSound",
        }
    }

    /// Looks up an action by its host-facing name (case-sensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether the dispatcher took ownership of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The command was scheduled; its callback will be invoked exactly once.
    Accepted,
    /// The action name is unknown; the callback was dropped without being invoked.
    NotHandled,
}

/// Delivers a command's result exactly once.
///
/// If the reply is dropped unsent (the task never ran, or unwound past the
/// panic guard) the callback still receives an error result.
struct Reply {
    action: Action,
    callback: Option<ResultCallback>,
}

impl Reply {
    fn new(action: Action, callback: ResultCallback) -> Self {
        Self {
            action,
            callback: Some(callback),
        }
    }

    fn send(mut self, result: CommandResult) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }
}

impl Drop for Reply {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            tracing::error!("{} finished without a result", self.action);
            callback(
                SoundError::Unexpected(format!("{} was dropped before completing", self.action))
                    .into(),
            );
        }
    }
}

/// Routes host commands to a [`SoundCache`] on a worker pool.
///
/// Each accepted command becomes one task on the runtime's blocking pool,
/// since loading blocks on I/O. The calling thread never waits.
pub struct CommandDispatcher {
    cache: Arc<SoundCache>,
    runtime: Handle,
    default_volume: f32,
}

impl CommandDispatcher {
    /// Creates a dispatcher that schedules work on `runtime`.
    pub fn new(cache: Arc<SoundCache>, runtime: Handle) -> Self {
        Self {
            cache,
            runtime,
            default_volume: 1.0,
        }
    }

    /// Sets the volume used when `playSound` omits it.
    #[must_use]
    pub fn with_default_volume(mut self, volume: f32) -> Self {
        self.default_volume = volume;
        self
    }

    /// Returns the cache commands are dispatched to.
    pub fn cache(&self) -> &Arc<SoundCache> {
        &self.cache
    }

    /// Schedules `action` and returns immediately.
    ///
    /// Unknown actions return [`Dispatch::NotHandled`] and never touch the
    /// callback. Accepted actions invoke `callback` exactly once from a
    /// worker thread, even if the command panics.
    pub fn execute(&self, action: &str, params: Params, callback: ResultCallback) -> Dispatch {
        let Some(action) = Action::from_name(action) else {
            tracing::debug!("not handling unknown action '{}'", action);
            return Dispatch::NotHandled;
        };

        let reply = Reply::new(action, callback);
        let cache = self.cache.clone();
        let default_volume = self.default_volume;

        tracing::trace!("scheduling {} with {} params", action, params.len());
        self.runtime.spawn_blocking(move || {
            let result = run_guarded(action, || {
                run_command(&cache, action, &params, default_volume)
            });
            reply.send(result);
        });

        Dispatch::Accepted
    }

    /// Schedules `action` and returns a future resolving to its result.
    ///
    /// Returns `None` for unknown actions.
    pub fn submit(
        &self,
        action: &str,
        params: Params,
    ) -> Option<impl Future<Output = CommandResult> + Send + 'static> {
        let (tx, rx) = oneshot::channel();
        let callback = result_callback(move |result| {
            let _ = tx.send(result);
        });

        match self.execute(action, params, callback) {
            Dispatch::NotHandled => None,
            Dispatch::Accepted => Some(rx.map(|received| {
                received.unwrap_or_else(|_| {
                    SoundError::Unexpected("result channel closed".to_string()).into()
                })
            })),
        }
    }
}

/// Runs a command, converting a panic into an error result.
fn run_guarded<F>(action: Action, command: F) -> CommandResult
where
    F: FnOnce() -> CommandResult,
{
    panic::catch_unwind(AssertUnwindSafe(command)).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!("{} panicked: {}", action, reason);
        SoundError::Unexpected(reason).into()
    })
}

/// Extracts typed arguments for `action` and runs it against the cache.
fn run_command(
    cache: &SoundCache,
    action: Action,
    params: &Params,
    default_volume: f32,
) -> CommandResult {
    let result = match action {
        Action::PreloadSound => required_id(action, params).and_then(|id| cache.preload(&id)),
        Action::PreloadMultiple => cache.preload_batch(params.sound_ids()),
        Action::PlaySound => required_id(action, params).and_then(|id| {
            let volume = params.number_or(1, f64::from(default_volume));
            cache.play(&id, volume)
        }),
        Action::UnloadSound => required_id(action, params).and_then(|id| cache.unload(&id)),
    };

    if let Err(ref e) = result {
        tracing::debug!("{} failed: {}", action, e);
    }
    result.into()
}

fn required_id(action: Action, params: &Params) -> SoundResult<crate::SoundId> {
    params.sound_id(0).ok_or_else(|| {
        SoundError::invalid_argument(format!(
            "expected sound id (string) as first argument to {}()",
            action.name()
        ))
    })
}
