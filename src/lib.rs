//! # ui-sounds
//!
//! Keyed audio resource cache with exclusive playback control.
//!
//! `ui-sounds` keeps short UI sound effects loaded and ready to play. A host
//! sends four commands (`preloadSound`, `preloadMultiple`, `playSound`,
//! `unloadSound`); each runs off the calling thread and reports exactly one
//! ok/error result through a callback.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ui_sounds::{MockBackend, Params, UiSounds};
//!
//! let service = UiSounds::builder()
//!     .backend(MockBackend::new())        // or your platform backend
//!     .asset_root("www")                  // ids resolve to www/<id>
//!     .on_event(|e| tracing::debug!(?e, "cache event"))
//!     .build()?;
//!
//! // Preload ahead of time for low-latency playback
//! let result = service
//!     .submit("preloadSound", Params::from_json(r#"["sounds/click.mp3"]"#)?)
//!     .expect("known action")
//!     .await;
//!
//! // Always restarts from the beginning; volume defaults to 1.0
//! service.submit("playSound", Params::from_json(r#"["sounds/click.mp3", 0.5]"#)?);
//!
//! service.shutdown();
//! ```
//!
//! ## Architecture
//!
//! - **Dispatcher**: validates the action name, then schedules one task per
//!   command on the runtime's blocking pool and returns immediately
//! - **Sound cache**: the registry of prepared handles; commands on the same
//!   id are serialized through striped locks, distinct ids run in parallel
//! - **Asset loader**: resolves `<asset-root>/<id>` and asks the
//!   [`AudioBackend`] for a prepared [`ResourceHandle`]
//!
//! Every failure is a value: the cache stays usable after any error, and a
//! panic inside a command is reported as an error result.

#![warn(missing_docs)]
// Volume and stripe index conversions are intentional
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
// unwrap/expect allowed in tests only
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

pub mod backend;
mod builder;
mod cache;
mod config;
mod dispatcher;
mod error;
mod event;
mod handle;
mod loader;
mod params;
mod result;
mod service;
mod sound_id;

pub use backend::{AssetDescriptor, AudioBackend, MockBackend, MockHandleState};
pub use builder::{UiSounds, UiSoundsBuilder};
pub use cache::{CacheOutcome, CacheStats, SoundCache, INVALID_BATCH_ENTRY};
pub use config::{CacheConfig, StreamCategory, DEFAULT_ASSET_ROOT, DEFAULT_LOCK_STRIPES};
pub use dispatcher::{Action, CommandDispatcher, Dispatch};
pub use error::{BackendError, SoundError, SoundResult, UiSoundsError};
pub use event::{event_callback, CacheEvent, EventCallback};
pub use handle::ResourceHandle;
pub use loader::AssetLoader;
pub use params::Params;
pub use result::{result_callback, CommandResult, ResultCallback, Status};
pub use service::SoundService;
pub use sound_id::SoundId;
