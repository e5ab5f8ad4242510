//! Configuration types for the sound cache.

use std::path::PathBuf;

/// Default asset root that sound ids are resolved against.
pub const DEFAULT_ASSET_ROOT: &str = "www";

/// Default number of per-id lock stripes.
pub const DEFAULT_LOCK_STRIPES: usize = 16;

/// Audio stream category a player is bound to.
///
/// UI sounds always play on the system stream; there is no bus routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum StreamCategory {
    /// System sounds (key clicks, notifications, UI feedback).
    #[default]
    System,
}

/// Configuration for the sound cache.
///
/// Use [`CacheConfig::default()`] for sensible defaults, or customize as needed.
///
/// # Example
///
/// ```
/// use ui_sounds::CacheConfig;
///
/// let config = CacheConfig {
///     asset_root: "assets/www".into(),
///     ..Default::default()
/// };
/// assert_eq!(config.lock_stripes, 16);
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Prefix joined with every sound id to locate its asset.
    ///
    /// Default: `www`
    pub asset_root: PathBuf,

    /// Stream category every player is created on.
    pub stream_category: StreamCategory,

    /// Number of lock stripes guarding per-id operations.
    ///
    /// Operations on ids hashing to the same stripe are serialized; more
    /// stripes means fewer unrelated ids waiting on each other.
    /// Default: 16
    pub lock_stripes: usize,

    /// Volume used by `playSound` when the host omits it.
    ///
    /// Default: 1.0
    pub default_volume: f32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from(DEFAULT_ASSET_ROOT),
            stream_category: StreamCategory::default(),
            lock_stripes: DEFAULT_LOCK_STRIPES,
            default_volume: 1.0,
        }
    }
}
