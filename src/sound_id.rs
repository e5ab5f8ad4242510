//! Sound identification type.

use std::sync::Arc;

/// Identifier for a logical sound asset.
///
/// A `SoundId` is supplied by the host and is effectively a path relative to
/// the configured asset root (for example `"sounds/click.mp3"`). Equality is
/// exact string match; no normalization is applied.
///
/// Cloning is cheap (`Arc<str>` pointer copy).
///
/// # Example
///
/// ```
/// use ui_sounds::SoundId;
///
/// let click = SoundId::new("sounds/click.mp3");
/// assert_eq!(click, SoundId::from("sounds/click.mp3"));
/// assert_ne!(click, SoundId::from("./sounds/click.mp3"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundId(Arc<str>);

impl SoundId {
    /// Creates a new sound ID from a string.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the ID is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for SoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SoundId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SoundId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for SoundId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
