//! Error types for tabcap-core.

use thiserror::Error;

use crate::platform::PlatformError;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tabcap-core.
///
/// Nothing in this crate treats an error as fatal: platform transients
/// are logged and handled per eviction/restoration policy, query errors
/// degrade a pass to a no-op, and persistence errors leave the in-memory
/// state authoritative until the next successful write.
#[derive(Error, Debug)]
pub enum Error {
    /// Tab platform errors (query/create/remove/move failed).
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// Persistence substrate errors.
    #[error("store error: {0}")]
    Store(String),

    /// Configuration validation errors.
    #[error("invalid config: {0}")]
    Config(String),

    /// JSON serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Runtime errors (operation queue closed, task failures).
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl Error {
    /// Whether this error came from a platform call that may succeed on
    /// a later pass.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Platform(_) | Self::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_errors_are_transient() {
        let err = Error::from(PlatformError::TabNotFound(7));
        assert!(err.is_transient());
        assert!(!Error::Config("tab_limit must be >= 1".into()).is_transient());
    }

    #[test]
    fn display_includes_source() {
        let err = Error::from(PlatformError::Unavailable("session gone".into()));
        assert!(err.to_string().contains("session gone"));
    }
}
