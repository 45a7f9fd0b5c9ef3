//! Error types for the lip-sync core.

/// Top-level error type for the lip-sync animation system.
#[derive(Debug, thiserror::Error)]
pub enum LipSyncError {
    /// Audio transport could not start or misbehaved.
    #[error("playback error: {0}")]
    Playback(String),

    /// Mark sequence rejected (malformed JSON, unsorted timestamps).
    #[error("mark error: {0}")]
    Marks(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, LipSyncError>;
