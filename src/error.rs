//! Error types for the handcue pipeline.

use thiserror::Error;

/// Errors surfaced by the capture loop and its host-side helpers.
///
/// Per-frame classification anomalies never reach the caller: an
/// [`HandcueError::InvalidSnapshot`] is absorbed by the driver and the frame
/// is treated as "no hand detected".
#[derive(Debug, Error)]
pub enum HandcueError {
    /// Frame source could not be opened.
    #[error("frame source unavailable: {0}")]
    SourceUnavailable(String),

    /// Frame source failed mid-run.
    #[error("frame source read failed: {0}")]
    SourceRead(String),

    /// Snapshot does not carry exactly 21 landmarks.
    #[error("invalid snapshot: expected 21 landmarks, got {count}")]
    InvalidSnapshot {
        /// Number of landmarks actually present.
        count: usize,
    },

    /// Configuration rejected during validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Recording file is structurally wrong.
    #[error("invalid recording: {0}")]
    Recording(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HandcueError {
    /// Creates a source unavailable error.
    #[must_use]
    pub fn source_unavailable(reason: impl Into<String>) -> Self {
        Self::SourceUnavailable(reason.into())
    }

    /// Creates a source read error.
    #[must_use]
    pub fn source_read(reason: impl Into<String>) -> Self {
        Self::SourceRead(reason.into())
    }

    /// Creates an invalid snapshot error.
    #[must_use]
    pub const fn invalid_snapshot(count: usize) -> Self {
        Self::InvalidSnapshot { count }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates a recording error.
    #[must_use]
    pub fn recording(reason: impl Into<String>) -> Self {
        Self::Recording(reason.into())
    }

    /// True for failures that end a run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SourceUnavailable(_) | Self::SourceRead(_))
    }
}

/// Result type for handcue operations.
pub type Result<T> = std::result::Result<T, HandcueError>;
