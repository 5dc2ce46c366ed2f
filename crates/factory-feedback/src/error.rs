//! Error types for feedback compilation
//!
//! Missing or damaged inputs never surface here; they degrade to "no
//! results" or a reset counter. Only failing to write outputs is an error.

use std::path::PathBuf;

/// Feedback driver errors
#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    /// Output could not be written
    #[error("io error writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Trajectory record could not be encoded
    #[error("trajectory serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FeedbackError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for feedback operations
pub type FeedbackResult<T> = Result<T, FeedbackError>;
