//! Error types for scenario discovery, parsing and reporting
//!
//! Execution failures are never errors: a crashing or timed-out scenario
//! becomes a failed `ScenarioResult`. Only conditions that make the whole run
//! meaningless surface here.

use std::path::PathBuf;

/// Scenario pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// IO error reading a scenario file or directory
    #[error("io error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Scenario directory holds no `*.md` files
    #[error("no scenario files found in {}", .dir.display())]
    NoScenarioFiles { dir: PathBuf },

    /// Category filter matched nothing
    #[error("no scenarios match category '{category}' (available: {})", .available.join(", "))]
    CategoryNotFound {
        category: String,
        available: Vec<String>,
    },

    /// Report could not be written
    #[error("failed to write report {}: {source}", .path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Report could not be decoded
    #[error("malformed report {}: {source}", .path.display())]
    MalformedReport {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Report could not be encoded
    #[error("report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScenarioError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the run found nothing to evaluate
    #[inline]
    #[must_use]
    pub fn is_discovery_error(&self) -> bool {
        matches!(self, Self::NoScenarioFiles { .. } | Self::CategoryNotFound { .. })
    }
}

/// Result type alias for scenario operations
pub type RunResult<T> = Result<T, ScenarioError>;
