//! Error types for the holdout integrity gate

use crate::state::{HoldoutOp, HoldoutState};
use crate::verify::VerificationFailure;
use std::path::PathBuf;

/// Integrity gate errors
#[derive(Debug, thiserror::Error)]
pub enum HoldoutError {
    /// Filesystem error
    #[error("io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Version-control executable could not be started
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Version-control command exited unsuccessfully
    #[error("`{command}` failed ({}): {stderr}", exit_description(.code))]
    Git {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Trusted ref has no scenario files
    #[error("no scenario files under '{path}' at ref '{reference}'")]
    NothingToRestore { reference: String, path: String },

    /// Post-operation checks failed
    #[error("verification failed:\n{}", format_failures(.0))]
    VerificationFailed(Vec<VerificationFailure>),

    /// Operation not permitted from the current state
    #[error("cannot {op} while holdout is {state}")]
    IllegalTransition { state: HoldoutState, op: HoldoutOp },
}

impl HoldoutError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Verification failures, if this is a verification error
    #[must_use]
    pub fn failures(&self) -> &[VerificationFailure] {
        match self {
            Self::VerificationFailed(failures) => failures,
            _ => &[],
        }
    }
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit {code}"),
        None => "killed by signal".to_string(),
    }
}

fn format_failures(failures: &[VerificationFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("  - {f}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type alias for holdout operations
pub type HoldoutResult<T> = Result<T, HoldoutError>;
