//! Error types for factory configuration
//!
//! Every variant that can report more than one problem carries the full list,
//! so an operator fixes a config file in one pass instead of one key at a time.

use std::path::PathBuf;

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("io error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File extension is not a recognized config format
    #[error("unsupported config format for {}: expected .toml, .yaml or .yml", .path.display())]
    UnsupportedFormat { path: PathBuf },

    /// File could not be parsed as its declared format
    #[error("syntax error in {}: {message}", .path.display())]
    Syntax { path: PathBuf, message: String },

    /// One or more required keys are absent
    #[error("missing required config keys in {}: {}", .path.display(), .keys.join(", "))]
    MissingKeys { path: PathBuf, keys: Vec<String> },

    /// Unknown key or wrongly typed value
    #[error("invalid config {}: {message}", .path.display())]
    Invalid { path: PathBuf, message: String },

    /// Values parsed but violate semantic constraints
    #[error("invalid configuration: {}", .problems.join("; "))]
    Validation { problems: Vec<String> },
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create syntax error for path
    pub fn syntax_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Syntax {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
