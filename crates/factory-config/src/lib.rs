//! Factory Config - typed configuration for the evaluation pipeline
//!
//! One [`FactoryConfig`] drives every stage: the scenario runner, the holdout
//! integrity gate and the feedback compiler. A config file is optional; when
//! present its keys form a closed schema validated at load time.
//!
//! # Example
//!
//! ```rust,ignore
//! use factory_config::FactoryConfig;
//!
//! let config = FactoryConfig::discover(repo_root)?;
//! let scenarios = config.scenarios_dir(repo_root);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod loader;

pub use config::{
    FactoryConfig, FeedbackConfig, HoldoutConfig, PathsConfig, RunnerConfig, DEFAULT_MARKER,
};
pub use error::{ConfigError, ConfigResult};
pub use loader::{find_config_file, ConfigFormat, CONFIG_FILE_NAMES, REQUIRED_KEYS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
