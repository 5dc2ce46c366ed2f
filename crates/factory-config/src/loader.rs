//! Config file loading
//!
//! Files are parsed into a generic value tree first so that required keys can
//! be checked as a set, then deserialized with unknown keys rejected.

use crate::config::FactoryConfig;
use crate::error::{ConfigError, ConfigResult};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Keys that must be present in any config file
pub const REQUIRED_KEYS: &[&str] = &["paths.scenarios_dir", "paths.factory_dir", "runner.timeout_secs"];

/// File names tried in the repository root, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["factory.toml", "factory.yaml", "factory.yml"];

/// Supported config file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML
    Toml,
    /// YAML
    Yaml,
}

impl ConfigFormat {
    /// Detect format from file extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Some(Self::Toml),
            Some("yaml" | "yml") => Some(Self::Yaml),
            _ => None,
        }
    }

    fn parse(self, source: &str) -> Result<Value, String> {
        let value = match self {
            Self::Toml => {
                let table: toml::Value = toml::from_str(source).map_err(|e| e.to_string())?;
                serde_json::to_value(table).map_err(|e| e.to_string())?
            }
            Self::Yaml => {
                let doc: serde_yaml::Value = serde_yaml::from_str(source).map_err(|e| e.to_string())?;
                if doc.is_null() {
                    Value::Object(serde_json::Map::new())
                } else {
                    serde_json::to_value(doc).map_err(|e| e.to_string())?
                }
            }
        };
        if value.is_object() {
            Ok(value)
        } else {
            Err("top level must be a table of sections".to_string())
        }
    }
}

impl FactoryConfig {
    /// Load and validate a config file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::UnsupportedFormat` for unknown extensions
    /// - `ConfigError::Syntax` if the file does not parse
    /// - `ConfigError::MissingKeys` naming every absent required key
    /// - `ConfigError::Invalid` for unknown keys or wrong value types
    /// - `ConfigError::Validation` for semantic violations
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        Self::from_source(&source, format, path)
    }

    /// Parse config text in the given format
    ///
    /// `origin` is only used in error messages.
    ///
    /// # Errors
    /// Same as [`FactoryConfig::load`] minus IO and format detection.
    pub fn from_source(source: &str, format: ConfigFormat, origin: &Path) -> ConfigResult<Self> {
        let value = format
            .parse(source)
            .map_err(|message| ConfigError::syntax_error(origin, message))?;

        let missing = missing_required_keys(&value);
        if !missing.is_empty() {
            return Err(ConfigError::MissingKeys {
                path: origin.to_path_buf(),
                keys: missing,
            });
        }

        let config: FactoryConfig = serde_json::from_value(value).map_err(|e| ConfigError::Invalid {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the first config file found in the repository root, or defaults
    ///
    /// # Errors
    /// Propagates any error from loading a file that exists.
    pub fn discover(repo_root: &Path) -> ConfigResult<Self> {
        match find_config_file(repo_root) {
            Some(path) => {
                tracing::debug!("Loading factory config from {}", path.display());
                Self::load(path)
            }
            None => {
                tracing::debug!("No factory config in {}, using defaults", repo_root.display());
                Ok(Self::default())
            }
        }
    }
}

/// First existing config file in `repo_root`
#[must_use]
pub fn find_config_file(repo_root: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| repo_root.join(name))
        .find(|path| path.is_file())
}

fn missing_required_keys(value: &Value) -> Vec<String> {
    REQUIRED_KEYS
        .iter()
        .filter(|key| !has_key(value, key))
        .map(|key| (*key).to_string())
        .collect()
}

fn has_key(value: &Value, dotted: &str) -> bool {
    let mut current = value;
    for segment in dotted.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_TOML: &str = r#"
[paths]
scenarios_dir = "holdout"
factory_dir = "out/factory"

[runner]
timeout_secs = 60
"#;

    #[test]
    fn toml_overrides_defaults() {
        let config = FactoryConfig::from_source(FULL_TOML, ConfigFormat::Toml, Path::new("factory.toml")).unwrap();
        assert_eq!(config.paths.scenarios_dir, PathBuf::from("holdout"));
        assert_eq!(config.runner.timeout_secs, 60);
        // untouched keys keep defaults
        assert_eq!(config.runner.shell, "bash");
        assert_eq!(config.paths.makefile, PathBuf::from("Makefile"));
    }

    #[test]
    fn yaml_is_accepted() {
        let yaml = "paths:\n  scenarios_dir: s\n  factory_dir: f\nrunner:\n  timeout_secs: 5\nholdout:\n  default_ref: upstream/main\n";
        let config = FactoryConfig::from_source(yaml, ConfigFormat::Yaml, Path::new("factory.yaml")).unwrap();
        assert_eq!(config.runner.timeout_secs, 5);
        assert_eq!(config.holdout.default_ref, "upstream/main");
    }

    #[test]
    fn missing_keys_are_reported_together() {
        let err = FactoryConfig::from_source("[runner]\nshell = \"sh\"\n", ConfigFormat::Toml, Path::new("f.toml"))
            .unwrap_err();
        match err {
            ConfigError::MissingKeys { keys, .. } => {
                assert_eq!(keys, REQUIRED_KEYS.iter().map(|k| (*k).to_string()).collect::<Vec<_>>());
            }
            other => panic!("expected MissingKeys, got {other:?}"),
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let source = format!("{FULL_TOML}\n[runner_extra]\nx = 1\n");
        let err = FactoryConfig::from_source(&source, ConfigFormat::Toml, Path::new("f.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn non_table_yaml_is_a_syntax_error() {
        let err = FactoryConfig::from_source("- a\n- b\n", ConfigFormat::Yaml, Path::new("f.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Syntax { .. }));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_path(Path::new("a.yml")), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), None);
    }
}
