//! Factory configuration types
//!
//! Four sections, each with its own defaults:
//! - `paths`: where scenarios, factory artifacts and the Makefile live
//! - `runner`: scenario execution limits
//! - `holdout`: what the integrity gate strips and where it restores from
//! - `feedback`: inputs and constraints for the feedback compiler

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Marker string written into strip commits and Makefile comment blocks
pub const DEFAULT_MARKER: &str = "[factory:holdout-stripped]";

/// Complete factory configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactoryConfig {
    /// Repository-relative locations
    #[serde(default)]
    pub paths: PathsConfig,
    /// Scenario execution settings
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Integrity gate settings
    #[serde(default)]
    pub holdout: HoldoutConfig,
    /// Feedback compiler settings
    #[serde(default)]
    pub feedback: FeedbackConfig,
}

/// Repository-relative paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Holdout scenario corpus
    pub scenarios_dir: PathBuf,
    /// Report, feedback and counter artifacts
    pub factory_dir: PathBuf,
    /// Makefile carrying scenario hooks
    pub makefile: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            scenarios_dir: PathBuf::from("scenarios"),
            factory_dir: PathBuf::from("artifacts/factory"),
            makefile: PathBuf::from("Makefile"),
        }
    }
}

/// Scenario runner settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Per-scenario wall-clock limit
    pub timeout_secs: u64,
    /// Characters of stdout/stderr tail kept per scenario
    pub output_tail_chars: usize,
    /// Shell used to run evaluation methods
    pub shell: String,
    /// Environment variable pointed at the repository root
    pub import_path_var: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            output_tail_chars: 5000,
            shell: "bash".to_string(),
            import_path_var: "PYTHONPATH".to_string(),
        }
    }
}

/// Holdout integrity gate settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HoldoutConfig {
    /// Makefile targets commented out while stripped
    pub scenario_targets: Vec<String>,
    /// Review-pack files deleted on strip and never restored
    pub review_pack_files: Vec<PathBuf>,
    /// Machine-greppable marker for commits and comment blocks
    pub marker: String,
    /// Trusted ref scenarios are restored from
    pub default_ref: String,
    /// Remote fetched before restoring from one of its tracking refs
    pub remote: String,
}

impl Default for HoldoutConfig {
    fn default() -> Self {
        Self {
            scenario_targets: vec!["run-scenarios".to_string(), "compile-feedback".to_string()],
            review_pack_files: vec![
                PathBuf::from("docs/pr_review_pack.html"),
                PathBuf::from("docs/pr_diff_data.json"),
            ],
            marker: DEFAULT_MARKER.to_string(),
            default_ref: "origin/main".to_string(),
            remote: "origin".to_string(),
        }
    }
}

/// Feedback compiler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedbackConfig {
    /// Scenario report file name inside the factory dir
    pub results_file: String,
    /// CI log file name inside the factory dir
    pub ci_log_file: String,
    /// Logs longer than this are truncated
    pub ci_log_max_chars: usize,
    /// Characters kept from each end of a truncated log
    pub ci_log_keep_chars: usize,
    /// Paths the coding agent is told never to modify
    pub protected_paths: Vec<String>,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            results_file: "scenario_results.json".to_string(),
            ci_log_file: "ci_output.log".to_string(),
            ci_log_max_chars: 10_000,
            ci_log_keep_chars: 5_000,
            protected_paths: vec![
                "/scenarios/".to_string(),
                "/scripts/".to_string(),
                "/.github/workflows/factory.yaml".to_string(),
            ],
        }
    }
}

impl FactoryConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With scenarios directory
    #[inline]
    #[must_use]
    pub fn with_scenarios_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.paths.scenarios_dir = dir.into();
        self
    }

    /// With factory artifacts directory
    #[inline]
    #[must_use]
    pub fn with_factory_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.paths.factory_dir = dir.into();
        self
    }

    /// With per-scenario timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.runner.timeout_secs = secs;
        self
    }

    /// With trusted restore ref
    #[inline]
    #[must_use]
    pub fn with_default_ref(mut self, reference: impl Into<String>) -> Self {
        self.holdout.default_ref = reference.into();
        self
    }

    /// Scenario directory resolved against the repository root
    #[must_use]
    pub fn scenarios_dir(&self, repo_root: &Path) -> PathBuf {
        resolve(repo_root, &self.paths.scenarios_dir)
    }

    /// Factory artifacts directory resolved against the repository root
    #[must_use]
    pub fn factory_dir(&self, repo_root: &Path) -> PathBuf {
        resolve(repo_root, &self.paths.factory_dir)
    }

    /// Makefile resolved against the repository root
    #[must_use]
    pub fn makefile(&self, repo_root: &Path) -> PathBuf {
        resolve(repo_root, &self.paths.makefile)
    }

    /// Default scenario report location
    #[must_use]
    pub fn results_path(&self, repo_root: &Path) -> PathBuf {
        self.factory_dir(repo_root).join(&self.feedback.results_file)
    }

    /// Check semantic constraints, reporting every violation at once
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` listing each problem found.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut problems = Vec::new();

        if self.runner.timeout_secs == 0 {
            problems.push("runner.timeout_secs must be greater than zero".to_string());
        }
        if self.runner.output_tail_chars == 0 {
            problems.push("runner.output_tail_chars must be greater than zero".to_string());
        }
        if self.runner.shell.trim().is_empty() {
            problems.push("runner.shell must not be empty".to_string());
        }
        if self.holdout.marker.trim().is_empty() {
            problems.push("holdout.marker must not be empty".to_string());
        }
        if self.holdout.marker.contains('\n') {
            problems.push("holdout.marker must be a single line".to_string());
        }
        for target in &self.holdout.scenario_targets {
            if !is_valid_target_name(target) {
                problems.push(format!("holdout.scenario_targets: '{target}' is not a Makefile target name"));
            }
        }
        if self.holdout.default_ref.trim().is_empty() {
            problems.push("holdout.default_ref must not be empty".to_string());
        }
        if self.feedback.ci_log_keep_chars.saturating_mul(2) > self.feedback.ci_log_max_chars {
            problems.push(format!(
                "feedback.ci_log_keep_chars ({}) must be at most half of feedback.ci_log_max_chars ({})",
                self.feedback.ci_log_keep_chars, self.feedback.ci_log_max_chars
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation { problems })
        }
    }
}

fn resolve(repo_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        repo_root.join(path)
    }
}

fn is_valid_target_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
