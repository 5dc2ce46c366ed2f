//! What the gate strips and where it restores from

use factory_config::{FactoryConfig, DEFAULT_MARKER};
use std::path::{Path, PathBuf};

/// Repository-relative description of the holdout surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldoutLayout {
    /// Scenario corpus directory
    pub scenarios_dir: PathBuf,
    /// Makefile carrying scenario hooks
    pub makefile: PathBuf,
    /// Files deleted on strip and never restored
    pub review_pack_files: Vec<PathBuf>,
    /// Makefile targets commented out on strip
    pub scenario_targets: Vec<String>,
    /// Marker for commits and comment blocks
    pub marker: String,
    /// Default trusted ref for restore
    pub default_ref: String,
    /// Remote whose tracking refs are fetched before restore
    pub remote: String,
}

impl Default for HoldoutLayout {
    fn default() -> Self {
        Self::from_config(&FactoryConfig::default(), Path::new(""))
    }
}

impl HoldoutLayout {
    /// Layout from config; absolute paths inside `repo_root` are made relative
    #[must_use]
    pub fn from_config(config: &FactoryConfig, repo_root: &Path) -> Self {
        let relative = |path: &Path| path.strip_prefix(repo_root).unwrap_or(path).to_path_buf();
        let marker = if config.holdout.marker.is_empty() {
            DEFAULT_MARKER.to_string()
        } else {
            config.holdout.marker.clone()
        };

        Self {
            scenarios_dir: relative(&config.paths.scenarios_dir),
            makefile: relative(&config.paths.makefile),
            review_pack_files: config.holdout.review_pack_files.iter().map(|p| relative(p)).collect(),
            scenario_targets: config.holdout.scenario_targets.clone(),
            marker,
            default_ref: config.holdout.default_ref.clone(),
            remote: config.holdout.remote.clone(),
        }
    }

    /// Scenario directory as a version-control pathspec (`scenarios/`)
    #[must_use]
    pub fn scenarios_pathspec(&self) -> String {
        let mut spec = self.scenarios_dir.to_string_lossy().replace('\\', "/");
        if !spec.ends_with('/') {
            spec.push('/');
        }
        spec
    }

    /// Whether `reference` is a tracking ref of the configured remote
    #[must_use]
    pub fn is_remote_ref(&self, reference: &str) -> bool {
        if self.remote.is_empty() {
            return false;
        }
        let short = format!("{}/", self.remote);
        let full = format!("refs/remotes/{}/", self.remote);
        reference.starts_with(&short) || reference.starts_with(&full)
    }
}
