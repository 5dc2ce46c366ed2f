//! Strip and restore
//!
//! Strip removes the scenario corpus, deletes review-pack artifacts and
//! comments out the Makefile hooks, verifies the result and commits it with
//! the marker. Restore checks the corpus back out of a trusted ref, reverses
//! the Makefile comments and verifies, but never commits.

use crate::corpus::{corpus_files, CorpusFingerprint};
use crate::error::{HoldoutError, HoldoutResult};
use crate::layout::HoldoutLayout;
use crate::makefile::{comment_targets, uncomment_blocks};
use crate::state::{HoldoutOp, HoldoutState};
use crate::vcs::{GitCli, VersionControl};
use crate::verify::{verify_restored, verify_stripped};
use factory_config::FactoryConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Strip settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripOptions {
    /// Report only, change nothing
    pub dry_run: bool,
    /// Create the marker commit after a successful strip
    pub commit: bool,
}

impl Default for StripOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            commit: true,
        }
    }
}

/// What a strip removed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StripReport {
    pub removed_scenario_files: Vec<String>,
    pub removed_review_artifacts: Vec<String>,
    pub commented_targets: Vec<String>,
    /// Fingerprint of the removed corpus, `None` when nothing was there
    pub fingerprint: Option<CorpusFingerprint>,
    pub committed: bool,
    pub dry_run: bool,
}

/// Restore settings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RestoreOptions {
    /// Trusted ref, defaults to the layout's `default_ref`
    pub reference: Option<String>,
    /// Report only, change nothing
    pub dry_run: bool,
    /// Expected file count, defaults to the number of files at the ref
    pub expected_count: Option<usize>,
}

/// What a restore brought back
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RestoreReport {
    pub reference: String,
    pub restored_scenario_files: Vec<String>,
    pub restored_targets: Vec<String>,
    /// Fingerprint of the restored corpus, `None` on dry run
    pub fingerprint: Option<CorpusFingerprint>,
    /// Whether the remote was fetched first
    pub fetched: bool,
    pub dry_run: bool,
}

/// The holdout integrity gate
pub struct HoldoutGate {
    repo_root: PathBuf,
    layout: HoldoutLayout,
    vcs: Arc<dyn VersionControl>,
}

impl HoldoutGate {
    /// Gate over `repo_root` with an explicit backend
    pub fn new(repo_root: impl Into<PathBuf>, layout: HoldoutLayout, vcs: Arc<dyn VersionControl>) -> Self {
        Self {
            repo_root: repo_root.into(),
            layout,
            vcs,
        }
    }

    /// Gate backed by the `git` executable
    #[must_use]
    pub fn from_config(config: &FactoryConfig, repo_root: &Path) -> Self {
        Self::new(
            repo_root,
            HoldoutLayout::from_config(config, repo_root),
            Arc::new(GitCli::new(repo_root)),
        )
    }

    /// Paths, targets and marker in use
    #[must_use]
    pub fn layout(&self) -> &HoldoutLayout {
        &self.layout
    }

    /// Current holdout state
    ///
    /// # Errors
    /// IO or version-control errors.
    pub async fn status(&self) -> HoldoutResult<HoldoutState> {
        HoldoutState::detect(&self.repo_root, &self.layout, self.vcs.as_ref()).await
    }

    /// Remove the corpus, review artifacts and Makefile hooks
    ///
    /// # Errors
    /// - IO errors while deleting or rewriting files
    /// - `HoldoutError::VerificationFailed` if anything survived
    /// - version-control errors while committing
    pub async fn strip(&self, options: StripOptions) -> HoldoutResult<StripReport> {
        self.log_transition(HoldoutOp::Strip).await?;
        let mut report = StripReport {
            dry_run: options.dry_run,
            ..StripReport::default()
        };

        let scenarios_dir = self.repo_root.join(&self.layout.scenarios_dir);
        report.removed_scenario_files = corpus_files(&self.repo_root, &self.layout.scenarios_dir)?;
        if !report.removed_scenario_files.is_empty() {
            report.fingerprint = Some(CorpusFingerprint::compute(
                &self.repo_root,
                &report.removed_scenario_files,
            )?);
        }
        if scenarios_dir.exists() {
            if !options.dry_run {
                std::fs::remove_dir_all(&scenarios_dir).map_err(|e| HoldoutError::io_error(&scenarios_dir, e))?;
            }
        } else {
            tracing::warn!("{} not found, already stripped?", self.layout.scenarios_dir.display());
        }

        for artifact in &self.layout.review_pack_files {
            let path = self.repo_root.join(artifact);
            if path.exists() {
                if !options.dry_run {
                    std::fs::remove_file(&path).map_err(|e| HoldoutError::io_error(&path, e))?;
                }
                report.removed_review_artifacts.push(artifact.to_string_lossy().into_owned());
            }
        }

        if let Some(content) = self.read_makefile()? {
            let commented = comment_targets(&content, &self.layout.scenario_targets, &self.layout.marker);
            if !commented.targets.is_empty() && !options.dry_run {
                self.write_makefile(&commented.content)?;
            }
            report.commented_targets = commented.targets;
        }

        tracing::info!(
            "Strip: {} scenario file(s), {} review artifact(s), {} Makefile target(s){}",
            report.removed_scenario_files.len(),
            report.removed_review_artifacts.len(),
            report.commented_targets.len(),
            if options.dry_run { " (dry run)" } else { "" }
        );
        if options.dry_run {
            return Ok(report);
        }

        let failures = verify_stripped(&self.repo_root, &self.layout)?;
        if !failures.is_empty() {
            return Err(HoldoutError::VerificationFailed(failures));
        }

        if options.commit {
            self.vcs.stage_all().await?;
            if self.vcs.has_staged_changes().await? {
                self.vcs.commit(&self.strip_commit_message(&report)).await?;
                report.committed = true;
                tracing::info!("Committed strip with marker {}", self.layout.marker);
            } else {
                tracing::info!("Nothing to commit, working tree already stripped");
            }
        }

        Ok(report)
    }

    /// Bring the corpus back from a trusted ref and re-enable Makefile hooks
    ///
    /// Restored files are left unstaged for review; nothing is committed.
    ///
    /// # Errors
    /// - `HoldoutError::NothingToRestore` if the ref has no scenario files
    /// - version-control errors listing or checking out the ref
    /// - `HoldoutError::VerificationFailed` if the result is incomplete
    pub async fn restore(&self, options: RestoreOptions) -> HoldoutResult<RestoreReport> {
        self.log_transition(HoldoutOp::Restore).await?;
        let reference = options.reference.unwrap_or_else(|| self.layout.default_ref.clone());
        let mut report = RestoreReport {
            reference: reference.clone(),
            dry_run: options.dry_run,
            ..RestoreReport::default()
        };

        if self.layout.is_remote_ref(&reference) {
            match self.vcs.fetch(&self.layout.remote).await {
                Ok(()) => report.fetched = true,
                Err(e) => tracing::warn!("Fetch of '{}' failed, using local '{}': {}", self.layout.remote, reference, e),
            }
        }

        let pathspec = self.layout.scenarios_pathspec();
        let files = self.vcs.list_files(&reference, &pathspec).await?;
        if files.is_empty() {
            return Err(HoldoutError::NothingToRestore {
                reference,
                path: pathspec,
            });
        }

        if !options.dry_run {
            self.vcs.checkout_path(&reference, &pathspec).await?;
            self.vcs.unstage(&pathspec).await?;
        }
        report.restored_scenario_files = files;

        if let Some(content) = self.read_makefile()? {
            let uncommented = uncomment_blocks(&content, &self.layout.marker);
            if !uncommented.targets.is_empty() && !options.dry_run {
                self.write_makefile(&uncommented.content)?;
            }
            report.restored_targets = uncommented.targets;
        }

        tracing::info!(
            "Restore from '{}': {} scenario file(s), {} Makefile target(s){}",
            reference,
            report.restored_scenario_files.len(),
            report.restored_targets.len(),
            if options.dry_run { " (dry run)" } else { "" }
        );
        if options.dry_run {
            return Ok(report);
        }

        let expected = options.expected_count.unwrap_or(report.restored_scenario_files.len());
        let failures = verify_restored(&self.repo_root, &self.layout, Some(expected))?;
        if !failures.is_empty() {
            return Err(HoldoutError::VerificationFailed(failures));
        }

        let restored = corpus_files(&self.repo_root, &self.layout.scenarios_dir)?;
        report.fingerprint = Some(CorpusFingerprint::compute(&self.repo_root, &restored)?);
        Ok(report)
    }

    /// Marker commit message for a completed strip
    #[must_use]
    pub fn strip_commit_message(&self, report: &StripReport) -> String {
        let targets = if report.commented_targets.is_empty() {
            "none".to_string()
        } else {
            report.commented_targets.join(", ")
        };
        let fingerprint = report
            .fingerprint
            .map_or_else(|| "none".to_string(), |f| f.to_string());

        format!(
            "{marker} Strip holdout scenarios before attractor\n\n\
             Removed {files} scenario file(s) from {dir} and {artifacts} review artifact(s).\n\
             Commented out Makefile targets: {targets}\n\
             Corpus fingerprint: {fingerprint}\n\
             Restore with: dark-factory restore",
            marker = self.layout.marker,
            files = report.removed_scenario_files.len(),
            dir = self.layout.scenarios_pathspec(),
            artifacts = report.removed_review_artifacts.len(),
        )
    }

    async fn log_transition(&self, op: HoldoutOp) -> HoldoutResult<()> {
        match self.status().await {
            Ok(state) => {
                let next = state.apply(op)?;
                tracing::info!("Holdout {}: {} -> {}", op, state, next);
            }
            Err(e) => tracing::debug!("Holdout state unknown before {}: {}", op, e),
        }
        Ok(())
    }

    fn read_makefile(&self) -> HoldoutResult<Option<String>> {
        let path = self.repo_root.join(&self.layout.makefile);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HoldoutError::io_error(path, e)),
        }
    }

    fn write_makefile(&self, content: &str) -> HoldoutResult<()> {
        let path = self.repo_root.join(&self.layout.makefile);
        std::fs::write(&path, content).map_err(|e| HoldoutError::io_error(path, e))
    }
}

impl std::fmt::Debug for HoldoutGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HoldoutGate")
            .field("repo_root", &self.repo_root)
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_message_carries_marker_and_fingerprint() {
        let gate = HoldoutGate::from_config(&FactoryConfig::default(), Path::new("/repo"));
        let report = StripReport {
            removed_scenario_files: vec!["scenarios/a.md".to_string()],
            commented_targets: vec!["run-scenarios".to_string()],
            ..StripReport::default()
        };
        let message = gate.strip_commit_message(&report);
        assert!(message.starts_with("[factory:holdout-stripped] Strip holdout scenarios"));
        assert!(message.contains("Removed 1 scenario file(s) from scenarios/"));
        assert!(message.contains("Commented out Makefile targets: run-scenarios"));
        assert!(message.contains("Corpus fingerprint: none"));
    }

    #[test]
    fn default_strip_commits() {
        let options = StripOptions::default();
        assert!(options.commit);
        assert!(!options.dry_run);
    }
}
