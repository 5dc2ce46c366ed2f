//! Feedback driver: the side effects around the pure compiler
//!
//! Reads the scenario report, CI log, and trajectory from the factory dir,
//! writes `feedback_iter_<N>.md`, persists the counter, and appends one
//! sidecar record.

use crate::compiler::{summary_lines, FeedbackCompiler};
use crate::counter::IterationCounter;
use crate::error::{FeedbackError, FeedbackResult};
use crate::inputs::{load_ci_log, load_scenario_results};
use crate::trajectory::{append_record, load_trajectory, TrajectoryRecord};
use factory_config::{FactoryConfig, FeedbackConfig};
use std::path::{Path, PathBuf};

/// What a compile run produced
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackOutcome {
    /// Written feedback document
    pub path: PathBuf,
    pub iteration: u32,
    /// `None` when no scenario results were available
    pub satisfaction_score: Option<f64>,
    pub passed: Option<usize>,
    pub total: Option<usize>,
}

/// Compiles feedback for one factory dir
#[derive(Debug, Clone)]
pub struct FeedbackDriver {
    factory_dir: PathBuf,
    config: FeedbackConfig,
}

impl FeedbackDriver {
    #[must_use]
    pub fn new(factory_dir: impl Into<PathBuf>, config: FeedbackConfig) -> Self {
        Self {
            factory_dir: factory_dir.into(),
            config,
        }
    }

    /// Driver for the factory dir configured under `repo_root`
    #[must_use]
    pub fn from_config(config: &FactoryConfig, repo_root: &Path) -> Self {
        Self::new(config.factory_dir(repo_root), config.feedback.clone())
    }

    /// With a different factory dir
    #[inline]
    #[must_use]
    pub fn with_factory_dir(mut self, factory_dir: impl Into<PathBuf>) -> Self {
        self.factory_dir = factory_dir.into();
        self
    }

    #[must_use]
    pub fn factory_dir(&self) -> &Path {
        &self.factory_dir
    }

    #[must_use]
    pub fn counter(&self) -> IterationCounter {
        IterationCounter::in_dir(&self.factory_dir)
    }

    /// Path of the document for `iteration`
    #[must_use]
    pub fn feedback_path(&self, iteration: u32) -> PathBuf {
        self.factory_dir.join(format!("feedback_iter_{iteration}.md"))
    }

    /// Compile with a fresh timestamp
    ///
    /// # Errors
    /// Fails only when the factory dir, document, or counter cannot be written.
    pub fn compile(&self, iteration_override: Option<u32>) -> FeedbackResult<FeedbackOutcome> {
        let compiler = FeedbackCompiler::new().with_protected_paths(self.config.protected_paths.clone());
        self.compile_with(&compiler, iteration_override)
    }

    /// Compile with a caller-supplied compiler
    ///
    /// # Errors
    /// Fails only when the factory dir, document, or counter cannot be written.
    pub fn compile_with(
        &self,
        compiler: &FeedbackCompiler,
        iteration_override: Option<u32>,
    ) -> FeedbackResult<FeedbackOutcome> {
        std::fs::create_dir_all(&self.factory_dir).map_err(|e| FeedbackError::io_error(&self.factory_dir, e))?;

        let counter = self.counter();
        let iteration = iteration_override.unwrap_or_else(|| counter.next());

        let results = load_scenario_results(&self.factory_dir.join(&self.config.results_file));
        let ci_log = load_ci_log(
            &self.factory_dir.join(&self.config.ci_log_file),
            self.config.ci_log_max_chars,
            self.config.ci_log_keep_chars,
        );
        let previous = load_trajectory(&self.factory_dir);
        tracing::debug!(
            iteration,
            has_results = results.is_some(),
            previous = previous.len(),
            "Compiling feedback"
        );

        let document = compiler.compile(results.as_ref(), &ci_log, iteration, &previous);
        let path = self.feedback_path(iteration);
        std::fs::write(&path, document).map_err(|e| FeedbackError::io_error(&path, e))?;
        counter.store(iteration)?;

        let record = TrajectoryRecord {
            iteration,
            satisfaction_score: results.as_ref().map(|r| r.satisfaction_score),
            passed: results.as_ref().map(|r| r.passed),
            total: results.as_ref().map(|r| r.total),
            summary: summary_lines(results.as_ref()).join("\n"),
            generated_at: compiler.generated_at().to_string(),
        };
        if let Err(e) = append_record(&self.factory_dir, &record) {
            tracing::warn!("Trajectory sidecar not updated: {}", e);
        }

        tracing::info!("Feedback compiled: {} (iteration {})", path.display(), iteration);
        Ok(FeedbackOutcome {
            path,
            iteration,
            satisfaction_score: record.satisfaction_score,
            passed: record.passed,
            total: record.total,
        })
    }
}
