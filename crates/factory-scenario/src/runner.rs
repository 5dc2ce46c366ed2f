//! Scenario runner and report aggregation
//!
//! Discovers `*.md` files in lexicographic order, optionally filters by
//! category, then executes each scenario sequentially. Scenarios may share
//! filesystem state, so they are never run concurrently.

use crate::error::{RunResult, ScenarioError};
use crate::executor::ScenarioExecutor;
use crate::model::{utc_timestamp, Scenario, ScenarioReport, ScenarioResult};
use crate::parser::ScenarioParser;
use crate::report::write_report;
use factory_config::FactoryConfig;
use std::path::{Path, PathBuf};

/// Inputs for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Directory holding scenario documents
    pub scenarios_dir: PathBuf,
    /// Working directory for every evaluation method
    pub repo_root: PathBuf,
    /// Per-scenario timeout
    pub timeout_secs: u64,
    /// Case-insensitive exact category filter
    pub category: Option<String>,
}

impl RunnerOptions {
    /// Options with the default 300s timeout and no filter
    #[must_use]
    pub fn new(scenarios_dir: impl Into<PathBuf>, repo_root: impl Into<PathBuf>) -> Self {
        Self {
            scenarios_dir: scenarios_dir.into(),
            repo_root: repo_root.into(),
            timeout_secs: factory_config::RunnerConfig::default().timeout_secs,
            category: None,
        }
    }
}

/// Progress events emitted while a run is under way
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    /// About to execute scenario `index` (1-based) of `total`
    Started {
        index: usize,
        total: usize,
        scenario: &'a Scenario,
    },
    /// Scenario `index` finished
    Finished {
        index: usize,
        total: usize,
        result: &'a ScenarioResult,
    },
}

/// Sequential scenario runner
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    options: RunnerOptions,
    executor: ScenarioExecutor,
}

impl ScenarioRunner {
    /// Runner with a default executor
    #[must_use]
    pub fn new(options: RunnerOptions) -> Self {
        Self {
            options,
            executor: ScenarioExecutor::new(),
        }
    }

    /// Runner taking directories, timeout and executor settings from config
    #[must_use]
    pub fn from_config(config: &FactoryConfig, repo_root: &Path) -> Self {
        let options = RunnerOptions {
            scenarios_dir: config.scenarios_dir(repo_root),
            repo_root: repo_root.to_path_buf(),
            timeout_secs: config.runner.timeout_secs,
            category: None,
        };
        Self {
            options,
            executor: ScenarioExecutor::from_config(&config.runner),
        }
    }

    /// With a category filter
    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.options.category = Some(category.into());
        self
    }

    /// With a custom executor
    #[inline]
    #[must_use]
    pub fn with_executor(mut self, executor: ScenarioExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Current options
    #[must_use]
    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    /// Mutable options, for CLI overrides
    pub fn options_mut(&mut self) -> &mut RunnerOptions {
        &mut self.options
    }

    /// Scenario files in lexicographic order
    ///
    /// Only top-level `*.md` files are considered; dotfiles are skipped.
    ///
    /// # Errors
    /// - `ScenarioError::NoScenarioFiles` if the directory is missing or holds none
    /// - `ScenarioError::Io` if the directory cannot be listed
    pub fn discover(&self) -> RunResult<Vec<PathBuf>> {
        discover_scenario_files(&self.options.scenarios_dir)
    }

    /// Discover, parse and filter scenarios
    ///
    /// Every file is parsed before filtering, so an unreadable file aborts
    /// the run even when its category would have been filtered out.
    ///
    /// # Errors
    /// Discovery and read errors, or `ScenarioError::CategoryNotFound`.
    pub fn load(&self) -> RunResult<Vec<Scenario>> {
        let mut scenarios = self
            .discover()?
            .iter()
            .map(|path| ScenarioParser::parse_file(path))
            .collect::<RunResult<Vec<_>>>()?;

        if let Some(category) = &self.options.category {
            let wanted = category.trim().to_lowercase();
            let mut available: Vec<String> = scenarios.iter().map(|s| s.category.clone()).collect();
            available.sort();
            available.dedup();

            scenarios.retain(|s| s.category == wanted);
            if scenarios.is_empty() {
                return Err(ScenarioError::CategoryNotFound {
                    category: category.clone(),
                    available,
                });
            }
        }

        Ok(scenarios)
    }

    /// Run every selected scenario and aggregate the report
    ///
    /// # Errors
    /// Same as [`ScenarioRunner::load`]. Scenario failures are report data.
    pub async fn run(&self) -> RunResult<ScenarioReport> {
        self.run_with_progress(|_| {}).await
    }

    /// Run with a callback receiving per-scenario progress
    ///
    /// # Errors
    /// Same as [`ScenarioRunner::load`].
    pub async fn run_with_progress<F>(&self, mut on_progress: F) -> RunResult<ScenarioReport>
    where
        F: FnMut(Progress<'_>),
    {
        let scenarios = self.load()?;
        let total = scenarios.len();
        tracing::info!(
            "Running {} scenario(s) from {}",
            total,
            self.options.scenarios_dir.display()
        );

        let mut results = Vec::with_capacity(total);
        for (offset, scenario) in scenarios.iter().enumerate() {
            let index = offset + 1;
            on_progress(Progress::Started { index, total, scenario });

            let result = self
                .executor
                .execute(scenario, self.options.timeout_secs, &self.options.repo_root)
                .await;
            tracing::info!(
                "Scenario '{}' {} in {:.2}s",
                result.name,
                if result.passed { "passed" } else { "failed" },
                result.duration_seconds
            );

            on_progress(Progress::Finished {
                index,
                total,
                result: &result,
            });
            results.push(result);
        }

        let report = ScenarioReport::from_results(results, utc_timestamp());
        tracing::info!(
            "Satisfaction {}/{} ({:.4})",
            report.passed,
            report.total,
            report.satisfaction_score
        );
        Ok(report)
    }

    /// Run, then write the report to `output`
    ///
    /// # Errors
    /// Load errors, or `ScenarioError::ReportWrite`.
    pub async fn run_and_write<F>(&self, output: &Path, on_progress: F) -> RunResult<ScenarioReport>
    where
        F: FnMut(Progress<'_>),
    {
        let report = self.run_with_progress(on_progress).await?;
        write_report(&report, output)?;
        Ok(report)
    }
}

/// Top-level `*.md` files in `dir`, sorted by file name
///
/// # Errors
/// `ScenarioError::NoScenarioFiles` when nothing is found (including a
/// missing directory), `ScenarioError::Io` when listing fails.
pub fn discover_scenario_files(dir: &Path) -> RunResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ScenarioError::NoScenarioFiles { dir: dir.to_path_buf() });
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| ScenarioError::io_error(dir, e))? {
        let entry = entry.map_err(|e| ScenarioError::io_error(dir, e))?;
        let path = entry.path();
        let is_markdown = path.extension().is_some_and(|ext| ext == "md");
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if is_markdown && !hidden && path.is_file() {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(ScenarioError::NoScenarioFiles { dir: dir.to_path_buf() });
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
