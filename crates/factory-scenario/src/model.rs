//! Scenario document model
//!
//! - [`Scenario`]: one parsed holdout acceptance test
//! - [`ScenarioResult`]: one execution of one scenario
//! - [`ScenarioReport`]: a complete run, serialized as `scenario_results.json`

use serde::{Deserialize, Serialize};

/// Exit code recorded when a scenario exceeds its timeout
pub const EXIT_TIMEOUT: i32 = -1;

/// Exit code recorded when the scenario could not be executed at all
pub const EXIT_INTERNAL_ERROR: i32 = -2;

/// A parsed holdout scenario
///
/// Only `evaluation_method` is executed. The remaining text sections are
/// documentation carried along for reviewers and dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Name from `# Scenario: <name>`, or the file stem
    pub name: String,
    /// Source document, for traceability
    pub file_path: String,
    /// Lowercased free-form tag used for filtering
    pub category: String,
    /// Informational preconditions
    pub preconditions: Vec<String>,
    /// Expected behavior under test
    pub behavioral_expectation: String,
    /// Shell command that decides pass/fail by exit code
    pub evaluation_method: String,
    /// Human-readable pass criteria
    pub pass_criteria: String,
    /// Evidence descriptors
    pub evidence_required: Vec<String>,
}

impl Scenario {
    /// Create a scenario with just a name and a command
    #[must_use]
    pub fn new(name: impl Into<String>, evaluation_method: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            evaluation_method: evaluation_method.into(),
            ..Self::default()
        }
    }

    /// With category (normalized the same way the parser does)
    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.trim().to_lowercase();
        self
    }

    /// With source path
    #[inline]
    #[must_use]
    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = path.into();
        self
    }
}

/// Outcome of executing one scenario once
///
/// `passed` is true iff `exit_code == 0`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioResult {
    pub name: String,
    pub file_path: String,
    pub category: String,
    pub passed: bool,
    /// Process exit code, or [`EXIT_TIMEOUT`] / [`EXIT_INTERNAL_ERROR`]
    pub exit_code: i32,
    /// Tail of captured stdout
    pub stdout: String,
    /// Tail of captured stderr
    pub stderr: String,
    /// Wall-clock time, two decimals
    pub duration_seconds: f64,
    /// Best-guess diagnostic line, empty when passed
    pub error_summary: String,
}

impl ScenarioResult {
    /// Start a result carrying the scenario's identity
    #[must_use]
    pub fn for_scenario(scenario: &Scenario) -> Self {
        Self {
            name: scenario.name.clone(),
            file_path: scenario.file_path.clone(),
            category: scenario.category.clone(),
            ..Self::default()
        }
    }

    /// Captured stdout followed by stderr
    #[must_use]
    pub fn combined_output(&self) -> String {
        let mut combined = String::with_capacity(self.stdout.len() + self.stderr.len());
        combined.push_str(&self.stdout);
        combined.push_str(&self.stderr);
        combined
    }

    /// Whether the scenario was killed by the timeout
    #[inline]
    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.exit_code == EXIT_TIMEOUT
    }
}

/// Summary of one run over the scenario corpus
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioReport {
    /// UTC generation time, `YYYY-MM-DDTHH:MM:SSZ`
    pub timestamp: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Reserved; always zero for reports built by the runner
    pub skipped: usize,
    /// `passed / total`, four decimals, 0.0 when empty
    pub satisfaction_score: f64,
    /// In discovery order
    pub results: Vec<ScenarioResult>,
}

impl ScenarioReport {
    /// Aggregate results into a report
    #[must_use]
    pub fn from_results(results: Vec<ScenarioResult>, timestamp: impl Into<String>) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        let failed = results.len() - passed;
        let total = results.len();

        Self {
            timestamp: timestamp.into(),
            total,
            passed,
            failed,
            skipped: 0,
            satisfaction_score: satisfaction_score(passed, total),
            results,
        }
    }

    /// Failing results in report order
    pub fn failures(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    /// No scenario failed
    #[inline]
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Fraction of scenarios passed, rounded to four decimals
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn satisfaction_score(passed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(passed as f64 / total as f64, 4)
}

/// Round half away from zero to `places` decimals
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Current UTC time in report format
#[must_use]
pub fn utc_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
