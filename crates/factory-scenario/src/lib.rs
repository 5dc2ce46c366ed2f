//! Factory Scenario - holdout scenario evaluation
//!
//! Parses structured markdown scenarios, executes each evaluation method as a
//! shell subprocess with a hard timeout, and aggregates the verdicts into a
//! [`ScenarioReport`] whose satisfaction score is the convergence metric of
//! the factory loop.
//!
//! # Pipeline
//!
//! ```text
//! scenarios/*.md ──▶ ScenarioParser ──▶ ScenarioExecutor ──▶ ScenarioReport
//!                     (heading scan)     (bash -c, timeout)   (scenario_results.json)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use factory_scenario::{RunnerOptions, ScenarioRunner};
//!
//! let runner = ScenarioRunner::new(RunnerOptions::new("scenarios", "."));
//! let report = runner.run_and_write("artifacts/factory/scenario_results.json".as_ref(), |_| {}).await?;
//! println!("{}/{}", report.passed, report.total);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod executor;
pub mod model;
pub mod output;
pub mod parser;
pub mod report;
pub mod runner;

pub use error::{RunResult, ScenarioError};
pub use executor::ScenarioExecutor;
pub use model::{
    satisfaction_score, utc_timestamp, Scenario, ScenarioReport, ScenarioResult, EXIT_INTERNAL_ERROR,
    EXIT_TIMEOUT,
};
pub use output::{summarize_error, tail_chars, UNKNOWN_ERROR};
pub use parser::{ScenarioParser, Section};
pub use report::{load_report, write_report};
pub use runner::{discover_scenario_files, Progress, RunnerOptions, ScenarioRunner};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
