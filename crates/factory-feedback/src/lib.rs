//! Factory Feedback - convergence guidance for the coding agent
//!
//! Turns a finished [`ScenarioReport`](factory_scenario::ScenarioReport), the
//! CI log, and the history of earlier iterations into one prioritized markdown
//! document per iteration.
//!
//! - [`causes`]: substring-signature root-cause buckets
//! - [`trajectory`]: earlier iterations, from legacy documents and a JSONL sidecar
//! - [`compiler`]: the pure document renderer
//! - [`driver`]: file I/O and the persisted iteration counter

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod causes;
pub mod compiler;
pub mod counter;
pub mod driver;
pub mod error;
pub mod inputs;
pub mod trajectory;

pub use causes::{classify, infer_causes, CauseBucket, RootCause, NO_CLEAR_PATTERN};
pub use compiler::{compile_feedback, percent, summary_lines, FeedbackCompiler};
pub use counter::{IterationCounter, COUNTER_FILE};
pub use driver::{FeedbackDriver, FeedbackOutcome};
pub use error::{FeedbackError, FeedbackResult};
pub use inputs::{load_ci_log, load_scenario_results, truncate_log, NO_CI_LOG};
pub use trajectory::{load_trajectory, TrajectoryEntry, TrajectoryRecord, TRAJECTORY_FILE};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
