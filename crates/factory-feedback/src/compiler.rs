//! Feedback document assembly
//!
//! [`FeedbackCompiler::compile`] is pure: inputs in, markdown out. Section
//! order is fixed:
//!
//! 1. header
//! 2. summary
//! 3. convergence trajectory, if any earlier iteration exists
//! 4. likely root causes, if results exist
//! 5. failed scenario details, if any scenario failed
//! 6. CI log, if a real log was supplied
//! 7. instructions for the coding agent

use crate::causes::{classify, infer_causes, CauseBucket, RootCause};
use crate::inputs::is_real_log;
use crate::trajectory::TrajectoryEntry;
use factory_config::FeedbackConfig;
use factory_scenario::{ScenarioReport, ScenarioResult};

const NO_RESULTS_LINE: &str =
    "- **No scenario results available** — scenarios did not run (likely Layer 1 failure)";

/// Renders feedback documents
#[derive(Debug, Clone)]
pub struct FeedbackCompiler {
    generated_at: String,
    protected_paths: Vec<String>,
}

impl Default for FeedbackCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackCompiler {
    /// Compiler stamped with the current UTC time
    #[must_use]
    pub fn new() -> Self {
        Self {
            generated_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            protected_paths: FeedbackConfig::default().protected_paths,
        }
    }

    /// With a fixed generation stamp
    #[inline]
    #[must_use]
    pub fn with_generated_at(mut self, generated_at: impl Into<String>) -> Self {
        self.generated_at = generated_at.into();
        self
    }

    /// With the paths the agent must not touch
    #[inline]
    #[must_use]
    pub fn with_protected_paths(mut self, paths: Vec<String>) -> Self {
        self.protected_paths = paths;
        self
    }

    #[must_use]
    pub fn generated_at(&self) -> &str {
        &self.generated_at
    }

    /// Render the full document
    #[must_use]
    pub fn compile(
        &self,
        results: Option<&ScenarioReport>,
        ci_log: &str,
        iteration: u32,
        previous: &[TrajectoryEntry],
    ) -> String {
        let mut out: Vec<String> = Vec::new();

        out.push(format!("# Factory Feedback — Iteration {iteration}"));
        out.push(format!("Generated: {}", self.generated_at));
        out.push(String::new());

        out.push("## Summary".to_string());
        out.extend(summary_lines(results));
        out.push(String::new());

        if !previous.is_empty() {
            out.push("## Convergence Trajectory".to_string());
            out.push("| Iteration | Summary |".to_string());
            out.push("|-----------|---------|".to_string());
            for entry in previous {
                out.push(format!("| {} | {} |", entry.iteration, entry.headline()));
            }
            out.push(String::new());
        }

        let buckets = results.map(classify).unwrap_or_default();

        if let Some(report) = results {
            out.push("## Likely Root Causes".to_string());
            for (i, cause) in infer_causes(report).iter().enumerate() {
                out.push(format!("{}. {cause}", i + 1));
            }
            out.push(String::new());

            let mut failures = report.failures().peekable();
            if failures.peek().is_some() {
                out.push("## Failed Scenarios — Full Details".to_string());
                out.push(String::new());
                for result in failures {
                    push_failure(&mut out, result);
                }
            }
        }

        if is_real_log(ci_log) {
            out.push("## CI Log Output".to_string());
            out.push(format!("```\n{ci_log}\n```"));
            out.push(String::new());
        }

        out.push("## Instructions for Coding Agent".to_string());
        out.push(String::new());
        out.push("Fix the failures above. Priorities:".to_string());
        out.extend(priority_ladder(&buckets));
        out.push(String::new());
        out.push("Constraints:".to_string());
        if !self.protected_paths.is_empty() {
            out.push(format!("- Do NOT modify {}", join_or(&self.protected_paths)));
        }
        out.push("- Do NOT modify /specs/ — read them as requirements".to_string());
        out.push("- Keep changes minimal — fix what's broken, don't refactor".to_string());
        out.push(String::new());

        out.join("\n")
    }
}

/// Compile with a fresh [`FeedbackCompiler`]
#[must_use]
pub fn compile_feedback(
    results: Option<&ScenarioReport>,
    ci_log: &str,
    iteration: u32,
    previous: &[TrajectoryEntry],
) -> String {
    FeedbackCompiler::new().compile(results, ci_log, iteration, previous)
}

/// Lines under `## Summary`
#[must_use]
pub fn summary_lines(results: Option<&ScenarioReport>) -> Vec<String> {
    match results {
        Some(report) => vec![
            format!(
                "- **Satisfaction score: {}** ({}/{} scenarios passed)",
                percent(report.satisfaction_score),
                report.passed,
                report.total
            ),
            format!(
                "- Passed: {} | Failed: {} | Total: {}",
                report.passed, report.failed, report.total
            ),
        ],
        None => vec![NO_RESULTS_LINE.to_string()],
    }
}

/// Whole-number percentage
#[must_use]
pub fn percent(score: f64) -> String {
    format!("{:.0}%", score * 100.0)
}

fn push_failure(out: &mut Vec<String>, result: &ScenarioResult) {
    out.push(format!("### {}", or_default(&result.name, "Unknown")));
    out.push(format!("**Category:** {}", or_default(&result.category, "unknown")));
    out.push(format!("**Exit code:** {}", result.exit_code));
    out.push(format!("**Duration:** {}s", seconds(result.duration_seconds)));
    out.push(format!("**Error summary:** {}", or_default(&result.error_summary, "N/A")));
    out.push(String::new());

    for (label, stream) in [("stderr", &result.stderr), ("stdout", &result.stdout)] {
        let trimmed = stream.trim();
        if !trimmed.is_empty() {
            out.push(format!("**{label}:**"));
            out.push(format!("```\n{trimmed}\n```"));
        }
    }
    out.push(String::new());
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

// Whole seconds keep one decimal: 12.0 renders as "12.0", not "12".
fn seconds(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

fn join_or(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{first} or {second}"),
        [init @ .., last] => format!("{}, or {last}", init.join(", ")),
    }
}

/// Numbered fix priorities, detected causes promoted to the top
fn priority_ladder(buckets: &[CauseBucket]) -> Vec<String> {
    let detected = |cause: RootCause| buckets.iter().find(|b| b.cause == cause);

    let mut ordered: Vec<(RootCause, Option<&CauseBucket>)> = RootCause::PRIORITY_ORDER
        .iter()
        .filter_map(|&cause| detected(cause).map(|bucket| (cause, Some(bucket))))
        .collect();
    ordered.extend(
        RootCause::PRIORITY_ORDER
            .iter()
            .filter(|&&cause| detected(cause).is_none())
            .map(|&cause| (cause, None)),
    );

    let last = ordered.len().saturating_sub(1);
    ordered
        .into_iter()
        .enumerate()
        .map(|(i, (cause, bucket))| {
            let rank = match i {
                0 => "first",
                i if i == last => "last",
                _ => "next",
            };
            match bucket {
                Some(bucket) => format!(
                    "{}. {} {rank} (seen in: {})",
                    i + 1,
                    cause.priority_text(),
                    bucket.scenarios.join(", ")
                ),
                None => format!("{}. {} {rank}", i + 1, cause.priority_text()),
            }
        })
        .collect()
}
