//! Feedback inputs: the scenario report and the CI log

use factory_scenario::{load_report, ScenarioError, ScenarioReport};
use std::path::Path;

/// Stand-in text when no CI log exists
pub const NO_CI_LOG: &str = "(no CI log available)";

/// Marker inserted where a long log was cut
pub const TRUNCATION_MARKER: &str = "\n\n... [truncated] ...\n\n";

/// Scenario report, or `None` when absent, unreadable or empty
#[must_use]
pub fn load_scenario_results(path: &Path) -> Option<ScenarioReport> {
    match load_report(path) {
        Ok(report) if report.total == 0 && report.results.is_empty() => {
            tracing::info!("Scenario results at {} are empty", path.display());
            None
        }
        Ok(report) => Some(report),
        Err(ScenarioError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No scenario results at {}", path.display());
            None
        }
        Err(e) => {
            tracing::warn!("Treating scenario results as absent: {}", e);
            None
        }
    }
}

/// CI log text, head and tail kept when longer than `max_chars`
#[must_use]
pub fn load_ci_log(path: &Path, max_chars: usize, keep_chars: usize) -> String {
    match std::fs::read(path) {
        Ok(bytes) => truncate_log(&String::from_utf8_lossy(&bytes), max_chars, keep_chars),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("CI log {} unreadable: {}", path.display(), e);
            }
            NO_CI_LOG.to_string()
        }
    }
}

/// First and last `keep_chars` characters around a marker, if over `max_chars`
#[must_use]
pub fn truncate_log(log: &str, max_chars: usize, keep_chars: usize) -> String {
    let length = log.chars().count();
    if length <= max_chars {
        return log.to_string();
    }
    let head = factory_scenario::output::head_chars(log, keep_chars);
    let tail = factory_scenario::tail_chars(log, keep_chars);
    format!("{head}{TRUNCATION_MARKER}{tail}")
}

/// Whether a log string is real content worth rendering
#[must_use]
pub fn is_real_log(log: &str) -> bool {
    !log.is_empty() && log != NO_CI_LOG
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn missing_results_are_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_scenario_results(&dir.path().join("scenario_results.json")).is_none());
    }

    #[test]
    fn malformed_results_are_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario_results.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(load_scenario_results(&path).is_none());
    }

    #[test]
    fn empty_results_are_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario_results.json");
        std::fs::write(&path, "{}").unwrap();
        assert!(load_scenario_results(&path).is_none());
    }

    #[test]
    fn legacy_results_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario_results.json");
        std::fs::write(
            &path,
            r#"{"total": 12, "passed": 8, "failed": 4, "satisfaction_score": 0.6667, "results": [{"name": "a", "passed": true}]}"#,
        )
        .unwrap();
        let report = load_scenario_results(&path).unwrap();
        assert_eq!(report.total, 12);
        assert!(report.satisfaction_score > 0.66 && report.satisfaction_score < 0.67);
    }

    #[test]
    fn missing_log_is_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let log = load_ci_log(&dir.path().join("ci_output.log"), 10_000, 5_000);
        assert_eq!(log, NO_CI_LOG);
        assert!(!is_real_log(&log));
    }

    #[test]
    fn short_log_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ci_output.log");
        std::fs::write(&path, "line1\nline2\nline3").unwrap();
        assert_eq!(load_ci_log(&path, 10_000, 5_000), "line1\nline2\nline3");
    }

    #[test]
    fn long_log_keeps_both_ends() {
        let log = format!("{}MIDDLE{}", "A".repeat(5000), "Z".repeat(5001));
        let truncated = truncate_log(&log, 10_000, 5_000);
        assert!(truncated.contains("[truncated]"));
        assert!(!truncated.contains("MIDDLE"));
        assert!(truncated.starts_with('A'));
        assert!(truncated.ends_with('Z'));
        assert_eq!(truncated.chars().count(), 10_000 + TRUNCATION_MARKER.chars().count());
    }

    #[test]
    fn boundary_length_is_kept() {
        let log = "x".repeat(10_000);
        assert_eq!(truncate_log(&log, 10_000, 5_000), log);
    }

    proptest! {
        #[test]
        fn prop_truncation_is_bounded(log in "\\PC{0,400}", keep in 1usize..50) {
            let max = keep * 2;
            let out = truncate_log(&log, max, keep);
            let length = log.chars().count();
            if length <= max {
                prop_assert_eq!(out, log);
            } else {
                prop_assert_eq!(out.chars().count(), max + TRUNCATION_MARKER.chars().count());
                prop_assert!(log.starts_with(out.split(TRUNCATION_MARKER).next().unwrap_or_default()));
            }
        }
    }
}
