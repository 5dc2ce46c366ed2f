//! Convergence trajectory reconstruction
//!
//! Two sources, merged by iteration number:
//! - legacy `feedback_iter_<N>.md` documents, keyed by the number in the
//!   file name, summarized by the first line under `## Summary`
//! - `trajectory.jsonl`, one structured record per compiled iteration,
//!   which wins when both describe the same iteration

use crate::error::{FeedbackError, FeedbackResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sidecar file name inside the factory dir
pub const TRAJECTORY_FILE: &str = "trajectory.jsonl";

static FEEDBACK_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^feedback_iter_([0-9]+)\.md$").expect("feedback file pattern is valid"));

/// One prior iteration in the trajectory table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrajectoryEntry {
    pub iteration: u32,
    /// Summary text; the table shows its first line
    pub summary: String,
}

impl TrajectoryEntry {
    #[must_use]
    pub fn new(iteration: u32, summary: impl Into<String>) -> Self {
        Self {
            iteration,
            summary: summary.into(),
        }
    }

    /// First line of the summary, empty if there is none
    #[must_use]
    pub fn headline(&self) -> &str {
        self.summary.lines().next().unwrap_or("")
    }
}

/// Structured sidecar record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryRecord {
    pub iteration: u32,
    #[serde(default)]
    pub satisfaction_score: Option<f64>,
    #[serde(default)]
    pub passed: Option<usize>,
    #[serde(default)]
    pub total: Option<usize>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub generated_at: String,
}

/// Text between the first `## Summary` heading and the next `## ` heading, trimmed
#[must_use]
pub fn extract_summary(document: &str) -> String {
    let mut lines = document.lines();
    if !lines.any(|line| line.starts_with("## Summary")) {
        return String::new();
    }
    lines
        .take_while(|line| !line.starts_with("## "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Iteration number encoded in a feedback file name
#[must_use]
pub fn iteration_from_file_name(name: &str) -> Option<u32> {
    FEEDBACK_FILE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Previous feedback documents, in numeric iteration order
#[must_use]
pub fn read_feedback_documents(factory_dir: &Path) -> Vec<TrajectoryEntry> {
    let Ok(entries) = std::fs::read_dir(factory_dir) else {
        return Vec::new();
    };

    let mut found: Vec<(u32, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name();
            iteration_from_file_name(&name.to_string_lossy()).map(|n| (n, entry.path()))
        })
        .collect();
    found.sort();

    found
        .into_iter()
        .filter_map(|(iteration, path)| match std::fs::read(&path) {
            Ok(bytes) => Some(TrajectoryEntry::new(
                iteration,
                extract_summary(&String::from_utf8_lossy(&bytes)),
            )),
            Err(e) => {
                tracing::warn!("Skipping unreadable feedback {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

/// Sidecar records, skipping malformed lines
#[must_use]
pub fn read_sidecar(factory_dir: &Path) -> Vec<TrajectoryRecord> {
    let path = factory_dir.join(TRAJECTORY_FILE);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!("Ignoring unreadable trajectory {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(number, line)| match serde_json::from_str(line) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping malformed trajectory line {}: {}", number + 1, e);
                None
            }
        })
        .collect()
}

/// Append one record to the sidecar
///
/// # Errors
/// IO or serialization errors.
pub fn append_record(factory_dir: &Path, record: &TrajectoryRecord) -> FeedbackResult<()> {
    let path = factory_dir.join(TRAJECTORY_FILE);
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| FeedbackError::io_error(&path, e))?;
    file.write_all(line.as_bytes())
        .map_err(|e| FeedbackError::io_error(&path, e))
}

/// Full trajectory: legacy documents overlaid with sidecar records
#[must_use]
pub fn load_trajectory(factory_dir: &Path) -> Vec<TrajectoryEntry> {
    let mut merged: BTreeMap<u32, TrajectoryEntry> = BTreeMap::new();
    for entry in read_feedback_documents(factory_dir) {
        merged.insert(entry.iteration, entry);
    }
    for record in read_sidecar(factory_dir) {
        merged.insert(record.iteration, TrajectoryEntry::new(record.iteration, record.summary));
    }
    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Factory Feedback — Iteration 3\nGenerated: x\n\n## Summary\n- **Satisfaction score: 40%** (4/10 scenarios passed)\n- Passed: 4 | Failed: 6 | Total: 10\n\n## Likely Root Causes\n1. Something.\n";

    #[test]
    fn summary_stops_at_next_heading() {
        assert_eq!(
            extract_summary(DOC),
            "- **Satisfaction score: 40%** (4/10 scenarios passed)\n- Passed: 4 | Failed: 6 | Total: 10"
        );
    }

    #[test]
    fn missing_summary_is_empty() {
        assert_eq!(extract_summary("# Title\n\n## Other\ntext\n"), "");
        assert_eq!(TrajectoryEntry::new(1, "").headline(), "");
    }

    #[test]
    fn headline_is_first_line() {
        let entry = TrajectoryEntry::new(3, extract_summary(DOC));
        assert_eq!(entry.headline(), "- **Satisfaction score: 40%** (4/10 scenarios passed)");
    }

    #[test]
    fn file_names_parse_numerically() {
        assert_eq!(iteration_from_file_name("feedback_iter_10.md"), Some(10));
        assert_eq!(iteration_from_file_name("feedback_iter_007.md"), Some(7));
        assert_eq!(iteration_from_file_name("feedback_iter_x.md"), None);
        assert_eq!(iteration_from_file_name("feedback_iter_1.md.bak"), None);
        assert_eq!(iteration_from_file_name("iteration_count.txt"), None);
    }

    #[test]
    fn documents_sort_by_number() {
        let dir = tempfile::tempdir().unwrap();
        for n in [10, 9, 2] {
            std::fs::write(dir.path().join(format!("feedback_iter_{n}.md")), DOC).unwrap();
        }
        std::fs::write(dir.path().join("feedback_iter_draft.md"), DOC).unwrap();

        let iterations: Vec<u32> = read_feedback_documents(dir.path()).iter().map(|e| e.iteration).collect();
        assert_eq!(iterations, vec![2, 9, 10]);
    }

    #[test]
    fn sidecar_overlays_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("feedback_iter_1.md"), DOC).unwrap();
        std::fs::write(dir.path().join("feedback_iter_2.md"), DOC).unwrap();
        append_record(
            dir.path(),
            &TrajectoryRecord {
                iteration: 2,
                satisfaction_score: Some(0.5),
                passed: Some(5),
                total: Some(10),
                summary: "structured".to_string(),
                generated_at: "now".to_string(),
            },
        )
        .unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(dir.path().join(TRAJECTORY_FILE))
            .unwrap()
            .write_all(b"{not json\n")
            .unwrap();

        let trajectory = load_trajectory(dir.path());
        assert_eq!(trajectory.len(), 2);
        assert!(trajectory[0].summary.starts_with("- **Satisfaction score: 40%**"));
        assert_eq!(trajectory[1], TrajectoryEntry::new(2, "structured"));
    }

    #[test]
    fn missing_dir_has_no_trajectory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_trajectory(&dir.path().join("absent")).is_empty());
    }
}
