//! Report artifact I/O

use crate::error::{RunResult, ScenarioError};
use crate::model::ScenarioReport;
use std::path::Path;

/// Write a report as pretty JSON, creating parent directories
///
/// Any existing report at `path` is overwritten.
///
/// # Errors
/// Returns `ScenarioError::ReportWrite` if the directory or file cannot be written.
pub fn write_report(report: &ScenarioReport, path: &Path) -> RunResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ScenarioError::ReportWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    std::fs::write(path, json).map_err(|source| ScenarioError::ReportWrite {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Report written to {}", path.display());
    Ok(())
}

/// Read a report written by [`write_report`] or an older runner
///
/// # Errors
/// - `ScenarioError::Io` if the file cannot be read
/// - `ScenarioError::MalformedReport` if it is not a report
pub fn load_report(path: &Path) -> RunResult<ScenarioReport> {
    let raw = std::fs::read_to_string(path).map_err(|e| ScenarioError::io_error(path, e))?;
    serde_json::from_str(&raw).map_err(|source| ScenarioError::MalformedReport {
        path: path.to_path_buf(),
        source,
    })
}
