//! Persisted iteration counter
//!
//! A bare integer in `iteration_count.txt`. The file is advisory: a missing or
//! corrupt counter reads as zero instead of failing the pipeline.

use crate::error::{FeedbackError, FeedbackResult};
use std::path::{Path, PathBuf};

/// Counter file name inside the factory dir
pub const COUNTER_FILE: &str = "iteration_count.txt";

/// Iteration counter owned by the feedback driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationCounter {
    path: PathBuf,
}

impl IterationCounter {
    /// Counter stored in `factory_dir`
    #[must_use]
    pub fn in_dir(factory_dir: &Path) -> Self {
        Self {
            path: factory_dir.join(COUNTER_FILE),
        }
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last completed iteration, 0 if absent or unparseable
    #[must_use]
    pub fn current(&self) -> u32 {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return 0,
            Err(e) => {
                tracing::warn!("Iteration counter {} unreadable, resetting: {}", self.path.display(), e);
                return 0;
            }
        };
        match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(
                    "Iteration counter {} holds {:?}, resetting to 0",
                    self.path.display(),
                    raw.trim()
                );
                0
            }
        }
    }

    /// Iteration to compile next
    #[must_use]
    pub fn next(&self) -> u32 {
        self.current().saturating_add(1)
    }

    /// Persist `iteration` as the last completed iteration
    ///
    /// # Errors
    /// Returns an IO error if the file cannot be written.
    pub fn store(&self, iteration: u32) -> FeedbackResult<()> {
        std::fs::write(&self.path, format!("{iteration}\n")).map_err(|e| FeedbackError::io_error(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let counter = IterationCounter::in_dir(dir.path());
        assert_eq!(counter.current(), 0);
        assert_eq!(counter.next(), 1);
    }

    #[test]
    fn reads_trimmed_integer() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(COUNTER_FILE), "5\n").unwrap();
        assert_eq!(IterationCounter::in_dir(dir.path()).current(), 5);
    }

    #[test]
    fn corrupt_content_resets() {
        let dir = tempfile::tempdir().unwrap();
        for junk in ["not a number\n", "-3", "", "1.5"] {
            std::fs::write(dir.path().join(COUNTER_FILE), junk).unwrap();
            assert_eq!(IterationCounter::in_dir(dir.path()).current(), 0, "input {junk:?}");
        }
    }

    #[test]
    fn store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let counter = IterationCounter::in_dir(dir.path());
        counter.store(7).unwrap();
        assert_eq!(std::fs::read_to_string(counter.path()).unwrap(), "7\n");
        assert_eq!(counter.next(), 8);
    }
}
