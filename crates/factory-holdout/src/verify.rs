//! Post-strip and post-restore verification
//!
//! Each check that fails contributes one [`VerificationFailure`]; an empty
//! list means the working tree is in the expected shape.

use crate::corpus::{corpus_files, count_markdown};
use crate::error::HoldoutResult;
use crate::layout::HoldoutLayout;
use std::fmt;
use std::path::{Path, PathBuf};

/// Maximum number of leftover file names quoted in a failure
const SAMPLE_SIZE: usize = 5;

/// One failed verification check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationFailure {
    /// Scenario files survived a strip
    ScenarioFilesRemain { count: usize, sample: Vec<String> },
    /// Scenario directory survived a strip, empty
    ScenarioDirExists { path: PathBuf },
    /// Review-pack artifact survived a strip
    ReviewArtifactRemains { path: PathBuf },
    /// Scenario directory absent after restore
    ScenarioDirMissing { path: PathBuf },
    /// Scenario directory holds no markdown after restore
    ScenarioDirEmpty { path: PathBuf },
    /// Restored file count differs from the trusted ref
    CountMismatch { expected: usize, actual: usize },
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScenarioFilesRemain { count, sample } => {
                write!(f, "scenario directory still has {count} file(s): {}", sample.join(", "))
            }
            Self::ScenarioDirExists { path } => {
                write!(f, "{} still exists (should be fully removed)", path.display())
            }
            Self::ReviewArtifactRemains { path } => {
                write!(f, "review pack artifact still exists: {}", path.display())
            }
            Self::ScenarioDirMissing { path } => write!(f, "{} does not exist", path.display()),
            Self::ScenarioDirEmpty { path } => write!(f, "{} exists but has no .md files", path.display()),
            Self::CountMismatch { expected, actual } => {
                write!(f, "expected {expected} scenario files, found {actual}")
            }
        }
    }
}

/// Check that nothing of the corpus or review pack is left
///
/// # Errors
/// Returns an IO error if the scenario directory cannot be walked.
pub fn verify_stripped(repo_root: &Path, layout: &HoldoutLayout) -> HoldoutResult<Vec<VerificationFailure>> {
    let mut failures = Vec::new();
    let scenarios_dir = repo_root.join(&layout.scenarios_dir);

    if scenarios_dir.exists() {
        let remaining = corpus_files(repo_root, &layout.scenarios_dir)?;
        if remaining.is_empty() {
            failures.push(VerificationFailure::ScenarioDirExists {
                path: layout.scenarios_dir.clone(),
            });
        } else {
            failures.push(VerificationFailure::ScenarioFilesRemain {
                count: remaining.len(),
                sample: remaining.into_iter().take(SAMPLE_SIZE).collect(),
            });
        }
    }

    for artifact in &layout.review_pack_files {
        if repo_root.join(artifact).exists() {
            failures.push(VerificationFailure::ReviewArtifactRemains { path: artifact.clone() });
        }
    }

    Ok(failures)
}

/// Check that the corpus is back and complete
///
/// `expected_count` is compared against every file under the scenario
/// directory; the non-empty check only counts `.md` files.
///
/// # Errors
/// Returns an IO error if the scenario directory cannot be walked.
pub fn verify_restored(
    repo_root: &Path,
    layout: &HoldoutLayout,
    expected_count: Option<usize>,
) -> HoldoutResult<Vec<VerificationFailure>> {
    let scenarios_dir = repo_root.join(&layout.scenarios_dir);
    if !scenarios_dir.is_dir() {
        return Ok(vec![VerificationFailure::ScenarioDirMissing {
            path: layout.scenarios_dir.clone(),
        }]);
    }

    let files = corpus_files(repo_root, &layout.scenarios_dir)?;
    let mut failures = Vec::new();
    if count_markdown(&files) == 0 {
        failures.push(VerificationFailure::ScenarioDirEmpty {
            path: layout.scenarios_dir.clone(),
        });
    } else if let Some(expected) = expected_count {
        if files.len() != expected {
            failures.push(VerificationFailure::CountMismatch {
                expected,
                actual: files.len(),
            });
        }
    }
    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "x").unwrap();
    }

    #[test]
    fn clean_tree_verifies_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let failures = verify_stripped(dir.path(), &HoldoutLayout::default()).unwrap();
        assert!(failures.is_empty());
    }

    #[test]
    fn empty_dir_is_a_strip_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("scenarios")).unwrap();
        let failures = verify_stripped(dir.path(), &HoldoutLayout::default()).unwrap();
        assert_eq!(
            failures,
            vec![VerificationFailure::ScenarioDirExists {
                path: PathBuf::from("scenarios")
            }]
        );
    }

    #[test]
    fn leftovers_are_enumerated() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..7 {
            touch(dir.path(), &format!("scenarios/s{i}.md"));
        }
        touch(dir.path(), "docs/pr_diff_data.json");

        let failures = verify_stripped(dir.path(), &HoldoutLayout::default()).unwrap();
        assert_eq!(failures.len(), 2);
        match &failures[0] {
            VerificationFailure::ScenarioFilesRemain { count, sample } => {
                assert_eq!(*count, 7);
                assert_eq!(sample.len(), SAMPLE_SIZE);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(failures[1].to_string().contains("pr_diff_data.json"));
    }

    #[test]
    fn restore_checks() {
        let dir = tempfile::tempdir().unwrap();
        let layout = HoldoutLayout::default();
        assert!(matches!(
            verify_restored(dir.path(), &layout, None).unwrap()[..],
            [VerificationFailure::ScenarioDirMissing { .. }]
        ));

        touch(dir.path(), "scenarios/data.json");
        assert!(matches!(
            verify_restored(dir.path(), &layout, None).unwrap()[..],
            [VerificationFailure::ScenarioDirEmpty { .. }]
        ));

        touch(dir.path(), "scenarios/a.md");
        assert!(verify_restored(dir.path(), &layout, Some(2)).unwrap().is_empty());
        assert_eq!(
            verify_restored(dir.path(), &layout, Some(3)).unwrap(),
            vec![VerificationFailure::CountMismatch { expected: 3, actual: 2 }]
        );
    }

    #[test]
    fn zero_expected_count_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let layout = HoldoutLayout::default();
        touch(dir.path(), "scenarios/a.md");
        assert_eq!(
            verify_restored(dir.path(), &layout, Some(0)).unwrap(),
            vec![VerificationFailure::CountMismatch { expected: 0, actual: 1 }]
        );
    }
}
