//! Scenario corpus enumeration and fingerprinting
//!
//! The fingerprint is a SHA-256 over every file's relative path and bytes in
//! sorted order, so two trees hash equal iff they hold the same files with
//! the same contents.

use crate::error::{HoldoutError, HoldoutResult};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};

/// Content fingerprint of a scenario corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorpusFingerprint([u8; 32]);

impl CorpusFingerprint {
    /// Hash the given repo-relative files
    ///
    /// # Errors
    /// Returns an IO error if any file cannot be read.
    pub fn compute(repo_root: &Path, files: &[String]) -> HoldoutResult<Self> {
        let mut sorted: Vec<&String> = files.iter().collect();
        sorted.sort();

        let mut hasher = Sha256::new();
        for rel in sorted {
            let path = repo_root.join(rel);
            let bytes = std::fs::read(&path).map_err(|e| HoldoutError::io_error(&path, e))?;
            hasher.update((rel.len() as u64).to_le_bytes());
            hasher.update(rel.as_bytes());
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
        }
        Ok(Self(hasher.finalize().into()))
    }

    /// Hex digest
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for CorpusFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Every file under `dir`, as sorted forward-slash paths relative to `repo_root`
///
/// A missing directory yields an empty list.
///
/// # Errors
/// Returns an IO error if a directory cannot be listed.
pub fn corpus_files(repo_root: &Path, dir: &Path) -> HoldoutResult<Vec<String>> {
    let root = repo_root.join(dir);
    let mut files = Vec::new();
    if root.is_dir() {
        walk(&root, &mut files)?;
    }

    let mut relative: Vec<String> = files
        .iter()
        .map(|path| {
            path.strip_prefix(repo_root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    relative.sort();
    Ok(relative)
}

/// Number of `.md` entries in a file list
#[must_use]
pub fn count_markdown(files: &[String]) -> usize {
    files.iter().filter(|f| f.ends_with(".md")).count()
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> HoldoutResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| HoldoutError::io_error(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| HoldoutError::io_error(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| HoldoutError::io_error(&path, e))?;
        if file_type.is_dir() {
            walk(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}
