//! Holdout state model
//!
//! ```text
//!            strip                 restore
//! Present ─────────▶ Stripped ─────────────▶ RestoredUncommitted
//!    ▲                  ▲  strip                     │
//!    │                  └────────────────────────────┤
//!    └──────────────────── commit ───────────────────┘
//! ```
//!
//! Strip and restore are legal from every state (both are idempotent).
//! Commit only makes sense once a restore has been reviewed.

use crate::error::{HoldoutError, HoldoutResult};
use crate::layout::HoldoutLayout;
use crate::makefile::has_stripped_block;
use crate::vcs::VersionControl;
use std::fmt;
use std::path::Path;

/// Where the working tree stands relative to the holdout corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoldoutState {
    /// Corpus and hooks present and committed
    Present,
    /// Corpus removed, hooks commented out
    Stripped,
    /// Corpus checked out from a trusted ref, not yet committed
    RestoredUncommitted,
}

/// Gate operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoldoutOp {
    Strip,
    Restore,
    Commit,
}

impl fmt::Display for HoldoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Present => "present",
            Self::Stripped => "stripped",
            Self::RestoredUncommitted => "restored-uncommitted",
        })
    }
}

impl fmt::Display for HoldoutOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strip => "strip",
            Self::Restore => "restore",
            Self::Commit => "commit",
        })
    }
}

impl HoldoutState {
    /// Operations legal from this state
    #[must_use]
    pub fn allowed_ops(self) -> Vec<HoldoutOp> {
        use HoldoutOp::{Commit, Restore, Strip};
        match self {
            Self::Present | Self::Stripped => vec![Strip, Restore],
            Self::RestoredUncommitted => vec![Strip, Restore, Commit],
        }
    }

    /// State after applying `op`
    ///
    /// # Errors
    /// Returns `HoldoutError::IllegalTransition` for ops not in [`HoldoutState::allowed_ops`].
    pub fn apply(self, op: HoldoutOp) -> HoldoutResult<HoldoutState> {
        if !self.allowed_ops().contains(&op) {
            return Err(HoldoutError::IllegalTransition { state: self, op });
        }
        Ok(match op {
            HoldoutOp::Strip => Self::Stripped,
            HoldoutOp::Restore => Self::RestoredUncommitted,
            HoldoutOp::Commit => Self::Present,
        })
    }

    /// Infer the state from the working tree and version control
    ///
    /// - no corpus files, or a stripped Makefile block: `Stripped`
    /// - corpus present with uncommitted changes: `RestoredUncommitted`
    /// - otherwise: `Present`
    ///
    /// # Errors
    /// IO or version-control errors.
    pub async fn detect(repo_root: &Path, layout: &HoldoutLayout, vcs: &dyn VersionControl) -> HoldoutResult<Self> {
        let files = crate::corpus::corpus_files(repo_root, &layout.scenarios_dir)?;
        let makefile = repo_root.join(&layout.makefile);
        let hooks_stripped = match std::fs::read_to_string(&makefile) {
            Ok(content) => has_stripped_block(&content, &layout.marker),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(HoldoutError::io_error(makefile, e)),
        };

        if files.is_empty() || hooks_stripped {
            return Ok(Self::Stripped);
        }
        if vcs.has_changes(&layout.scenarios_pathspec()).await? {
            Ok(Self::RestoredUncommitted)
        } else {
            Ok(Self::Present)
        }
    }
}
