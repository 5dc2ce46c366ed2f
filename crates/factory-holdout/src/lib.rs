//! Factory Holdout - the integrity gate around the scenario corpus
//!
//! The coding agent must never see the criteria it is judged against. Before
//! its turn the gate strips the corpus and its Makefile hooks from the
//! working tree and commits the removal with a greppable marker; afterwards
//! it restores the corpus byte-for-byte from a trusted git ref, never from a
//! local copy the agent could have touched.
//!
//! # Components
//!
//! - [`makefile`]: exact-text invertible comment codec for recipe blocks
//! - [`vcs`]: the [`VersionControl`] seam and its `git` implementation
//! - [`verify`]: enumerated post-operation checks
//! - [`state`]: the present / stripped / restored-uncommitted model
//! - [`gate`]: [`HoldoutGate::strip`] and [`HoldoutGate::restore`]

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod corpus;
pub mod error;
pub mod gate;
pub mod layout;
pub mod makefile;
pub mod state;
pub mod vcs;
pub mod verify;

pub use corpus::{corpus_files, CorpusFingerprint};
pub use error::{HoldoutError, HoldoutResult};
pub use gate::{HoldoutGate, RestoreOptions, RestoreReport, StripOptions, StripReport};
pub use layout::HoldoutLayout;
pub use makefile::{comment_targets, uncomment_blocks};
pub use state::{HoldoutOp, HoldoutState};
pub use vcs::{GitCli, VersionControl};
pub use verify::{verify_restored, verify_stripped, VerificationFailure};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
