//! End-to-end strip/restore/strip against a real git repository
//!
//! Skips itself when no `git` executable is available.

use factory_config::FactoryConfig;
use factory_holdout::{HoldoutGate, HoldoutState, RestoreOptions, StripOptions};
use factory_test_utils::{seed_repo, SAMPLE_MAKEFILE};
use std::path::Path;
use std::process::Command;

fn git(root: &Path, args: &[&str]) -> String {
    let output = Command::new("git").args(args).current_dir(root).output().unwrap();
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn git_available() -> bool {
    Command::new("git").arg("--version").output().is_ok_and(|o| o.status.success())
}

fn init_repo(root: &Path) {
    git(root, &["init", "-q"]);
    git(root, &["config", "user.email", "factory@example.com"]);
    git(root, &["config", "user.name", "Factory Test"]);
    git(root, &["config", "commit.gpgsign", "false"]);
    seed_repo(root);
    git(root, &["add", "-A"]);
    git(root, &["commit", "-q", "-m", "initial"]);
}

#[tokio::test]
async fn strip_restore_strip_is_idempotent() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    init_repo(root);
    let gate = HoldoutGate::from_config(&FactoryConfig::default(), root);

    let first = gate.strip(StripOptions::default()).await.unwrap();
    assert!(first.committed);
    let strip_commit = git(root, &["rev-parse", "HEAD"]);
    let stripped_tree = git(root, &["rev-parse", "HEAD^{tree}"]);
    let message = git(root, &["log", "-1", "--format=%B"]);
    assert!(message.starts_with("[factory:holdout-stripped]"));
    assert!(git(root, &["status", "--porcelain"]).trim().is_empty());
    assert_eq!(gate.status().await.unwrap(), HoldoutState::Stripped);

    let restored = gate
        .restore(RestoreOptions {
            reference: Some("HEAD~1".to_string()),
            ..RestoreOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(restored.restored_scenario_files, first.removed_scenario_files);
    assert_eq!(restored.fingerprint, first.fingerprint);
    assert_eq!(std::fs::read_to_string(root.join("Makefile")).unwrap(), SAMPLE_MAKEFILE);
    assert!(git(root, &["diff", "--staged", "--name-only"]).trim().is_empty());
    assert_eq!(gate.status().await.unwrap(), HoldoutState::RestoredUncommitted);

    let second = gate.strip(StripOptions::default()).await.unwrap();
    assert!(!second.committed);
    assert_eq!(git(root, &["rev-parse", "HEAD"]), strip_commit);
    assert_eq!(git(root, &["rev-parse", "HEAD^{tree}"]), stripped_tree);
    assert!(git(root, &["status", "--porcelain"]).trim().is_empty());
}
