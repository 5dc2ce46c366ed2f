//! Testing utilities for the dark factory workspace
//!
//! Shared fixtures for integration tests: scenario documents, report
//! builders, legacy feedback files, a seeded repository layout and an
//! in-memory version-control backend.

#![allow(missing_docs)]

use async_trait::async_trait;
use factory_holdout::{HoldoutError, HoldoutResult, VersionControl};
use factory_scenario::{ScenarioReport, ScenarioResult};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub const SAMPLE_MAKEFILE: &str = "\
.PHONY: test run-scenarios compile-feedback

test:
\tpytest tests/ -q

run-scenarios:
\tpython scripts/run_scenarios.py --timeout 180

compile-feedback:
\tpython scripts/compile_feedback.py

lint:
\truff check src/
";

pub fn scenario_markdown(name: &str, category: &str, command: &str) -> String {
    format!(
        "# Scenario: {name}\n\n## Category\n{category}\n\n## Preconditions\n- Repository checked out\n\n## Behavioral Expectation\nThe check succeeds.\n\n## Evaluation Method\n```bash\n{command}\n```\n\n## Pass Criteria\nExit code 0.\n\n## Evidence Required\n- stdout\n"
    )
}

pub fn write_scenario(dir: &Path, file_name: &str, name: &str, category: &str, command: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(file_name);
    std::fs::write(&path, scenario_markdown(name, category, command)).unwrap();
    path
}

pub fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

/// Scenarios, Makefile hooks and review-pack artifacts in the default layout
pub fn seed_repo(root: &Path) {
    write_scenario(&root.join("scenarios"), "env_reset.md", "Env Reset", "environment", "exit 0");
    write_scenario(&root.join("scenarios"), "train_smoke.md", "Train Smoke", "training", "exit 0");
    write_file(root, "scenarios/fixtures/expected.json", "{\"reward\": 1}\n");
    write_file(root, "Makefile", SAMPLE_MAKEFILE);
    write_file(root, "docs/pr_review_pack.html", "<html></html>\n");
    write_file(root, "docs/pr_diff_data.json", "{}\n");
    write_file(root, "src/app.py", "print('hi')\n");
}

pub fn passing_result(name: &str) -> ScenarioResult {
    ScenarioResult {
        name: name.to_string(),
        file_path: format!("scenarios/{name}.md"),
        category: "test".to_string(),
        passed: true,
        exit_code: 0,
        duration_seconds: 0.12,
        ..ScenarioResult::default()
    }
}

pub fn failing_result(name: &str, stderr: &str) -> ScenarioResult {
    ScenarioResult {
        name: name.to_string(),
        file_path: format!("scenarios/{name}.md"),
        category: "test".to_string(),
        passed: false,
        exit_code: 1,
        stderr: stderr.to_string(),
        duration_seconds: 1.5,
        error_summary: stderr.lines().last().unwrap_or("Unknown error").to_string(),
        ..ScenarioResult::default()
    }
}

pub fn report_of(results: Vec<ScenarioResult>) -> ScenarioReport {
    ScenarioReport::from_results(results, "2026-01-01T00:00:00Z")
}

/// Report with `passed` passing and `total - passed` failing scenarios
pub fn report_with(passed: usize, total: usize) -> ScenarioReport {
    let results = (0..total)
        .map(|i| {
            if i < passed {
                passing_result(&format!("pass_{i}"))
            } else {
                failing_result(&format!("fail_{i}"), "AssertionError: mismatch")
            }
        })
        .collect();
    report_of(results)
}

/// Feedback document in the markdown layout written by earlier iterations
pub fn write_feedback(factory_dir: &Path, iteration: u32, summary_line: &str) -> PathBuf {
    let content = format!(
        "# Factory Feedback — Iteration {iteration}\n\nGenerated: 2026-01-01 00:00:00 UTC\n\n## Summary\n\n{summary_line}\n- Passed: 0 | Failed: 0 | Total: 0\n\n## Instructions for Coding Agent\n\nFix the failures above.\n"
    );
    write_file(factory_dir, &format!("feedback_iter_{iteration}.md"), &content)
}

type Tree = BTreeMap<String, Vec<u8>>;

#[derive(Default)]
struct SnapshotState {
    refs: HashMap<String, Tree>,
    head: Tree,
    index: Tree,
    commits: Vec<String>,
    fetches: Vec<String>,
    fail_fetch: bool,
}

/// In-memory version control over a real working directory
///
/// Refs, HEAD and the index are snapshots of file contents; the working
/// tree is the directory on disk.
pub struct SnapshotVcs {
    repo_root: PathBuf,
    state: Mutex<SnapshotState>,
}

impl SnapshotVcs {
    /// Backend whose HEAD and index match the current working tree
    pub fn init(repo_root: impl Into<PathBuf>) -> Self {
        let repo_root = repo_root.into();
        let tree = scan(&repo_root);
        Self {
            repo_root,
            state: Mutex::new(SnapshotState {
                head: tree.clone(),
                index: tree,
                ..SnapshotState::default()
            }),
        }
    }

    /// Record the current working tree under `name`
    pub fn snapshot_ref(&self, name: &str) {
        let tree = scan(&self.repo_root);
        self.state.lock().refs.insert(name.to_string(), tree);
    }

    /// Record HEAD under `name`
    pub fn tag_head(&self, name: &str) {
        let mut state = self.state.lock();
        let head = state.head.clone();
        state.refs.insert(name.to_string(), head);
    }

    pub fn fail_fetches(&self) {
        self.state.lock().fail_fetch = true;
    }

    pub fn commits(&self) -> Vec<String> {
        self.state.lock().commits.clone()
    }

    pub fn fetches(&self) -> Vec<String> {
        self.state.lock().fetches.clone()
    }

    pub fn head_files(&self) -> Vec<String> {
        self.state.lock().head.keys().cloned().collect()
    }

    pub fn index_files(&self) -> Vec<String> {
        self.state.lock().index.keys().cloned().collect()
    }
}

fn scan(root: &Path) -> Tree {
    let mut tree = Tree::new();
    scan_into(root, root, &mut tree);
    tree
}

fn scan_into(root: &Path, dir: &Path, tree: &mut Tree) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if entry.file_name() == ".git" {
            continue;
        }
        if path.is_dir() {
            scan_into(root, &path, tree);
        } else {
            let rel = path.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/");
            tree.insert(rel, std::fs::read(&path).unwrap());
        }
    }
}

fn under<'a>(tree: &'a Tree, prefix: &'a str) -> impl Iterator<Item = (&'a String, &'a Vec<u8>)> + 'a {
    tree.iter().filter(move |(path, _)| path.starts_with(prefix))
}

fn subtree(tree: &Tree, prefix: &str) -> Tree {
    under(tree, prefix).map(|(k, v)| (k.clone(), v.clone())).collect()
}

#[async_trait]
impl VersionControl for SnapshotVcs {
    async fn stage_all(&self) -> HoldoutResult<()> {
        let tree = scan(&self.repo_root);
        self.state.lock().index = tree;
        Ok(())
    }

    async fn has_staged_changes(&self) -> HoldoutResult<bool> {
        let state = self.state.lock();
        Ok(state.index != state.head)
    }

    async fn commit(&self, message: &str) -> HoldoutResult<()> {
        let mut state = self.state.lock();
        state.head = state.index.clone();
        state.commits.push(message.to_string());
        Ok(())
    }

    async fn fetch(&self, remote: &str) -> HoldoutResult<()> {
        let mut state = self.state.lock();
        state.fetches.push(remote.to_string());
        if state.fail_fetch {
            return Err(HoldoutError::Git {
                command: format!("git fetch {remote}"),
                code: Some(128),
                stderr: "fatal: unable to access remote".to_string(),
            });
        }
        Ok(())
    }

    async fn list_files(&self, reference: &str, path: &str) -> HoldoutResult<Vec<String>> {
        let state = self.state.lock();
        let tree = state.refs.get(reference).ok_or_else(|| HoldoutError::Git {
            command: format!("git ls-tree -r --name-only {reference} -- {path}"),
            code: Some(128),
            stderr: format!("fatal: Not a valid object name {reference}"),
        })?;
        Ok(under(tree, path).map(|(k, _)| k.clone()).collect())
    }

    async fn checkout_path(&self, reference: &str, path: &str) -> HoldoutResult<()> {
        let mut state = self.state.lock();
        let files = state
            .refs
            .get(reference)
            .map(|tree| subtree(tree, path))
            .ok_or_else(|| HoldoutError::Git {
                command: format!("git checkout {reference} -- {path}"),
                code: Some(128),
                stderr: format!("fatal: invalid reference: {reference}"),
            })?;
        for (rel, bytes) in files {
            let target = self.repo_root.join(&rel);
            std::fs::create_dir_all(target.parent().unwrap()).unwrap();
            std::fs::write(&target, &bytes).unwrap();
            state.index.insert(rel, bytes);
        }
        Ok(())
    }

    async fn unstage(&self, path: &str) -> HoldoutResult<()> {
        let mut state = self.state.lock();
        state.index.retain(|k, _| !k.starts_with(path));
        let head = subtree(&state.head, path);
        state.index.extend(head);
        Ok(())
    }

    async fn has_changes(&self, path: &str) -> HoldoutResult<bool> {
        let working = subtree(&scan(&self.repo_root), path);
        let state = self.state.lock();
        Ok(working != subtree(&state.head, path) || subtree(&state.index, path) != subtree(&state.head, path))
    }
}
