//! Version-control backend
//!
//! The gate only ever talks to git through [`VersionControl`], so the trusted
//! source of restored scenarios stays a content-addressed ref and tests can
//! swap in an in-memory backend.

use crate::error::{HoldoutError, HoldoutResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Operations the integrity gate needs from version control
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Stage every change in the working tree, deletions included
    async fn stage_all(&self) -> HoldoutResult<()>;

    /// Whether the index differs from HEAD
    async fn has_staged_changes(&self) -> HoldoutResult<bool>;

    /// Commit the index
    async fn commit(&self, message: &str) -> HoldoutResult<()>;

    /// Refresh tracking refs of `remote`
    async fn fetch(&self, remote: &str) -> HoldoutResult<()>;

    /// Files under `path` at `reference`, repo-relative
    async fn list_files(&self, reference: &str, path: &str) -> HoldoutResult<Vec<String>>;

    /// Write `path` from `reference` into the working tree and index
    async fn checkout_path(&self, reference: &str, path: &str) -> HoldoutResult<()>;

    /// Reset the index for `path` to HEAD, keeping the working tree
    async fn unstage(&self, path: &str) -> HoldoutResult<()>;

    /// Whether `path` has staged, unstaged or untracked changes
    async fn has_changes(&self, path: &str) -> HoldoutResult<bool>;
}

/// `git` executable backend
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_root: PathBuf,
    program: String,
}

struct GitOutput {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl GitCli {
    /// Backend operating on `repo_root`
    #[must_use]
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            program: "git".to_string(),
        }
    }

    /// With a specific git executable
    #[inline]
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Repository this backend operates on
    #[must_use]
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.program, args.join(" "))
    }

    async fn output(&self, args: &[&str]) -> HoldoutResult<GitOutput> {
        let command = self.describe(args);
        tracing::debug!("Running {}", command);
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.repo_root)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| HoldoutError::Spawn { command, source })?;

        Ok(GitOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    async fn run(&self, args: &[&str]) -> HoldoutResult<String> {
        let output = self.output(args).await?;
        if output.code == Some(0) {
            Ok(output.stdout)
        } else {
            Err(HoldoutError::Git {
                command: self.describe(args),
                code: output.code,
                stderr: output.stderr,
            })
        }
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn stage_all(&self) -> HoldoutResult<()> {
        self.run(&["add", "-A"]).await.map(drop)
    }

    async fn has_staged_changes(&self) -> HoldoutResult<bool> {
        let args = ["diff", "--staged", "--quiet"];
        let output = self.output(&args).await?;
        match output.code {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            code => Err(HoldoutError::Git {
                command: self.describe(&args),
                code,
                stderr: output.stderr,
            }),
        }
    }

    async fn commit(&self, message: &str) -> HoldoutResult<()> {
        self.run(&["commit", "-m", message]).await.map(drop)
    }

    async fn fetch(&self, remote: &str) -> HoldoutResult<()> {
        self.run(&["fetch", remote]).await.map(drop)
    }

    async fn list_files(&self, reference: &str, path: &str) -> HoldoutResult<Vec<String>> {
        let stdout = self.run(&["ls-tree", "-r", "--name-only", reference, "--", path]).await?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn checkout_path(&self, reference: &str, path: &str) -> HoldoutResult<()> {
        self.run(&["checkout", reference, "--", path]).await.map(drop)
    }

    async fn unstage(&self, path: &str) -> HoldoutResult<()> {
        // exit 1 only reports unstaged changes left behind
        let args = ["reset", "-q", "HEAD", "--", path];
        let output = self.output(&args).await?;
        match output.code {
            Some(0 | 1) => Ok(()),
            code => Err(HoldoutError::Git {
                command: self.describe(&args),
                code,
                stderr: output.stderr,
            }),
        }
    }

    async fn has_changes(&self, path: &str) -> HoldoutResult<bool> {
        let stdout = self
            .run(&["status", "--porcelain", "--untracked-files=all", "--", path])
            .await?;
        Ok(stdout.lines().any(|line| !line.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitCli::new(dir.path()).with_program("/nonexistent/git-binary");
        let err = git.stage_all().await.unwrap_err();
        match err {
            HoldoutError::Spawn { command, .. } => assert_eq!(command, "/nonexistent/git-binary add -A"),
            other => panic!("expected Spawn, got {other:?}"),
        }
    }

    #[test]
    fn describe_joins_args() {
        let git = GitCli::new("/repo");
        assert_eq!(git.describe(&["ls-tree", "-r", "origin/main"]), "git ls-tree -r origin/main");
        assert_eq!(git.repo_root(), Path::new("/repo"));
    }
}
