//! Scenario execution
//!
//! Runs one scenario's evaluation method through a POSIX shell in the
//! repository root. Every outcome, including a timeout or a shell that cannot
//! be spawned, is folded into a [`ScenarioResult`].

use crate::model::{round_to, Scenario, ScenarioResult, EXIT_INTERNAL_ERROR, EXIT_TIMEOUT};
use crate::output::{summarize_error, tail_chars};
use factory_config::RunnerConfig;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Executes scenarios as shell subprocesses
#[derive(Debug, Clone)]
pub struct ScenarioExecutor {
    shell: String,
    import_path_var: String,
    tail_chars: usize,
}

enum ShellOutcome {
    Exited {
        code: i32,
        stdout: String,
        stderr: String,
    },
    TimedOut,
}

impl Default for ScenarioExecutor {
    fn default() -> Self {
        Self::from_config(&RunnerConfig::default())
    }
}

impl ScenarioExecutor {
    /// Executor with default runner settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor using the shell, env var and tail size from config
    #[must_use]
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self {
            shell: config.shell.clone(),
            import_path_var: config.import_path_var.clone(),
            tail_chars: config.output_tail_chars,
        }
    }

    /// With a different shell executable
    #[inline]
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// With a different stdout/stderr tail size
    #[inline]
    #[must_use]
    pub fn with_tail_chars(mut self, tail_chars: usize) -> Self {
        self.tail_chars = tail_chars;
        self
    }

    /// Execute one scenario once
    ///
    /// Never fails: a non-zero exit, a timeout (`exit_code == -1`) or a spawn
    /// failure (`exit_code == -2`) all produce a failed result.
    pub async fn execute(&self, scenario: &Scenario, timeout_secs: u64, working_dir: &Path) -> ScenarioResult {
        let mut result = ScenarioResult::for_scenario(scenario);
        let started = Instant::now();

        tracing::debug!("Executing scenario '{}': {}", scenario.name, scenario.evaluation_method);
        let outcome = self
            .run_shell(&scenario.evaluation_method, Duration::from_secs(timeout_secs), working_dir)
            .await;
        result.duration_seconds = round_to(started.elapsed().as_secs_f64(), 2);

        match outcome {
            Ok(ShellOutcome::Exited { code, stdout, stderr }) => {
                result.exit_code = code;
                result.passed = code == 0;
                if !result.passed {
                    result.error_summary = summarize_error(&stdout, &stderr);
                }
                result.stdout = tail_chars(&stdout, self.tail_chars).to_string();
                result.stderr = tail_chars(&stderr, self.tail_chars).to_string();
            }
            Ok(ShellOutcome::TimedOut) => {
                tracing::warn!("Scenario '{}' exceeded {}s, killed", scenario.name, timeout_secs);
                result.exit_code = EXIT_TIMEOUT;
                result.stderr = format!("TIMEOUT: scenario exceeded {timeout_secs}s limit");
                result.error_summary = format!("Timeout after {timeout_secs}s");
            }
            Err(e) => {
                tracing::warn!("Scenario '{}' could not be executed: {}", scenario.name, e);
                result.exit_code = EXIT_INTERNAL_ERROR;
                result.stderr = e.to_string();
                result.error_summary = result.stderr.clone();
            }
        }

        result
    }

    async fn run_shell(&self, command: &str, timeout: Duration, working_dir: &Path) -> std::io::Result<ShellOutcome> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if !self.import_path_var.is_empty() {
            cmd.env(&self.import_path_var, working_dir);
        }
        // Own process group so a timeout can take down pipelines and background jobs
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn()?;
        // The shell leads its group; the id stays valid for killing after it is reaped
        let group = child.id();
        let mut stdout_task = tokio::spawn(read_lossy(child.stdout.take()));
        let mut stderr_task = tokio::spawn(read_lossy(child.stderr.take()));

        let waited = tokio::time::timeout(timeout, async {
            let status = child.wait().await?;
            // Background jobs left behind would hold the pipes open
            kill_group(group).await;
            let stdout = (&mut stdout_task).await.unwrap_or_default();
            let stderr = (&mut stderr_task).await.unwrap_or_default();
            Ok::<_, std::io::Error>((status, stdout, stderr))
        })
        .await;

        match waited {
            Ok(Ok((status, stdout, stderr))) => Ok(ShellOutcome::Exited {
                code: exit_code(status),
                stdout,
                stderr,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                stdout_task.abort();
                stderr_task.abort();
                kill_group(group).await;
                if let Err(e) = child.kill().await {
                    tracing::debug!("Child kill failed: {}", e);
                }
                Ok(ShellOutcome::TimedOut)
            }
        }
    }
}

async fn read_lossy<R>(pipe: Option<R>) -> String
where
    R: AsyncRead + Unpin,
{
    let Some(mut pipe) = pipe else {
        return String::new();
    };
    let mut buf = Vec::new();
    if let Err(e) = pipe.read_to_end(&mut buf).await {
        tracing::debug!("Output capture ended early: {}", e);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// SIGKILL every process in the scenario's process group
async fn kill_group(group: Option<u32>) {
    #[cfg(unix)]
    if let Some(pgid) = group {
        let target = format!("-{pgid}");
        let status = Command::new("kill")
            .args(["-KILL", "--", &target])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if let Err(e) = status {
            tracing::debug!("Process group kill for {} failed: {}", pgid, e);
        }
    }
    #[cfg(not(unix))]
    let _ = group;
}

/// Exit code, or 128 + signal for signal-terminated children
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(command: &str) -> Scenario {
        Scenario::new("check", command).with_category("test")
    }

    async fn run(command: &str) -> ScenarioResult {
        let dir = tempfile::tempdir().unwrap();
        ScenarioExecutor::new().execute(&scenario(command), 10, dir.path()).await
    }

    #[tokio::test]
    async fn exit_zero_passes() {
        let result = run("exit 0").await;
        assert!(result.passed);
        assert_eq!(result.exit_code, 0);
        assert!(result.error_summary.is_empty());
        assert_eq!(result.category, "test");
    }

    #[tokio::test]
    async fn exit_one_fails() {
        let result = run("exit 1").await;
        assert!(!result.passed);
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.error_summary, "Unknown error");
    }

    #[tokio::test]
    async fn stdout_is_captured() {
        let result = run("echo \"hello factory\"").await;
        assert!(result.passed);
        assert!(result.stdout.contains("hello factory"));
    }

    #[tokio::test]
    async fn failure_summary_uses_last_error_line() {
        let result = run("echo 'Error: first' >&2; echo 'AssertionError: second' >&2; echo done; exit 2").await;
        assert_eq!(result.exit_code, 2);
        assert_eq!(result.error_summary, "AssertionError: second");
    }

    #[tokio::test]
    async fn runs_in_working_dir_with_import_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let result = ScenarioExecutor::new()
            .execute(&scenario("pwd -P; echo \"$PYTHONPATH\""), 10, &root)
            .await;
        let lines: Vec<&str> = result.stdout.lines().collect();
        assert_eq!(lines, vec![root.display().to_string(), root.display().to_string()]);
    }

    #[tokio::test]
    async fn timeout_kills_and_marks_result() {
        let started = Instant::now();
        let dir = tempfile::tempdir().unwrap();
        let result = ScenarioExecutor::new().execute(&scenario("sleep 30"), 1, dir.path()).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(result.exit_code, EXIT_TIMEOUT);
        assert!(!result.passed);
        assert!(result.timed_out());
        assert_eq!(result.stderr, "TIMEOUT: scenario exceeded 1s limit");
        assert_eq!(result.error_summary, "Timeout after 1s");
        assert!(result.duration_seconds >= 1.0);
    }

    #[tokio::test]
    async fn timeout_reaps_background_children() {
        let started = Instant::now();
        let dir = tempfile::tempdir().unwrap();
        let result = ScenarioExecutor::new()
            .execute(&scenario("sleep 30 & sleep 30 | cat; wait"), 1, dir.path())
            .await;
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(result.exit_code, EXIT_TIMEOUT);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_kills_background_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("survivor");
        let command = format!("(sleep 3; touch '{}') & sleep 30", marker.display());
        let result = ScenarioExecutor::new().execute(&scenario(&command), 1, dir.path()).await;
        assert_eq!(result.exit_code, EXIT_TIMEOUT);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(!marker.exists(), "background job outlived the timeout");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_exit_ends_scenario_and_its_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("survivor");
        let command = format!("(sleep 3; touch '{}') & exit 0", marker.display());
        let started = Instant::now();
        let result = ScenarioExecutor::new().execute(&scenario(&command), 5, dir.path()).await;

        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(result.passed);
        assert_eq!(result.exit_code, 0);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(!marker.exists(), "background job outlived its scenario");
    }

    #[tokio::test]
    async fn missing_shell_is_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ScenarioExecutor::new()
            .with_shell("/nonexistent/shell-binary")
            .execute(&scenario("exit 0"), 5, dir.path())
            .await;
        assert_eq!(result.exit_code, EXIT_INTERNAL_ERROR);
        assert!(!result.passed);
        assert!(!result.stderr.is_empty());
        assert_eq!(result.error_summary, result.stderr);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn signal_exit_is_offset() {
        let result = run("kill -TERM $$").await;
        assert_eq!(result.exit_code, 128 + 15);
        assert!(!result.passed);
    }

    #[tokio::test]
    async fn output_is_tail_truncated_after_summary() {
        let dir = tempfile::tempdir().unwrap();
        let result = ScenarioExecutor::new()
            .with_tail_chars(10)
            .execute(
                &scenario("echo 'error: early detail'; printf 'x%.0s' $(seq 1 50); exit 1"),
                10,
                dir.path(),
            )
            .await;
        assert_eq!(result.stdout, "xxxxxxxxxx");
        assert_eq!(result.error_summary, "error: early detail");
    }
}
