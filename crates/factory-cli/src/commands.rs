//! Subcommand handlers
//!
//! Each handler returns the process exit code. Library errors that end a
//! command are printed by `main` and map to exit code 1.

use anyhow::{Context, Result};
use clap::ArgMatches;
use factory_config::FactoryConfig;
use factory_feedback::{percent, FeedbackDriver};
use factory_holdout::{HoldoutError, HoldoutGate, RestoreOptions, StripOptions};
use factory_scenario::{Progress, ScenarioRunner};
use std::path::{Path, PathBuf};

pub(crate) const EXIT_OK: i32 = 0;
pub(crate) const EXIT_FAILURE: i32 = 1;

/// Repository root and the config that applies to it
pub(crate) struct Invocation {
    pub(crate) repo_root: PathBuf,
    pub(crate) config: FactoryConfig,
}

impl Invocation {
    pub(crate) fn from_matches(args: &ArgMatches) -> Result<Self> {
        let repo_root = args
            .get_one::<PathBuf>("repo-root")
            .cloned()
            .unwrap_or_else(|| PathBuf::from("."));
        let config = match args.get_one::<PathBuf>("config") {
            Some(path) => FactoryConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => FactoryConfig::discover(&repo_root)
                .with_context(|| format!("loading config from {}", repo_root.display()))?,
        };
        Ok(Self { repo_root, config })
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn print_progress(progress: Progress<'_>) {
    match progress {
        Progress::Started { index, total, scenario } => {
            let category = if scenario.category.is_empty() {
                "uncategorized"
            } else {
                scenario.category.as_str()
            };
            println!("[{index}/{total}] {} ({category})", scenario.name);
        }
        Progress::Finished { result, .. } => {
            if result.passed {
                println!("  PASS ({:.2}s)", result.duration_seconds);
            } else {
                println!("  FAIL ({:.2}s)", result.duration_seconds);
                println!("  Error: {}", result.error_summary);
            }
        }
    }
}

pub(crate) async fn run_scenarios(ctx: &Invocation, args: &ArgMatches) -> Result<i32> {
    let mut runner = ScenarioRunner::from_config(&ctx.config, &ctx.repo_root);
    if let Some(category) = args.get_one::<String>("category") {
        runner = runner.with_category(category.clone());
    }
    if let Some(timeout) = args.get_one::<u64>("timeout") {
        runner.options_mut().timeout_secs = *timeout;
    }
    if let Some(dir) = args.get_one::<PathBuf>("scenarios-dir") {
        runner.options_mut().scenarios_dir = resolve(&ctx.repo_root, dir);
    }
    let output = args
        .get_one::<PathBuf>("output")
        .map_or_else(|| ctx.config.results_path(&ctx.repo_root), |p| resolve(&ctx.repo_root, p));

    let report = runner
        .run_and_write(&output, print_progress)
        .await
        .context("scenario run failed")?;

    println!();
    println!(
        "RESULTS: {}/{} passed | Satisfaction: {}",
        report.passed,
        report.total,
        percent(report.satisfaction_score)
    );
    if !report.all_passed() {
        println!("Failed scenarios:");
        for result in report.failures() {
            println!("  - {}: {}", result.name, result.error_summary);
        }
    }
    println!("Report written to {}", output.display());
    tracing::info!(passed = report.passed, total = report.total, "Scenario run finished");

    Ok(if report.all_passed() { EXIT_OK } else { EXIT_FAILURE })
}

pub(crate) fn compile_feedback(ctx: &Invocation, args: &ArgMatches) -> Result<i32> {
    let mut driver = FeedbackDriver::from_config(&ctx.config, &ctx.repo_root);
    if let Some(dir) = args.get_one::<PathBuf>("factory-dir") {
        driver = driver.with_factory_dir(resolve(&ctx.repo_root, dir));
    }

    let outcome = driver
        .compile(args.get_one::<u32>("iteration").copied())
        .context("feedback compilation failed")?;

    println!("Feedback compiled: {}", outcome.path.display());
    println!("Iteration: {}", outcome.iteration);
    tracing::info!(iteration = outcome.iteration, "Feedback written to {}", outcome.path.display());
    match outcome.satisfaction_score {
        Some(score) => println!("Satisfaction: {}", percent(score)),
        None => println!("Satisfaction: N/A (no scenario results)"),
    }
    Ok(EXIT_OK)
}

fn report_holdout_error(err: &HoldoutError) {
    tracing::warn!("Holdout operation failed: {}", err);
    if let HoldoutError::VerificationFailed(failures) = err {
        println!("VERIFICATION FAILED:");
        for failure in failures {
            println!("  - {failure}");
        }
    }
}

pub(crate) async fn strip(ctx: &Invocation, args: &ArgMatches) -> Result<i32> {
    let gate = HoldoutGate::from_config(&ctx.config, &ctx.repo_root);
    let options = StripOptions {
        dry_run: args.get_flag("dry-run"),
        commit: !args.get_flag("no-commit"),
    };

    let report = match gate.strip(options).await {
        Ok(report) => report,
        Err(err) => {
            report_holdout_error(&err);
            return Err(err).context("strip failed");
        }
    };

    let verb = if report.dry_run { "Would remove" } else { "Removed" };
    println!("{verb} {} scenario file(s)", report.removed_scenario_files.len());
    for path in &report.removed_review_artifacts {
        println!("{verb} review artifact {path}");
    }
    for target in &report.commented_targets {
        println!("Commented Makefile target {target}");
    }
    if let Some(fingerprint) = &report.fingerprint {
        println!("Corpus fingerprint: {fingerprint}");
    }
    tracing::info!(
        dry_run = report.dry_run,
        committed = report.committed,
        "Strip removed {} scenario file(s)",
        report.removed_scenario_files.len()
    );
    if report.committed {
        println!("Committed with marker {}", gate.layout().marker);
    } else if !report.dry_run && options.commit {
        println!("Nothing to commit");
    }
    Ok(EXIT_OK)
}

pub(crate) async fn restore(ctx: &Invocation, args: &ArgMatches) -> Result<i32> {
    let gate = HoldoutGate::from_config(&ctx.config, &ctx.repo_root);
    let options = RestoreOptions {
        reference: args.get_one::<String>("ref").cloned(),
        dry_run: args.get_flag("dry-run"),
        expected_count: args
            .get_one::<u64>("expected-count")
            .and_then(|n| usize::try_from(*n).ok()),
    };

    let report = match gate.restore(options).await {
        Ok(report) => report,
        Err(err) => {
            report_holdout_error(&err);
            return Err(err).context("restore failed");
        }
    };

    let verb = if report.dry_run { "Would restore" } else { "Restored" };
    println!(
        "{verb} {} scenario file(s) from {}",
        report.restored_scenario_files.len(),
        report.reference
    );
    for target in &report.restored_targets {
        println!("Uncommented Makefile target {target}");
    }
    if let Some(fingerprint) = &report.fingerprint {
        println!("Corpus fingerprint: {fingerprint}");
    }
    tracing::info!(
        dry_run = report.dry_run,
        "Restore checked out {} scenario file(s) from {}",
        report.restored_scenario_files.len(),
        report.reference
    );
    if !report.dry_run {
        println!("Changes are unstaged; review and commit them yourself");
    }
    Ok(EXIT_OK)
}

pub(crate) async fn status(ctx: &Invocation) -> Result<i32> {
    let gate = HoldoutGate::from_config(&ctx.config, &ctx.repo_root);
    let state = gate.status().await.context("reading holdout state")?;
    tracing::debug!("Holdout state at {}: {}", ctx.repo_root.display(), state);
    let ops: Vec<String> = state.allowed_ops().iter().map(ToString::to_string).collect();
    println!("Holdout: {state}");
    println!("Allowed: {}", ops.join(", "));
    Ok(EXIT_OK)
}
