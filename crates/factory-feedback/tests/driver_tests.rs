//! Feedback driver over a populated factory directory

use factory_config::FactoryConfig;
use factory_feedback::{load_trajectory, FeedbackCompiler, FeedbackDriver, COUNTER_FILE, TRAJECTORY_FILE};
use factory_scenario::write_report;
use factory_test_utils::{failing_result, passing_result, report_of, report_with, write_feedback, write_file};

fn compiler() -> FeedbackCompiler {
    FeedbackCompiler::new().with_generated_at("2026-03-01 12:00:00 UTC")
}

#[test]
fn compiles_from_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = FactoryConfig::default();
    let factory = config.factory_dir(dir.path());
    write_report(&report_with(7, 10), &config.results_path(dir.path())).unwrap();
    write_file(&factory, "ci_output.log", "pytest: 3 failed\n");
    write_feedback(&factory, 1, "- **Satisfaction score: 20%** (2/10 scenarios passed)");
    write_feedback(&factory, 2, "- **Satisfaction score: 50%** (5/10 scenarios passed)");
    std::fs::write(factory.join(COUNTER_FILE), "2\n").unwrap();

    let driver = FeedbackDriver::from_config(&config, dir.path());
    let outcome = driver.compile_with(&compiler(), None).unwrap();

    assert_eq!(outcome.iteration, 3);
    assert_eq!(outcome.satisfaction_score, Some(0.7));
    assert_eq!(outcome.passed, Some(7));
    assert_eq!(outcome.total, Some(10));

    let doc = std::fs::read_to_string(&outcome.path).unwrap();
    assert!(doc.starts_with("# Factory Feedback — Iteration 3\nGenerated: 2026-03-01 12:00:00 UTC\n"));
    assert!(doc.contains("70%"));
    assert!(doc.contains("7/10"));
    assert!(doc.contains("| 1 | - **Satisfaction score: 20%** (2/10 scenarios passed) |"));
    assert!(doc.contains("| 2 | - **Satisfaction score: 50%** (5/10 scenarios passed) |"));
    assert!(doc.contains("Assertion failures in 3 scenario(s): fail_7, fail_8, fail_9."));
    assert!(doc.contains("### fail_7"));
    assert!(doc.contains("## CI Log Output\n```\npytest: 3 failed\n\n```"));
    assert_eq!(std::fs::read_to_string(factory.join(COUNTER_FILE)).unwrap(), "3\n");
}

#[test]
fn consecutive_runs_build_a_trajectory() {
    let dir = tempfile::tempdir().unwrap();
    let factory = dir.path().join("factory");
    let results = factory.join("scenario_results.json");
    let driver = FeedbackDriver::new(&factory, FactoryConfig::default().feedback);

    write_report(&report_of(vec![failing_result("env", "ModuleNotFoundError: x")]), &results).unwrap();
    assert_eq!(driver.compile_with(&compiler(), None).unwrap().iteration, 1);

    write_report(&report_of(vec![passing_result("env")]), &results).unwrap();
    let second = driver.compile_with(&compiler(), None).unwrap();
    assert_eq!(second.iteration, 2);

    let doc = std::fs::read_to_string(&second.path).unwrap();
    assert!(doc.contains("| 1 | - **Satisfaction score: 0%** (0/1 scenarios passed) |"));

    let trajectory = load_trajectory(&factory);
    assert_eq!(trajectory.len(), 2);
    assert_eq!(trajectory[1].headline(), "- **Satisfaction score: 100%** (1/1 scenarios passed)");
    let sidecar = std::fs::read_to_string(factory.join(TRAJECTORY_FILE)).unwrap();
    assert_eq!(sidecar.lines().count(), 2);
}

#[test]
fn iteration_ten_sorts_after_nine() {
    let dir = tempfile::tempdir().unwrap();
    for n in [9, 10, 1] {
        write_feedback(dir.path(), n, &format!("- iteration {n}"));
    }
    let driver = FeedbackDriver::new(dir.path(), FactoryConfig::default().feedback);
    let outcome = driver.compile_with(&compiler(), Some(11)).unwrap();

    let doc = std::fs::read_to_string(outcome.path).unwrap();
    let rows: Vec<&str> = doc.lines().filter(|l| l.starts_with("| ") && !l.starts_with("| Iteration")).collect();
    assert_eq!(rows, vec!["| 1 | - iteration 1 |", "| 9 | - iteration 9 |", "| 10 | - iteration 10 |"]);
}

#[test]
fn malformed_results_degrade_to_no_results() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "scenario_results.json", "{ truncated");
    let driver = FeedbackDriver::new(dir.path(), FactoryConfig::default().feedback);

    let outcome = driver.compile_with(&compiler(), None).unwrap();
    assert!(outcome.satisfaction_score.is_none());
    let doc = std::fs::read_to_string(outcome.path).unwrap();
    assert!(doc.contains("No scenario results available"));
}
