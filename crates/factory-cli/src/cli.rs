//! Command-line surface

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

/// Build the `dark-factory` command tree
pub(crate) fn build_cli() -> Command {
    Command::new("dark-factory")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Holdout-scenario evaluation and convergence feedback")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Config file (default: factory.toml/.yaml/.yml in the repo root)"),
        )
        .arg(
            Arg::new("repo-root")
                .long("repo-root")
                .global(true)
                .default_value(".")
                .value_parser(value_parser!(PathBuf))
                .help("Repository root"),
        )
        .subcommand(
            Command::new("run-scenarios")
                .about("Run holdout scenarios and write the satisfaction report")
                .arg(
                    Arg::new("category")
                        .long("category")
                        .help("Only run scenarios of this category (case-insensitive)"),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .value_parser(value_parser!(u64).range(1..))
                        .help("Per-scenario timeout in seconds (default: 300)"),
                )
                .arg(
                    Arg::new("scenarios-dir")
                        .long("scenarios-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Scenario directory (default: scenarios/)"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Report path (default: artifacts/factory/scenario_results.json)"),
                ),
        )
        .subcommand(
            Command::new("compile-feedback")
                .about("Compile the feedback document for the next iteration")
                .arg(
                    Arg::new("iteration")
                        .long("iteration")
                        .value_parser(value_parser!(u32))
                        .help("Override iteration number (default: auto)"),
                )
                .arg(
                    Arg::new("factory-dir")
                        .long("factory-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Factory artifacts dir (default: artifacts/factory/)"),
                ),
        )
        .subcommand(
            Command::new("strip")
                .about("Remove the holdout corpus from the working tree")
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Report what would be removed"),
                )
                .arg(
                    Arg::new("no-commit")
                        .long("no-commit")
                        .action(ArgAction::SetTrue)
                        .help("Leave the changes uncommitted"),
                ),
        )
        .subcommand(
            Command::new("restore")
                .about("Check the holdout corpus back out of a trusted ref")
                .arg(
                    Arg::new("ref")
                        .long("ref")
                        .help("Trusted git ref (default: origin/main)"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Report what would be restored"),
                )
                .arg(
                    Arg::new("expected-count")
                        .long("expected-count")
                        .value_parser(value_parser!(u64).range(1..))
                        .help("Fail unless exactly this many files are restored"),
                ),
        )
        .subcommand(Command::new("status").about("Show whether the holdout corpus is present"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn run_scenarios_flags() {
        let matches = build_cli()
            .try_get_matches_from([
                "dark-factory",
                "run-scenarios",
                "--category",
                "training",
                "--timeout",
                "60",
                "--output",
                "out.json",
            ])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "run-scenarios");
        assert_eq!(args.get_one::<String>("category").map(String::as_str), Some("training"));
        assert_eq!(args.get_one::<u64>("timeout"), Some(&60));
        assert_eq!(args.get_one::<PathBuf>("output"), Some(&PathBuf::from("out.json")));
        assert!(args.get_one::<PathBuf>("scenarios-dir").is_none());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(build_cli()
            .try_get_matches_from(["dark-factory", "run-scenarios", "--timeout", "0"])
            .is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["dark-factory", "strip", "--dry-run", "--repo-root", "/tmp/repo"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert!(args.get_flag("dry-run"));
        assert!(!args.get_flag("no-commit"));
        assert_eq!(args.get_one::<PathBuf>("repo-root"), Some(&PathBuf::from("/tmp/repo")));
    }

    #[test]
    fn restore_and_feedback_flags() {
        let matches = build_cli()
            .try_get_matches_from(["dark-factory", "restore", "--ref", "HEAD~1", "--expected-count", "12"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.get_one::<String>("ref").map(String::as_str), Some("HEAD~1"));
        assert_eq!(args.get_one::<u64>("expected-count"), Some(&12));

        let matches = build_cli()
            .try_get_matches_from(["dark-factory", "compile-feedback", "--iteration", "4"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.get_one::<u32>("iteration"), Some(&4));
    }

    #[test]
    fn zero_expected_count_is_rejected() {
        assert!(build_cli()
            .try_get_matches_from(["dark-factory", "restore", "--expected-count", "0"])
            .is_err());
    }

    #[test]
    fn subcommand_is_required() {
        assert!(build_cli().try_get_matches_from(["dark-factory"]).is_err());
    }
}
