//! Makefile hook comment codec
//!
//! A stripped target block is wrapped as:
//!
//! ```text
//! # [factory:holdout-stripped] — stripped by dark-factory
//! # run-scenarios:
//! # 	python scripts/run_scenarios.py
//! # end [factory:holdout-stripped]
//! ```
//!
//! Every original line gains a `# ` prefix, blank lines become a bare `#`.
//! Uncommenting reverses that exactly, so `uncomment(comment(T)) == T`.

use once_cell::sync::Lazy;
use regex::Regex;

static TARGET_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w[\w-]*):").expect("target name pattern is valid"));

/// Result of commenting out targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commented {
    /// Rewritten Makefile text
    pub content: String,
    /// Targets found and wrapped, in request order
    pub targets: Vec<String>,
}

/// Result of restoring stripped blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uncommented {
    /// Rewritten Makefile text
    pub content: String,
    /// Target names recovered from the restored blocks
    pub targets: Vec<String>,
}

/// Recipe block for `target`: its rule line plus following tab-indented lines
///
/// Blank lines between recipe lines belong to the block; trailing blank
/// lines do not.
fn target_pattern(target: &str) -> Regex {
    let pattern = format!(r"(?m)^({}:[^\n]*(?:(?:\n[ \t]*)*\n\t[^\n]*)*)", regex::escape(target));
    Regex::new(&pattern).expect("escaped target pattern is valid")
}

fn block_pattern(marker: &str) -> Regex {
    let marker = regex::escape(marker);
    let pattern = format!(r"(?m)^# {marker}[^\n]*\n((?:#(?: [^\n]*)?\n)*?)# end {marker}");
    Regex::new(&pattern).expect("escaped marker pattern is valid")
}

/// Begin line of a stripped block
#[must_use]
pub fn begin_line(marker: &str) -> String {
    format!("# {marker} — stripped by dark-factory")
}

/// End line of a stripped block
#[must_use]
pub fn end_line(marker: &str) -> String {
    format!("# end {marker}")
}

/// Wrap one block of Makefile text in marker comments
#[must_use]
pub fn comment_block(block: &str, marker: &str) -> String {
    let mut out = begin_line(marker);
    for line in block.split('\n') {
        out.push('\n');
        if line.is_empty() {
            out.push('#');
        } else {
            out.push_str("# ");
            out.push_str(line);
        }
    }
    out.push('\n');
    out.push_str(&end_line(marker));
    out
}

fn uncomment_line(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix("# ") {
        rest
    } else if line == "#" {
        ""
    } else {
        line
    }
}

/// Comment out the first recipe block of each target
///
/// Targets that are absent or already commented are skipped, which makes
/// repeated stripping a no-op.
#[must_use]
pub fn comment_targets(content: &str, targets: &[String], marker: &str) -> Commented {
    let mut content = content.to_string();
    let mut found = Vec::new();

    for target in targets {
        let pattern = target_pattern(target);
        let Some(range) = pattern.captures(&content).and_then(|caps| caps.get(1)).map(|m| m.range()) else {
            continue;
        };
        let replacement = comment_block(&content[range.clone()], marker);
        content.replace_range(range, &replacement);
        found.push(target.clone());
    }

    Commented { content, targets: found }
}

/// Restore every marker-wrapped block
///
/// Each block is matched up to its own end marker, so adjacent blocks are
/// restored independently. Blocks written by earlier tooling with a
/// different begin-line suffix are accepted.
#[must_use]
pub fn uncomment_blocks(content: &str, marker: &str) -> Uncommented {
    let pattern = block_pattern(marker);
    let mut out = String::with_capacity(content.len());
    let mut targets = Vec::new();
    let mut last = 0;

    for caps in pattern.captures_iter(content) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let restored = body
            .as_str()
            .strip_suffix('\n')
            .unwrap_or(body.as_str())
            .split('\n')
            .map(uncomment_line)
            .collect::<Vec<_>>()
            .join("\n");

        if let Some(name) = TARGET_NAME.captures(&restored).and_then(|c| c.get(1)) {
            targets.push(name.as_str().to_string());
        }

        out.push_str(&content[last..whole.start()]);
        out.push_str(&restored);
        last = whole.end();
    }
    out.push_str(&content[last..]);

    Uncommented { content: out, targets }
}

/// Whether any target still has an active (uncommented) recipe
#[must_use]
pub fn has_active_target(content: &str, targets: &[String]) -> bool {
    targets.iter().any(|t| target_pattern(t).is_match(content))
}

/// Whether the content holds at least one stripped block
#[must_use]
pub fn has_stripped_block(content: &str, marker: &str) -> bool {
    block_pattern(marker).is_match(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use factory_config::DEFAULT_MARKER;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const MAKEFILE: &str = "\
.PHONY: test run-scenarios compile-feedback

test:
\tpytest -q

run-scenarios:
\tpython scripts/run_scenarios.py --timeout 300

\t@echo done

compile-feedback:
\tpython scripts/compile_feedback.py

lint:
\truff check .
";

    fn targets() -> Vec<String> {
        vec!["run-scenarios".to_string(), "compile-feedback".to_string()]
    }

    #[test]
    fn comments_recipe_blocks() {
        let commented = comment_targets(MAKEFILE, &targets(), DEFAULT_MARKER);
        assert_eq!(commented.targets, targets());
        assert!(commented.content.contains(
            "# [factory:holdout-stripped] — stripped by dark-factory\n# run-scenarios:\n# \tpython scripts/run_scenarios.py --timeout 300\n#\n# \t@echo done\n# end [factory:holdout-stripped]\n"
        ));
        assert!(commented.content.contains("\ntest:\n\tpytest -q\n"));
        assert!(commented.content.contains("\nlint:\n\truff check .\n"));
        assert!(!has_active_target(&commented.content, &targets()));
        assert!(has_stripped_block(&commented.content, DEFAULT_MARKER));
    }

    #[test]
    fn round_trip_is_exact() {
        let commented = comment_targets(MAKEFILE, &targets(), DEFAULT_MARKER);
        let restored = uncomment_blocks(&commented.content, DEFAULT_MARKER);
        assert_eq!(restored.content, MAKEFILE);
        assert_eq!(restored.targets, targets());
    }

    #[test]
    fn stripping_twice_is_a_no_op() {
        let once = comment_targets(MAKEFILE, &targets(), DEFAULT_MARKER);
        let twice = comment_targets(&once.content, &targets(), DEFAULT_MARKER);
        assert_eq!(twice.content, once.content);
        assert!(twice.targets.is_empty());
    }

    #[test]
    fn absent_targets_are_skipped() {
        let commented = comment_targets("all:\n\techo hi\n", &targets(), DEFAULT_MARKER);
        assert_eq!(commented.content, "all:\n\techo hi\n");
        assert!(commented.targets.is_empty());
    }

    #[test]
    fn target_at_end_without_newline() {
        let content = "run-scenarios:\n\tpython run.py";
        let commented = comment_targets(content, &targets(), DEFAULT_MARKER);
        assert!(commented.content.ends_with("# end [factory:holdout-stripped]"));
        assert_eq!(uncomment_blocks(&commented.content, DEFAULT_MARKER).content, content);
    }

    #[test]
    fn legacy_blocks_are_restored() {
        let legacy = "x:\n\ty\n# [factory:holdout-stripped] — stripped by strip_holdout.py\n# run-scenarios:\n# \tpython scripts/run_scenarios.py\n# end [factory:holdout-stripped]\n";
        let restored = uncomment_blocks(legacy, DEFAULT_MARKER);
        assert_eq!(restored.content, "x:\n\ty\nrun-scenarios:\n\tpython scripts/run_scenarios.py\n");
        assert_eq!(restored.targets, vec!["run-scenarios"]);
    }

    #[test]
    fn adjacent_blocks_restore_independently() {
        let content = "a:\n\tone\nb:\n\ttwo\n";
        let names = vec!["a".to_string(), "b".to_string()];
        let commented = comment_targets(content, &names, DEFAULT_MARKER);
        assert_eq!(commented.content.matches("# end ").count(), 2);
        let restored = uncomment_blocks(&commented.content, DEFAULT_MARKER);
        assert_eq!(restored.content, content);
        assert_eq!(restored.targets, names);
    }

    #[test]
    fn ordinary_comments_are_untouched() {
        let content = "# build everything\nall:\n\tmake\n";
        assert_eq!(uncomment_blocks(content, DEFAULT_MARKER).content, content);
    }

    fn recipe_line() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z0-9 ./=-]{1,30}".prop_map(|s| format!("\t{s}")),
            Just(String::new()),
            Just("\t".to_string()),
        ]
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            prefix in "([a-z]{1,8}:\n\t[a-z ]{0,20}\n){0,3}",
            deps in "[a-z ]{0,20}",
            recipe in proptest::collection::vec(recipe_line(), 0..8),
            suffix in "(\n[a-z]{1,8}:\n\t[a-z ]{0,20}){0,3}\n?",
        ) {
            let mut block = format!("run-scenarios:{deps}");
            for line in &recipe {
                block.push('\n');
                block.push_str(line);
            }
            let content = format!("{prefix}{block}{suffix}");

            let commented = comment_targets(&content, &targets(), DEFAULT_MARKER);
            prop_assert_eq!(commented.targets.clone(), vec!["run-scenarios".to_string()]);
            let restored = uncomment_blocks(&commented.content, DEFAULT_MARKER);
            prop_assert_eq!(restored.content, content);
        }
    }
}
