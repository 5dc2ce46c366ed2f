//! Root-cause inference
//!
//! Only failing results are scanned. Each cause is a fixed set of substring
//! signatures over the combined output; a result may land in several buckets.

use factory_scenario::{ScenarioReport, ScenarioResult};

/// Sentence emitted when no bucket matched
pub const NO_CLEAR_PATTERN: &str = "No clear pattern detected — review individual failure details below.";

/// Failure signature families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootCause {
    ImportError,
    AssertionFailure,
    Timeout,
    MissingFile,
}

impl RootCause {
    /// Output order of the root-cause section
    pub const REPORT_ORDER: [RootCause; 4] = [
        RootCause::ImportError,
        RootCause::AssertionFailure,
        RootCause::Timeout,
        RootCause::MissingFile,
    ];

    /// Fix-priority ladder, most fundamental first
    pub const PRIORITY_ORDER: [RootCause; 4] = [
        RootCause::ImportError,
        RootCause::MissingFile,
        RootCause::Timeout,
        RootCause::AssertionFailure,
    ];

    /// Whether `output` carries this cause's signature
    #[must_use]
    pub fn matches(self, output: &str) -> bool {
        let signatures: &[&str] = match self {
            Self::ImportError => &["ModuleNotFoundError", "ImportError"],
            Self::AssertionFailure => &["AssertionError"],
            Self::Timeout => &["TIMEOUT"],
            Self::MissingFile => &["FileNotFoundError", "No such file"],
        };
        signatures.iter().any(|sig| output.contains(sig))
    }

    fn label(self) -> &'static str {
        match self {
            Self::ImportError => "Import errors",
            Self::AssertionFailure => "Assertion failures",
            Self::Timeout => "Timeouts",
            Self::MissingFile => "Missing files",
        }
    }

    fn explanation(self) -> &'static str {
        match self {
            Self::ImportError => "Likely missing module or wrong import path.",
            Self::AssertionFailure => "Check the specific assertion messages.",
            Self::Timeout => "Possible infinite loop or slow computation.",
            Self::MissingFile => "Expected artifacts not being created.",
        }
    }

    /// Instruction line for the priority ladder
    #[must_use]
    pub fn priority_text(self) -> &'static str {
        match self {
            Self::ImportError => "Import errors and missing modules",
            Self::MissingFile => "File/artifact production issues",
            Self::Timeout => "Timeouts and slow computations",
            Self::AssertionFailure => "Behavioral assertion failures",
        }
    }
}

/// Failing scenarios sharing one cause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CauseBucket {
    pub cause: RootCause,
    pub scenarios: Vec<String>,
}

impl CauseBucket {
    /// Human-readable root-cause sentence
    #[must_use]
    pub fn sentence(&self) -> String {
        format!(
            "{} in {} scenario(s): {}. {}",
            self.cause.label(),
            self.scenarios.len(),
            self.scenarios.join(", "),
            self.cause.explanation()
        )
    }
}

fn display_name(result: &ScenarioResult) -> String {
    if result.name.is_empty() {
        "unknown".to_string()
    } else {
        result.name.clone()
    }
}

/// Non-empty buckets in report order
#[must_use]
pub fn classify(report: &ScenarioReport) -> Vec<CauseBucket> {
    RootCause::REPORT_ORDER
        .iter()
        .filter_map(|&cause| {
            let scenarios: Vec<String> = report
                .failures()
                .filter(|result| cause.matches(&result.combined_output()))
                .map(display_name)
                .collect();
            (!scenarios.is_empty()).then_some(CauseBucket { cause, scenarios })
        })
        .collect()
}

/// Root-cause sentences, never empty
#[must_use]
pub fn infer_causes(report: &ScenarioReport) -> Vec<String> {
    let buckets = classify(report);
    if buckets.is_empty() {
        return vec![NO_CLEAR_PATTERN.to_string()];
    }
    buckets.iter().map(CauseBucket::sentence).collect()
}
