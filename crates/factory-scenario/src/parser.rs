//! Scenario markdown parser
//!
//! Extraction is heading-scan based, not a markdown grammar. Each section is
//! the text between `## <Heading>` and the next `## ` heading or end of file.
//! Missing sections become empty values; a missing title falls back to the
//! file stem.

use crate::error::{RunResult, ScenarioError};
use crate::model::Scenario;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Fixed section headings of a scenario document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Category,
    Preconditions,
    BehavioralExpectation,
    EvaluationMethod,
    PassCriteria,
    EvidenceRequired,
}

impl Section {
    /// Every section, in document order
    pub const ALL: [Section; 6] = [
        Section::Category,
        Section::Preconditions,
        Section::BehavioralExpectation,
        Section::EvaluationMethod,
        Section::PassCriteria,
        Section::EvidenceRequired,
    ];

    /// Heading text after `## `
    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Section::Category => "Category",
            Section::Preconditions => "Preconditions",
            Section::BehavioralExpectation => "Behavioral Expectation",
            Section::EvaluationMethod => "Evaluation Method",
            Section::PassCriteria => "Pass Criteria",
            Section::EvidenceRequired => "Evidence Required",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

static SECTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    Section::ALL
        .iter()
        .map(|section| {
            let pattern = format!(r"(?s)## {}\s*\n(.*?)(?:\n## |\z)", regex::escape(section.heading()));
            Regex::new(&pattern).expect("section heading pattern is valid")
        })
        .collect()
});

static TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"# Scenario:\s*(.+)").expect("title pattern is valid"));

static CODE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:bash|sh)?\s*\n(.*?)```").expect("code block pattern is valid"));

/// Parses scenario documents
#[derive(Debug, Default, Clone, Copy)]
pub struct ScenarioParser;

impl ScenarioParser {
    /// Read and parse one scenario file
    ///
    /// # Errors
    /// Returns `ScenarioError::Io` if the file cannot be read. Content
    /// problems never fail.
    pub fn parse_file(path: &Path) -> RunResult<Scenario> {
        let content = std::fs::read_to_string(path).map_err(|e| ScenarioError::io_error(path, e))?;
        Ok(Self::parse_str(&content, path))
    }

    /// Parse scenario markdown; `path` supplies `file_path` and the fallback name
    #[must_use]
    pub fn parse_str(content: &str, path: &Path) -> Scenario {
        let name = TITLE
            .captures(content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| file_stem(path));

        let scenario = Scenario {
            name,
            file_path: path.display().to_string(),
            category: section(content, Section::Category).to_lowercase(),
            preconditions: list_items(&section(content, Section::Preconditions)),
            behavioral_expectation: section(content, Section::BehavioralExpectation),
            evaluation_method: evaluation_command(&section(content, Section::EvaluationMethod)),
            pass_criteria: section(content, Section::PassCriteria),
            evidence_required: list_items(&section(content, Section::EvidenceRequired)),
        };

        tracing::debug!(
            "Parsed scenario '{}' (category '{}', {} precondition(s))",
            scenario.name,
            scenario.category,
            scenario.preconditions.len()
        );
        scenario
    }
}

/// Trimmed body of a section, empty when absent
#[must_use]
pub fn section(content: &str, section: Section) -> String {
    SECTION_PATTERNS[section.index()]
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

fn evaluation_command(raw: &str) -> String {
    match CODE_BLOCK.captures(raw).and_then(|caps| caps.get(1)) {
        Some(block) => block.as_str().trim().to_string(),
        None => raw.to_string(),
    }
}

fn list_items(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.starts_with('-'))
        .map(|line| line.trim_start_matches(|c| c == '-' || c == ' ').trim().to_string())
        .collect()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
