//! Test specification normalizer
//!
//! Accepts the heterogeneous test-case shapes users (and the front-end)
//! supply and canonicalizes them into an ordered list of `TestCase`s:
//! - an already-structured list of cases
//! - a JSON array of records with `input`/`expected` fields
//! - delimiter-separated text, one `<input>::<expected>` case per line
//!
//! Malformed structured payloads degrade to line-oriented parsing; nothing
//! is rejected outright at this stage.

use serde::{Deserialize, Serialize};

/// Delimiter between input and expected output in textual test lines.
pub const TEST_DELIMITER: &str = "::";

/// A single test case.
///
/// `expected: None` means "run the program but judge only by exit status";
/// this is distinct from `Some("")`, which expects empty output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected: Option<impl Into<String>>) -> Self {
        Self {
            input: input.into(),
            expected: expected.map(Into::into),
        }
    }
}

/// The closed set of test specification shapes the pipeline accepts.
#[derive(Debug, Clone)]
pub enum TestSpec {
    /// Pre-structured list of cases, used as-is (order preserved)
    Cases(Vec<TestCase>),
    /// Raw text: JSON array of records, or delimiter-separated lines
    Text(String),
}

impl TestSpec {
    /// Canonicalize into an ordered list of test cases.
    ///
    /// Normalization is idempotent: feeding the output back in through
    /// `TestSpec::Cases` yields the same list.
    pub fn normalize(self) -> Vec<TestCase> {
        match self {
            TestSpec::Cases(cases) => cases,
            TestSpec::Text(text) => normalize_text(&text),
        }
    }
}

/// Parse raw text: structured JSON first, line-oriented fallback.
fn normalize_text(text: &str) -> Vec<TestCase> {
    if let Ok(cases) = serde_json::from_str::<Vec<TestCase>>(text) {
        return cases;
    }

    text.lines().filter_map(parse_line).collect()
}

/// Parse one textual test line. Blank lines yield `None`.
///
/// The split happens at the *first* delimiter occurrence only, so an
/// expected output may itself contain `::`.
fn parse_line(line: &str) -> Option<TestCase> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match line.split_once(TEST_DELIMITER) {
        Some((input, expected)) => Some(TestCase::new(input, Some(expected))),
        None => Some(TestCase::new(line, None::<String>)),
    }
}

/// Permissive parser for LLM-proposed test lines.
///
/// Model output does not always honor the `::` contract, so `->` and a
/// single `:` are accepted as separators and rewritten to the canonical
/// form. User-supplied specifications never go through this path.
pub fn parse_proposed_lines(text: &str) -> Vec<TestCase> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            if line.contains(TEST_DELIMITER) {
                return parse_line(line);
            }
            if let Some((input, expected)) = line.split_once("->") {
                return Some(TestCase::new(input.trim(), Some(expected.trim())));
            }
            if let Some((input, expected)) = line.split_once(':') {
                return Some(TestCase::new(input.trim(), Some(expected.trim())));
            }
            Some(TestCase::new(line, None::<String>))
        })
        .collect()
}
