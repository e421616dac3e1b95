//! Static analyzer stage
//!
//! Invokes the external analyzer on the submitted source and normalizes its
//! findings into a flat issue list. The external tool being absent is not a
//! pipeline failure: a single synthetic finding notes the absence and the
//! stage carries on. A small set of built-in checks for unsafe libc calls
//! runs unconditionally, so the stage produces signal even with no analyzer
//! installed.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{GraderConfig, SOURCE_FILE};
use crate::runner::{run_command_line, RunStatus};

/// Unsafe libc calls flagged by the built-in scan.
const UNSAFE_CALLS: &[(&str, &str)] = &[
    ("gets", "cannot bound its read; use fgets"),
    ("strcpy", "does not check the destination size; use strncpy"),
    ("strcat", "does not check the destination size; use strncat"),
    ("sprintf", "can overflow its buffer; use snprintf"),
    ("system", "runs an arbitrary shell command"),
];

/// Findings from static analysis: ordered free-text issues.
///
/// Downstream scoring penalizes by issue count; there is no per-issue
/// severity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticReport {
    pub issues: Vec<String>,
}

impl StaticReport {
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }
}

/// Analyze the submitted source: external tool findings first, built-in
/// checks appended. Never fails.
pub async fn analyze_source(
    config: &GraderConfig,
    workspace_path: &std::path::Path,
    source: &str,
) -> StaticReport {
    let mut issues = Vec::new();

    debug!("Analyzing with {:?}", config.analyze_command);
    let outcome = run_command_line(
        &config.analyze_command,
        workspace_path,
        None,
        config.analyze_timeout_ms,
    )
    .await;

    match outcome.status {
        RunStatus::Exited(_) => {
            issues.extend(harvest_tool_lines(&outcome.stdout));
            issues.extend(harvest_tool_lines(&outcome.stderr));
        }
        RunStatus::TimedOut => {
            issues.push(format!(
                "static analysis timed out after {}ms",
                config.analyze_timeout_ms
            ));
        }
        RunStatus::SpawnError => {
            issues.push(format!("static analysis tool unavailable: {}", outcome.stderr));
        }
    }

    issues.extend(scan_unsafe_calls(source));

    info!("Static analysis produced {} issue(s)", issues.len());
    StaticReport { issues }
}

/// Keep every non-empty analyzer output line except banner and progress
/// lines ("Checking ..." progress, "cppcheck:" notices, "nofile" hints).
fn harvest_tool_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with("Checking ")
                && !line.starts_with("cppcheck:")
                && !line.starts_with("nofile")
        })
        .map(str::to_string)
        .collect()
}

/// Flag calls to known-unsafe libc functions in the raw source text.
fn scan_unsafe_calls(source: &str) -> Vec<String> {
    let mut issues = Vec::new();
    for (line_no, line) in source.lines().enumerate() {
        for (name, reason) in UNSAFE_CALLS {
            if contains_call(line, name) {
                issues.push(format!(
                    "{}:{}: call to '{}' {}",
                    SOURCE_FILE,
                    line_no + 1,
                    name,
                    reason
                ));
            }
        }
    }
    issues
}

/// True if `line` contains a call to `name` as a standalone identifier
/// (so `gets(` matches but `fgets(` does not).
fn contains_call(line: &str, name: &str) -> bool {
    let pattern = format!("{}(", name);
    for (idx, _) in line.match_indices(&pattern) {
        let preceded_by_ident = idx > 0
            && line[..idx]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
        if !preceded_by_ident {
            return true;
        }
    }
    false
}
