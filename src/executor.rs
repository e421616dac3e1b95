//! Test executor
//!
//! Runs the compiled artifact once per normalized test case: a fresh
//! process each time, the case input piped to stdin, stdout/stderr
//! captured, and an independent wall-clock bound per run. A submission
//! that hangs or crashes on one test never prevents the remaining tests
//! from being attempted.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GraderConfig;
use crate::runner::{run_with_timeout, RunStatus};
use crate::testspec::TestCase;

/// Placeholder recorded as the observed output when a test times out.
pub const TIMEOUT_OUTPUT: &str = "(timeout)";

/// Judged execution result for one test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestOutcome {
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    /// Observed stdout, verbatim (or the timeout placeholder)
    pub actual: String,
    pub stderr: String,
    /// Wall-clock seconds for this run; absent when the process never ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_secs: Option<f64>,
    pub passed: bool,
    /// Human-readable classification of what happened
    pub note: String,
}

/// Aggregate over all test outcomes of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestReport {
    pub outcomes: Vec<TestOutcome>,
    pub passed: usize,
    pub total: usize,
    /// 100 * passed / total, or 0 when no tests ran
    pub score_percent: f64,
}

impl TestReport {
    /// Report for a run where no tests were executed (no cases supplied,
    /// or the compile stage gated them away).
    pub fn empty() -> Self {
        Self {
            outcomes: Vec::new(),
            passed: 0,
            total: 0,
            score_percent: 0.0,
        }
    }

    fn from_outcomes(outcomes: Vec<TestOutcome>) -> Self {
        let total = outcomes.len();
        let passed = outcomes.iter().filter(|o| o.passed).count();
        let score_percent = if total == 0 {
            0.0
        } else {
            100.0 * passed as f64 / total as f64
        };
        Self {
            outcomes,
            passed,
            total,
            score_percent,
        }
    }
}

/// Execute every test case against the artifact, in order.
pub async fn run_tests(
    config: &GraderConfig,
    artifact: &Path,
    work_dir: &Path,
    cases: &[TestCase],
) -> TestReport {
    let mut outcomes = Vec::with_capacity(cases.len());

    for (idx, case) in cases.iter().enumerate() {
        debug!("Running test {}/{}", idx + 1, cases.len());
        outcomes.push(run_single_test(config, artifact, work_dir, case).await);
    }

    let report = TestReport::from_outcomes(outcomes);
    info!("Tests passed: {}/{}", report.passed, report.total);
    report
}

async fn run_single_test(
    config: &GraderConfig,
    artifact: &Path,
    work_dir: &Path,
    case: &TestCase,
) -> TestOutcome {
    let outcome = run_with_timeout(
        artifact,
        &[],
        work_dir,
        Some(&case.input),
        config.per_test_timeout_ms,
    )
    .await;

    let elapsed_secs = outcome.elapsed_secs();

    match outcome.status {
        RunStatus::TimedOut => TestOutcome {
            input: case.input.clone(),
            expected: case.expected.clone(),
            actual: TIMEOUT_OUTPUT.to_string(),
            stderr: outcome.stderr,
            elapsed_secs: Some(elapsed_secs),
            passed: false,
            note: format!(
                "exceeded the {}ms time limit and was killed",
                config.per_test_timeout_ms
            ),
        },
        RunStatus::SpawnError => TestOutcome {
            input: case.input.clone(),
            expected: case.expected.clone(),
            actual: String::new(),
            stderr: outcome.stderr.clone(),
            elapsed_secs: None,
            passed: false,
            note: format!("runtime error: {}", outcome.stderr),
        },
        RunStatus::Exited(code) => {
            let (passed, note) = match &case.expected {
                // Exact match after outer trim; no further normalization.
                Some(expected) => {
                    if outcome.stdout.trim() == expected.trim() {
                        (true, "output matched the expected output".to_string())
                    } else if code != 0 {
                        (
                            false,
                            format!("output mismatch (exited with status {})", code),
                        )
                    } else {
                        (false, "output did not match the expected output".to_string())
                    }
                }
                // No expected output: judged by exit status alone.
                None => {
                    if code == 0 {
                        (true, "ran to completion (exit status 0)".to_string())
                    } else {
                        (false, format!("exited with status {}", code))
                    }
                }
            };

            TestOutcome {
                input: case.input.clone(),
                expected: case.expected.clone(),
                actual: outcome.stdout,
                stderr: outcome.stderr,
                elapsed_secs: Some(elapsed_secs),
                passed,
                note,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    /// Write an executable shell script standing in for a compiled artifact.
    fn write_script(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("fake_artifact");
        std::fs::write(&path, contents).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn test_config(timeout_ms: u64) -> GraderConfig {
        let mut config = GraderConfig::load_defaults().unwrap();
        config.per_test_timeout_ms = timeout_ms;
        config
    }

    #[tokio::test]
    async fn test_trimmed_output_match_passes() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_script(dir.path(), "#!/bin/sh\ncat\n");
        let cases = vec![TestCase::new("hello\n", Some("hello"))];

        let report = run_tests(&test_config(5_000), &artifact, dir.path(), &cases).await;

        assert_eq!(report.passed, 1);
        assert_eq!(report.total, 1);
        assert_eq!(report.score_percent, 100.0);
        assert!(report.outcomes[0].elapsed_secs.is_some());
    }

    #[tokio::test]
    async fn test_output_mismatch_fails() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_script(dir.path(), "#!/bin/sh\necho wrong\n");
        let cases = vec![TestCase::new("x", Some("right"))];

        let report = run_tests(&test_config(5_000), &artifact, dir.path(), &cases).await;

        assert_eq!(report.passed, 0);
        assert_eq!(report.outcomes[0].actual.trim(), "wrong");
        assert!(report.outcomes[0].note.contains("did not match"));
    }

    #[tokio::test]
    async fn test_hanging_case_does_not_block_later_cases() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_script(
            dir.path(),
            "#!/bin/sh\nread line\nif [ \"$line\" = \"hang\" ]; then while :; do :; done; fi\necho \"$line\"\n",
        );
        let cases = vec![
            TestCase::new("hang\n", Some("never")),
            TestCase::new("ok\n", Some("ok")),
        ];

        let report = run_tests(&test_config(500), &artifact, dir.path(), &cases).await;

        assert_eq!(report.total, 2);
        assert_eq!(report.outcomes[0].actual, TIMEOUT_OUTPUT);
        assert!(!report.outcomes[0].passed);
        assert!(report.outcomes[0].note.contains("time limit"));
        assert!(report.outcomes[1].passed);
        assert_eq!(report.score_percent, 50.0);
    }

    #[tokio::test]
    async fn test_no_expected_output_judged_by_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let ok_artifact = write_script(dir.path(), "#!/bin/sh\nexit 0\n");
        let cases = vec![TestCase::new("anything", None::<String>)];

        let report = run_tests(&test_config(5_000), &ok_artifact, dir.path(), &cases).await;
        assert!(report.outcomes[0].passed);
        assert!(report.outcomes[0].note.contains("exit status 0"));

        let bad_artifact = write_script(dir.path(), "#!/bin/sh\nexit 2\n");
        let report = run_tests(&test_config(5_000), &bad_artifact, dir.path(), &cases).await;
        assert!(!report.outcomes[0].passed);
        assert!(report.outcomes[0].note.contains("status 2"));
    }

    #[tokio::test]
    async fn test_unlaunchable_artifact_is_isolated_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not_built");
        let cases = vec![TestCase::new("1", Some("1"))];

        let report = run_tests(&test_config(1_000), &missing, dir.path(), &cases).await;

        assert_eq!(report.total, 1);
        assert!(!report.outcomes[0].passed);
        assert!(report.outcomes[0].note.contains("runtime error"));
        assert!(report.outcomes[0].elapsed_secs.is_none());
    }

    #[tokio::test]
    async fn test_empty_case_list_scores_zero() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_script(dir.path(), "#!/bin/sh\ncat\n");

        let report = run_tests(&test_config(1_000), &artifact, dir.path(), &[]).await;

        assert_eq!(report.total, 0);
        assert_eq!(report.score_percent, 0.0);
    }

    #[tokio::test]
    async fn test_outcomes_preserve_case_order() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = write_script(dir.path(), "#!/bin/sh\ncat\n");
        let cases = vec![
            TestCase::new("first\n", Some("first")),
            TestCase::new("second\n", Some("second")),
            TestCase::new("third\n", Some("nope")),
        ];

        let report = run_tests(&test_config(5_000), &artifact, dir.path(), &cases).await;

        let inputs: Vec<&str> = report.outcomes.iter().map(|o| o.input.as_str()).collect();
        assert_eq!(inputs, vec!["first\n", "second\n", "third\n"]);
        assert_eq!(report.passed, 2);
    }
}
