//! End-to-end grading scenarios against the real C toolchain.
//!
//! These tests require `gcc` on the search path. The analyzer command is
//! stubbed out so scores stay deterministic regardless of whether cppcheck
//! is installed.

use std::time::{Duration, Instant};

use async_trait::async_trait;

use cgrader::{
    run_grader_pipeline, GradeRecord, GraderConfig, ReportGenerator, TestSpec,
};

const SUM_PROGRAM: &str = r#"
#include <stdio.h>
int main(void) {
    int a, b;
    scanf("%d %d", &a, &b);
    printf("%d\n", a + b);
    return 0;
}
"#;

const SYNTAX_ERROR_PROGRAM: &str = r#"
#include <stdio.h>
int main(void) {
    int a = 1
    return 0;
}
"#;

const INFINITE_LOOP_PROGRAM: &str = r#"
int main(void) {
    while (1) {}
    return 0;
}
"#;

fn grader_config() -> GraderConfig {
    let mut config = GraderConfig::load_defaults().unwrap();
    // Deterministic static stage: no external analyzer findings.
    config.analyze_command = vec!["true".into()];
    config
}

#[tokio::test]
async fn sum_program_earns_full_compile_and_test_credit() {
    let config = grader_config();
    let spec = TestSpec::Text("2 3::5\n10 20::30\n".into());

    let record = run_grader_pipeline(&config, SUM_PROGRAM, spec, None)
        .await
        .unwrap();

    assert!(record.compile.success, "gcc should accept the program");
    assert_eq!(record.tests.total, 2);
    assert_eq!(record.tests.passed, 2);
    assert_eq!(record.tests.score_percent, 100.0);
    assert!(record.perf.average_secs.is_some());
    // Full compile + test + static credit; perf credit at least partial.
    assert!(record.final_score >= 94.0, "score was {}", record.final_score);
    assert!(record.report_text.contains(&format!("{:.2}", record.final_score)));
}

#[tokio::test]
async fn syntax_error_gates_tests_and_perf() {
    let config = grader_config();
    let spec = TestSpec::Text("2 3::5\n10 20::30\n".into());

    let record = run_grader_pipeline(&config, SYNTAX_ERROR_PROGRAM, spec, None)
        .await
        .unwrap();

    assert!(!record.compile.success);
    assert_eq!(record.tests.total, 0);
    assert!(record.perf.average_secs.is_none());
    assert!(record.final_score <= 25.0, "score was {}", record.final_score);
    assert!(!record.compile.stderr.is_empty());
    assert!(!record.report_text.is_empty());
    assert!(record.report_text.contains(&format!("{:.2}", record.final_score)));
}

#[tokio::test]
async fn infinite_loop_times_out_without_stalling_the_pipeline() {
    let mut config = grader_config();
    config.per_test_timeout_ms = 1_000;
    config.perf_samples = 1;
    let spec = TestSpec::Text("anything::whatever\nsecond input::x\n".into());

    let start = Instant::now();
    let record = run_grader_pipeline(&config, INFINITE_LOOP_PROGRAM, spec, None)
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(record.tests.total, 2);
    assert!(!record.tests.outcomes[0].passed);
    assert_eq!(record.tests.outcomes[0].actual, "(timeout)");
    assert!(record.tests.outcomes[0].note.contains("time limit"));
    // The second test was still attempted after the first one hung.
    assert_eq!(record.tests.outcomes[1].actual, "(timeout)");
    // A hanging sample invalidates the performance measurement.
    assert!(record.perf.average_secs.is_none());
    // Two 1s tests, one 1s perf sample, plus compile: nowhere near a hang.
    assert!(elapsed < Duration::from_secs(30), "took {:?}", elapsed);
}

#[tokio::test]
async fn workspace_is_gone_after_grading() {
    let config = grader_config();
    let record = run_grader_pipeline(
        &config,
        SUM_PROGRAM,
        TestSpec::Text("1 1::2\n".into()),
        None,
    )
    .await
    .unwrap();

    assert!(!record.compile.workspace.exists());
    if let Some(artifact) = &record.compile.artifact {
        assert!(!artifact.exists());
    }
}

struct OutageReporter;

#[async_trait]
impl ReportGenerator for OutageReporter {
    async fn generate_report(&self, _record: &GradeRecord) -> anyhow::Result<String> {
        anyhow::bail!("network unreachable")
    }
}

#[tokio::test]
async fn report_is_produced_even_when_the_generator_is_down() {
    let config = grader_config();
    let record = run_grader_pipeline(
        &config,
        SUM_PROGRAM,
        TestSpec::Text("1 2::3\n".into()),
        Some(&OutageReporter),
    )
    .await
    .unwrap();

    assert!(!record.report_text.trim().is_empty());
    assert!(record.report_text.contains(&format!("{:.2}", record.final_score)));
}
