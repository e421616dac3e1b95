//! Grading pipeline orchestration
//!
//! Wires the stages together in their fixed order: normalize the test
//! specification, create the run's workspace, compile, analyze, execute
//! tests and sample performance (both only when compilation succeeded),
//! score, synthesize the report, reclaim the workspace. Stages communicate
//! only through the accumulating record; nothing is reordered or run
//! concurrently within one grading run.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::analyzer::{analyze_source, StaticReport};
use crate::compiler::{compile_source, CompileResult};
use crate::config::GraderConfig;
use crate::error::GraderError;
use crate::executor::{run_tests, TestReport};
use crate::perf::{sample_performance, PerfReport};
use crate::report::{synthesize_report, ReportGenerator};
use crate::scorer::compute_final_score;
use crate::testspec::TestSpec;
use crate::workspace::Workspace;

/// The complete, immutable result of one grading run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeRecord {
    pub compile: CompileResult,
    pub static_analysis: StaticReport,
    pub tests: TestReport,
    pub perf: PerfReport,
    /// Weighted score in [0, 100]
    pub final_score: f64,
    pub report_text: String,
}

/// Grade one submission end to end.
///
/// Only two failures abort the run (no workspace, unwritable source);
/// every other problem is recorded inside the returned `GradeRecord`. The
/// workspace is reclaimed on every exit path, including early errors.
pub async fn run_grader_pipeline(
    config: &GraderConfig,
    source: &str,
    tests: TestSpec,
    generator: Option<&dyn ReportGenerator>,
) -> Result<GradeRecord, GraderError> {
    let cases = tests.normalize();
    info!("Grading submission with {} test case(s)", cases.len());

    let workspace = Workspace::create()?;

    let compile = compile_source(config, &workspace, source).await?;

    // The source stays readable whether or not it compiled.
    let static_analysis = analyze_source(config, workspace.path(), source).await;

    let (tests, perf) = match &compile.artifact {
        Some(artifact) => {
            let tests = run_tests(config, artifact, workspace.path(), &cases).await;
            let perf = sample_performance(config, artifact, workspace.path()).await;
            (tests, perf)
        }
        None => {
            debug!("Compilation failed; skipping test and performance stages");
            (
                TestReport::empty(),
                PerfReport::unavailable("not measured: the program did not compile"),
            )
        }
    };

    let final_score = compute_final_score(&compile, &static_analysis, &tests, &perf);
    info!(
        "Graded: score={:.2}, compiled={}, tests={}/{}",
        final_score, compile.success, tests.passed, tests.total
    );

    let mut record = GradeRecord {
        compile,
        static_analysis,
        tests,
        perf,
        final_score,
        report_text: String::new(),
    };
    record.report_text = synthesize_report(generator, &record).await;

    workspace.reclaim();
    Ok(record)
}
