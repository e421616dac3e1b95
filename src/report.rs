//! Report synthesis
//!
//! The prose report shown to the student. An optional external generator
//! (an LLM collaborator) may phrase it; the generator sees the finished
//! grade record read-only and its only output is text. Whenever it errors,
//! stalls, or returns something unusably short, a deterministic fallback
//! assembled straight from the record is used instead, so every grading
//! run ends with a report.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::pipeline::GradeRecord;

/// Generator output shorter than this (after trimming) is discarded in
/// favor of the fallback.
pub const MIN_REPORT_CHARS: usize = 20;

/// External collaborator that turns a grade record into prose.
///
/// Implementations may fail or return empty text; callers must treat the
/// record as read-only and never let the collaborator influence scores.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate_report(&self, record: &GradeRecord) -> anyhow::Result<String>;
}

/// Produce the final report text: collaborator first, fallback otherwise.
pub async fn synthesize_report(
    generator: Option<&dyn ReportGenerator>,
    record: &GradeRecord,
) -> String {
    if let Some(generator) = generator {
        match generator.generate_report(record).await {
            Ok(text) if text.trim().len() >= MIN_REPORT_CHARS => {
                info!("Using generated report ({} chars)", text.trim().len());
                return text.trim().to_string();
            }
            Ok(_) => warn!("Report generator returned unusably short text; using fallback"),
            Err(e) => warn!("Report generator failed: {:#}; using fallback", e),
        }
    }
    fallback_report(record)
}

/// Deterministic report assembled from the record fields alone.
pub fn fallback_report(record: &GradeRecord) -> String {
    let mut sections = Vec::new();

    sections.push(format!(
        "C PROGRAMMING EVALUATION REPORT\n\nFINAL SCORE: {:.2}/100",
        record.final_score
    ));

    if record.compile.success {
        sections.push("COMPILATION:\nThe program compiled successfully.".to_string());
    } else {
        sections.push(format!(
            "COMPILATION:\nCompilation failed:\n{}",
            record.compile.stderr.trim()
        ));
    }

    if record.static_analysis.issues.is_empty() {
        sections.push(
            "STATIC ANALYSIS:\nNo issues detected. The code follows good practices.".to_string(),
        );
    } else {
        let listed = record
            .static_analysis
            .issues
            .iter()
            .map(|issue| format!("- {}", issue))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!(
            "STATIC ANALYSIS:\n{} potential issue(s):\n{}",
            record.static_analysis.issues.len(),
            listed
        ));
    }

    if record.tests.total == 0 {
        let reason = if record.compile.success {
            "No test cases were supplied, so functional correctness was not judged."
        } else {
            "No tests were executed because the program did not compile."
        };
        sections.push(format!("FUNCTIONAL TESTING:\n{}", reason));
    } else {
        let mut lines = vec![format!(
            "Passed {} of {} test case(s).",
            record.tests.passed, record.tests.total
        )];
        for outcome in record.tests.outcomes.iter().filter(|o| !o.passed) {
            lines.push(format!("- input {:?}: {}", outcome.input, outcome.note));
        }
        sections.push(format!("FUNCTIONAL TESTING:\n{}", lines.join("\n")));
    }

    sections.push(format!("PERFORMANCE:\n{}", record.perf.comment));

    let conclusion = if record.final_score > 80.0 {
        "Excellent work! All checks passed with a strong overall result."
    } else if record.compile.success {
        "Some improvements needed. Review the warnings above and the failed tests."
    } else {
        "Compilation failed. Fix the reported errors and resubmit."
    };
    sections.push(format!("CONCLUSION:\n{}", conclusion));

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::StaticReport;
    use crate::compiler::CompileResult;
    use crate::executor::TestReport;
    use crate::perf::PerfReport;
    use std::path::PathBuf;

    fn record(compile_success: bool, final_score: f64) -> GradeRecord {
        GradeRecord {
            compile: CompileResult {
                success: compile_success,
                stdout: String::new(),
                stderr: "main.c:1: error: expected ';'".into(),
                artifact: None,
                workspace: PathBuf::from("/tmp/ws"),
            },
            static_analysis: StaticReport::default(),
            tests: TestReport::empty(),
            perf: PerfReport::unavailable("not measured"),
            final_score,
            report_text: String::new(),
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl ReportGenerator for FailingGenerator {
        async fn generate_report(&self, _record: &GradeRecord) -> anyhow::Result<String> {
            anyhow::bail!("quota exhausted")
        }
    }

    struct EmptyGenerator;

    #[async_trait]
    impl ReportGenerator for EmptyGenerator {
        async fn generate_report(&self, _record: &GradeRecord) -> anyhow::Result<String> {
            Ok(String::new())
        }
    }

    struct VerboseGenerator;

    #[async_trait]
    impl ReportGenerator for VerboseGenerator {
        async fn generate_report(&self, _record: &GradeRecord) -> anyhow::Result<String> {
            Ok("A carefully phrased assessment of the submission, long enough to keep.".into())
        }
    }

    #[test]
    fn test_fallback_contains_score_and_compile_error() {
        let report = fallback_report(&record(false, 12.5));
        assert!(report.contains("12.50"));
        assert!(report.contains("expected ';'"));
        assert!(report.contains("did not compile"));
    }

    #[test]
    fn test_failing_generator_degrades_to_fallback() {
        let rec = record(true, 55.0);
        let report = tokio_test::block_on(synthesize_report(Some(&FailingGenerator), &rec));
        assert!(report.contains("55.00"));
        assert!(report.contains("C PROGRAMMING EVALUATION REPORT"));
    }

    #[test]
    fn test_empty_generator_degrades_to_fallback() {
        let rec = record(true, 55.0);
        let report = tokio_test::block_on(synthesize_report(Some(&EmptyGenerator), &rec));
        assert!(!report.trim().is_empty());
        assert!(report.contains("55.00"));
    }

    #[test]
    fn test_usable_generator_output_is_kept() {
        let rec = record(true, 90.0);
        let report = tokio_test::block_on(synthesize_report(Some(&VerboseGenerator), &rec));
        assert!(report.contains("carefully phrased"));
        assert!(!report.contains("EVALUATION REPORT"));
    }

    #[test]
    fn test_no_generator_means_fallback() {
        let rec = record(true, 42.0);
        let report = tokio_test::block_on(synthesize_report(None, &rec));
        assert!(report.contains("42.00"));
    }

    #[test]
    fn test_failed_outcomes_are_listed() {
        let mut rec = record(true, 60.0);
        rec.tests = TestReport {
            outcomes: vec![crate::executor::TestOutcome {
                input: "2 3".into(),
                expected: Some("5".into()),
                actual: "6".into(),
                stderr: String::new(),
                elapsed_secs: Some(0.01),
                passed: false,
                note: "output did not match the expected output".into(),
            }],
            passed: 0,
            total: 1,
            score_percent: 0.0,
        };
        let report = fallback_report(&rec);
        assert!(report.contains("Passed 0 of 1"));
        assert!(report.contains("did not match"));
    }
}
