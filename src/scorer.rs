//! Scorer
//!
//! Deterministic weighted combination of the four stage outcomes into one
//! final score in [0, 100]. Pure function: no I/O, no external calls, no
//! randomness. The weights are fixed policy; compilation gates everything
//! and functional correctness dominates.

use crate::analyzer::StaticReport;
use crate::compiler::CompileResult;
use crate::executor::TestReport;
use crate::perf::PerfReport;

pub const WEIGHT_COMPILE: f64 = 0.25;
pub const WEIGHT_TESTS: f64 = 0.45;
pub const WEIGHT_STATIC: f64 = 0.15;
pub const WEIGHT_PERF: f64 = 0.15;

/// Penalty per static-analysis issue; the term floors at zero.
const STATIC_ISSUE_PENALTY: f64 = 0.05;

/// Mean runtime under this many seconds earns full performance credit.
const PERF_FAST_SECS: f64 = 0.5;
/// Performance credit for slow or unmeasurable programs.
const PERF_SLOW_CREDIT: f64 = 0.6;

/// Combine the stage outcomes into the final score, rounded to two
/// decimals.
///
/// A failed compile zeroes the test and performance terms outright; those
/// stages were skipped, and an unmeasured program earns no performance
/// credit through the fallback branch of the perf term.
pub fn compute_final_score(
    compile: &CompileResult,
    static_report: &StaticReport,
    tests: &TestReport,
    perf: &PerfReport,
) -> f64 {
    let compile_term = if compile.success { 1.0 } else { 0.0 };

    let (test_term, perf_term) = if compile.success {
        let test_term = tests.score_percent / 100.0;
        let perf_term = match perf.average_secs {
            Some(avg) if avg < PERF_FAST_SECS => 1.0,
            _ => PERF_SLOW_CREDIT,
        };
        (test_term, perf_term)
    } else {
        (0.0, 0.0)
    };

    let static_term = (1.0 - STATIC_ISSUE_PENALTY * static_report.issue_count() as f64).max(0.0);

    let weighted = WEIGHT_COMPILE * compile_term
        + WEIGHT_TESTS * test_term
        + WEIGHT_STATIC * static_term
        + WEIGHT_PERF * perf_term;

    round2(100.0 * weighted)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
