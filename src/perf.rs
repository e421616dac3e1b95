//! Performance sampler
//!
//! Estimates the artifact's typical latency by timing a small fixed number
//! of runs with a neutral input. The estimate is all-or-nothing: if any
//! sample times out or fails to launch, the whole measurement is reported
//! as unavailable rather than averaging over a partial set.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GraderConfig;
use crate::runner::{run_with_timeout, RunStatus};

/// Crude latency estimate plus a qualitative reading of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerfReport {
    /// Mean wall-clock seconds over all samples; `None` when unmeasurable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_secs: Option<f64>,
    pub comment: String,
}

impl PerfReport {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            average_secs: None,
            comment: reason.into(),
        }
    }
}

/// Time `perf_samples` runs of the artifact with the configured neutral
/// input, each bounded by the per-test timeout.
pub async fn sample_performance(
    config: &GraderConfig,
    artifact: &Path,
    work_dir: &Path,
) -> PerfReport {
    if config.perf_samples == 0 {
        return PerfReport::unavailable("performance sampling disabled");
    }

    let mut elapsed = Vec::with_capacity(config.perf_samples as usize);

    for sample in 0..config.perf_samples {
        let outcome = run_with_timeout(
            artifact,
            &[],
            work_dir,
            Some(&config.perf_sample_input),
            config.per_test_timeout_ms,
        )
        .await;

        match outcome.status {
            RunStatus::Exited(_) => {
                debug!("Perf sample {} took {:.4}s", sample + 1, outcome.elapsed_secs());
                elapsed.push(outcome.elapsed_secs());
            }
            RunStatus::TimedOut => {
                info!("Perf sample {} timed out; measurement unavailable", sample + 1);
                return PerfReport::unavailable(format!(
                    "a performance sample exceeded the {}ms bound; runtime could not be measured",
                    config.per_test_timeout_ms
                ));
            }
            RunStatus::SpawnError => {
                return PerfReport::unavailable(
                    "the program could not be launched for performance sampling",
                );
            }
        }
    }

    let average = elapsed.iter().sum::<f64>() / elapsed.len() as f64;
    PerfReport {
        average_secs: Some(average),
        comment: qualify(average),
    }
}

fn qualify(average_secs: f64) -> String {
    let qualifier = if average_secs < 0.1 {
        "comfortably fast for this kind of program"
    } else if average_secs < 1.0 {
        "acceptable"
    } else {
        "noticeably slow; look for wasted work in the hot path"
    };
    format!("Avg runtime {:.4}s ({})", average_secs, qualifier)
}
