//! C Autograder grading pipeline
//!
//! Grades student-submitted C programs: compiles them with strict
//! diagnostics, runs static analysis, executes them against normalized
//! test cases under hard per-test timeouts, samples runtime performance,
//! combines everything into a weighted score, and produces a feedback
//! report (LLM-phrased when a collaborator is configured, deterministic
//! fallback otherwise). Submitted programs run directly on the host; the
//! per-invocation timeout is the only containment.

pub mod analyzer;
pub mod compiler;
pub mod config;
pub mod error;
pub mod executor;
pub mod gemini;
pub mod perf;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod scorer;
pub mod testspec;
pub mod workspace;

pub use config::{GeminiConfig, GraderConfig};
pub use error::GraderError;
pub use gemini::GeminiClient;
pub use pipeline::{run_grader_pipeline, GradeRecord};
pub use report::ReportGenerator;
pub use testspec::{TestCase, TestSpec};
