//! Compiler stage
//!
//! Writes the submitted source into the run's workspace and invokes the
//! external compiler there under a timeout. Diagnostics are preserved
//! verbatim for the report. A failed compile is a recorded outcome, not an
//! error; it gates the test and performance stages downstream.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GraderConfig;
use crate::error::GraderError;
use crate::runner::{run_command_line, RunStatus};
use crate::workspace::Workspace;

/// Result of one compilation attempt. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileResult {
    pub success: bool,
    /// Compiler stdout, verbatim
    pub stdout: String,
    /// Compiler stderr (or a synthesized explanation for timeouts and
    /// missing toolchains), verbatim
    pub stderr: String,
    /// Present iff `success`
    pub artifact: Option<PathBuf>,
    /// The workspace the source and artifact live in; destroyed at
    /// pipeline end
    pub workspace: PathBuf,
}

/// Compile the submitted source inside the workspace.
///
/// Only a failure to write the source file propagates; every compiler
/// problem (diagnostics, timeout, missing binary) lands in the result.
pub async fn compile_source(
    config: &GraderConfig,
    workspace: &Workspace,
    source: &str,
) -> Result<CompileResult, GraderError> {
    workspace.write_source(source)?;
    debug!("Compiling with {:?}", config.compile_command);

    let outcome = run_command_line(
        &config.compile_command,
        workspace.path(),
        None,
        config.compile_timeout_ms,
    )
    .await;

    let artifact_path = workspace.artifact_path();

    let (success, stderr) = match outcome.status {
        RunStatus::Exited(0) => {
            if artifact_path.exists() {
                (true, outcome.stderr)
            } else {
                // Toolchain quirk: clean exit without the expected output.
                (
                    false,
                    format!(
                        "{}\ncompiler exited successfully but produced no {}",
                        outcome.stderr,
                        artifact_path.display()
                    ),
                )
            }
        }
        RunStatus::Exited(code) => {
            info!("Compilation failed with exit code {}", code);
            (false, outcome.stderr)
        }
        RunStatus::TimedOut => (
            false,
            format!(
                "compilation timed out after {}ms",
                config.compile_timeout_ms
            ),
        ),
        RunStatus::SpawnError => (false, format!("compiler unavailable: {}", outcome.stderr)),
    };

    Ok(CompileResult {
        success,
        stdout: outcome.stdout,
        stderr,
        artifact: success.then_some(artifact_path),
        workspace: workspace.path().to_path_buf(),
    })
}
