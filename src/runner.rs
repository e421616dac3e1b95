//! Host process runner
//!
//! Bounded execution of a single host process with piped stdio. This is the
//! only place the crate spawns processes; every invocation (compiler,
//! analyzer, test run, performance sample) goes through it and carries its
//! own independent wall-clock bound.
//!
//! The runner does NOT:
//! - Compare outputs or judge pass/fail
//! - Know which pipeline stage it is serving
//!
//! Submitted programs run directly on the host without a sandbox; the only
//! containment is the timeout and the process being killed when its future
//! is dropped.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// How a bounded process run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// Process exited on its own with the given code (-1 when killed by a
    /// signal and no code is available)
    Exited(i32),
    /// Wall-clock bound elapsed; the process was killed
    TimedOut,
    /// The process could not be spawned or awaited
    SpawnError,
}

/// Outcome of one bounded process run.
#[derive(Debug)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Captured stdout; empty on timeout or spawn failure
    pub stdout: String,
    /// Captured stderr; holds the OS error text on spawn failure
    pub stderr: String,
    /// Wall-clock time from spawn to exit (or to the bound, on timeout)
    pub elapsed: Duration,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Exited(0))
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    fn spawn_error(message: String, elapsed: Duration) -> Self {
        Self {
            status: RunStatus::SpawnError,
            stdout: String::new(),
            stderr: message,
            elapsed,
        }
    }
}

/// Run a program with the given arguments, bounded by `timeout_ms`.
///
/// `stdin_content` is written to the child's stdin and the handle is closed
/// afterwards, so programs that read until EOF terminate instead of
/// blocking. A child still running when the bound elapses is killed.
///
/// All failure modes are folded into the returned `RunOutcome`; this
/// function never errors.
pub async fn run_with_timeout(
    program: impl AsRef<OsStr>,
    args: &[String],
    work_dir: &Path,
    stdin_content: Option<&str>,
    timeout_ms: u64,
) -> RunOutcome {
    let program = program.as_ref();
    debug!("Running {:?} with args {:?} (bound {}ms)", program, args, timeout_ms);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(work_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!("Failed to spawn {:?}: {}", program, e);
            return RunOutcome::spawn_error(
                format!("failed to launch {}: {}", program.to_string_lossy(), e),
                start.elapsed(),
            );
        }
    };

    if let Some(input) = stdin_content {
        if let Some(mut stdin) = child.stdin.take() {
            // A child may exit without reading its input; the resulting
            // broken pipe is not an error worth surfacing.
            let _ = stdin.write_all(input.as_bytes()).await;
        }
    }

    match tokio::time::timeout(Duration::from_millis(timeout_ms), child.wait_with_output()).await {
        Ok(Ok(output)) => {
            let exit_code = output.status.code().unwrap_or(-1);
            RunOutcome {
                status: RunStatus::Exited(exit_code),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                elapsed: start.elapsed(),
            }
        }
        Ok(Err(e)) => {
            warn!("Failed to wait for {:?}: {}", program, e);
            RunOutcome::spawn_error(format!("failed to run to completion: {}", e), start.elapsed())
        }
        Err(_) => {
            // Dropping the wait future kills the child (kill_on_drop).
            debug!("{:?} exceeded {}ms bound, killed", program, timeout_ms);
            RunOutcome {
                status: RunStatus::TimedOut,
                stdout: String::new(),
                stderr: String::new(),
                elapsed: start.elapsed(),
            }
        }
    }
}

/// Run a full command line (program plus arguments) as one bounded process.
pub async fn run_command_line(
    command: &[String],
    work_dir: &Path,
    stdin_content: Option<&str>,
    timeout_ms: u64,
) -> RunOutcome {
    match command.split_first() {
        Some((program, args)) => {
            run_with_timeout(program, args, work_dir, stdin_content, timeout_ms).await
        }
        None => RunOutcome::spawn_error("empty command line".into(), Duration::ZERO),
    }
}
