//! Grader configuration
//!
//! Toolchain commands and stage timeouts, loaded from an embedded TOML file
//! with environment overrides. The configuration (including the optional
//! Gemini client settings) is built once at startup and passed down the
//! pipeline explicitly; nothing here is global state.

use std::collections::HashMap;

use anyhow::Context;
use serde::Deserialize;

/// Name of the source file written into each workspace.
pub const SOURCE_FILE: &str = "main.c";
/// Name of the compiled artifact the compiler command must produce.
pub const ARTIFACT_FILE: &str = "a.out";

/// Configuration for one grading run.
#[derive(Debug, Clone)]
pub struct GraderConfig {
    /// Compiler invocation (program + args), run inside the workspace
    pub compile_command: Vec<String>,
    /// Compile time limit in milliseconds
    pub compile_timeout_ms: u64,
    /// Static analyzer invocation (program + args), run inside the workspace
    pub analyze_command: Vec<String>,
    /// Analyzer time limit in milliseconds
    pub analyze_timeout_ms: u64,
    /// Wall-clock bound for each test execution in milliseconds
    pub per_test_timeout_ms: u64,
    /// Number of timed runs used to estimate typical latency
    pub perf_samples: u32,
    /// Neutral stdin fed to each performance sample
    pub perf_sample_input: String,
    /// Gemini collaborator settings; `None` means fallback reports only
    pub gemini: Option<GeminiConfig>,
}

/// Settings for the Gemini report/test-proposal collaborator.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Raw TOML shape of the embedded toolchain file
#[derive(Debug, Deserialize)]
struct RawToolchain {
    compiler: RawTool,
    analyzer: RawTool,
    execution: RawExecution,
}

#[derive(Debug, Deserialize)]
struct RawTool {
    command: String,
    timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
struct RawExecution {
    per_test_timeout_ms: u64,
    perf_samples: u32,
    perf_sample_input: String,
}

impl GraderConfig {
    /// Load the embedded toolchain defaults without consulting the
    /// environment. Useful for tests and embedding callers.
    pub fn load_defaults() -> anyhow::Result<Self> {
        let content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/toolchain.toml"));
        let raw: RawToolchain =
            toml::from_str(content).context("Invalid embedded toolchain.toml")?;

        Ok(Self {
            compile_command: into_command(&raw.compiler.command),
            compile_timeout_ms: raw.compiler.timeout_ms,
            analyze_command: into_command(&raw.analyzer.command),
            analyze_timeout_ms: raw.analyzer.timeout_ms,
            per_test_timeout_ms: raw.execution.per_test_timeout_ms,
            perf_samples: raw.execution.perf_samples,
            perf_sample_input: raw.execution.perf_sample_input,
            gemini: None,
        })
    }

    /// Load the toolchain defaults and apply environment overrides.
    ///
    /// Recognized variables: `GRADER_COMPILE_COMMAND`,
    /// `GRADER_ANALYZE_COMMAND`, `GRADER_TEST_TIMEOUT_MS`,
    /// `GEMINI_API_KEY`, `GEMINI_MODEL`, `GEMINI_TIMEOUT_SECS`.
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::load_defaults()?;
        config.apply_env(&env_snapshot());
        Ok(config)
    }

    fn apply_env(&mut self, env: &HashMap<String, String>) {
        if let Some(cmd) = env.get("GRADER_COMPILE_COMMAND") {
            self.compile_command = into_command(cmd);
        }
        if let Some(cmd) = env.get("GRADER_ANALYZE_COMMAND") {
            self.analyze_command = into_command(cmd);
        }
        if let Some(ms) = env.get("GRADER_TEST_TIMEOUT_MS") {
            match ms.parse::<u64>() {
                Ok(parsed) if parsed > 0 => self.per_test_timeout_ms = parsed,
                _ => tracing::warn!("Ignoring invalid GRADER_TEST_TIMEOUT_MS: {}", ms),
            }
        }
        if let Some(api_key) = env.get("GEMINI_API_KEY") {
            if !api_key.trim().is_empty() {
                let model = env
                    .get("GEMINI_MODEL")
                    .cloned()
                    .unwrap_or_else(|| "gemini-2.5-flash".into());
                let timeout_secs = env
                    .get("GEMINI_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(45);
                self.gemini = Some(GeminiConfig {
                    api_key: api_key.clone(),
                    model,
                    timeout_secs,
                });
            }
        }
    }
}

fn env_snapshot() -> HashMap<String, String> {
    std::env::vars().collect()
}

fn into_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(|s| s.to_string()).collect()
}
