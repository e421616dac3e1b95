//! Gemini collaborator client
//!
//! HTTP client for the Gemini `generateContent` API, used for two
//! collaborator roles: phrasing the grading report, and proposing candidate
//! test cases for a program. Neither role ever decides pass/fail or touches
//! a score. Every failure mode degrades: the report path falls back to the
//! deterministic template, the proposal path returns an empty list.

use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GeminiConfig;
use crate::pipeline::GradeRecord;
use crate::report::ReportGenerator;
use crate::testspec::{self, TestCase};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Upper bound on test cases accepted from one proposal call.
const MAX_PROPOSED_CASES: usize = 8;

/// Request body for the Gemini API.
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

/// Response from the Gemini API.
#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ContentResponse,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: String,
}

/// Client for the Gemini collaborator. Construction is cheap; settings
/// come from the explicit config object, never from ambient state.
pub struct GeminiClient {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn generate_content(&self, prompt: String) -> anyhow::Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_ENDPOINT, self.config.model, self.config.api_key
        );
        let request_body = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&request_body)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read Gemini response body")?;

        if !status.is_success() {
            bail!("Gemini API error {}: {}", status, response_text);
        }

        let parsed: GeminiResponse = serde_json::from_str(&response_text)
            .with_context(|| format!("error decoding response body: {}", response_text))?;

        match first_candidate_text(&parsed) {
            Some(text) => Ok(text),
            None => bail!("Gemini returned no usable text"),
        }
    }

    /// Ask the model to propose test cases for a C program.
    ///
    /// The grading pipeline never calls this; it exists for the front-end
    /// collaborator. An unavailable or unhelpful model yields an empty
    /// list.
    pub async fn propose_test_cases(&self, source: &str) -> Vec<TestCase> {
        if source.trim().is_empty() {
            return Vec::new();
        }

        match self.generate_content(proposal_prompt(source)).await {
            Ok(text) => {
                let mut cases = testspec::parse_proposed_lines(&text);
                cases.truncate(MAX_PROPOSED_CASES);
                debug!("Model proposed {} test case(s)", cases.len());
                cases
            }
            Err(e) => {
                warn!("Test case proposal failed: {:#}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl ReportGenerator for GeminiClient {
    async fn generate_report(&self, record: &GradeRecord) -> anyhow::Result<String> {
        self.generate_content(report_prompt(record)).await
    }
}

/// Join the text parts of the first candidate, if any.
fn first_candidate_text(response: &GeminiResponse) -> Option<String> {
    let candidate = response.candidates.first()?;
    let combined = candidate
        .content
        .parts
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let trimmed = combined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn report_prompt(record: &GradeRecord) -> String {
    let context = serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".into());
    format!(
        "You are an experienced C programming evaluator. \
         Provide a detailed, human-readable assessment of the student's code. \
         The report should include:\n\
         1. Compilation result\n\
         2. Static code quality and safety issues\n\
         3. Functional correctness (based on test results)\n\
         4. Performance analysis\n\
         5. Final score justification\n\
         Use paragraphs, not bullet points. Write in a professional, \
         encouraging tone. Report the final score exactly as given; never \
         change or re-derive it.\n\n\
         GRADING CONTEXT (read-only):\n{}",
        context
    )
}

fn proposal_prompt(source: &str) -> String {
    format!(
        "You are a precise C test case generator.\n\n\
         Analyze the following C program and produce up to {} test cases \
         to verify its correctness.\n\n\
         Each test case must be one line:\n\
         <input_values>::<expected_output>\n\n\
         Use realistic numeric examples. \
         Do NOT include explanations, comments, or markdown formatting.\n\n\
         C program:\n{}",
        MAX_PROPOSED_CASES, source
    )
}
