use anyhow::{Context, Result};
use tracing::{info, warn};

use cgrader::{run_grader_pipeline, GeminiClient, GraderConfig, ReportGenerator, TestSpec};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cgrader=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let source_path = args
        .next()
        .context("Usage: cgrader <source.c> [tests.txt]")?;
    let tests_path = args.next();

    let source = std::fs::read_to_string(&source_path)
        .with_context(|| format!("Failed to read source file {}", source_path))?;

    let tests = match &tests_path {
        Some(path) => TestSpec::Text(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read test file {}", path))?,
        ),
        None => TestSpec::Cases(Vec::new()),
    };

    let config = GraderConfig::from_env()?;

    let gemini = config.gemini.clone().map(GeminiClient::new);
    if gemini.is_none() {
        info!("No GEMINI_API_KEY configured; reports use the built-in template");
    }
    let generator = gemini.as_ref().map(|g| g as &dyn ReportGenerator);

    let record = run_grader_pipeline(&config, &source, tests, generator).await?;

    println!("{}", record.report_text);
    println!();
    println!("Final score: {:.2}/100", record.final_score);

    // Full structured result, for callers that want more than prose.
    if let Ok(json_path) = std::env::var("GRADER_FEEDBACK_JSON") {
        match serde_json::to_string_pretty(&record) {
            Ok(json) => {
                std::fs::write(&json_path, json)
                    .with_context(|| format!("Failed to write feedback JSON to {}", json_path))?;
                info!("Wrote feedback JSON to {}", json_path);
            }
            Err(e) => warn!("Could not serialize feedback JSON: {}", e),
        }
    }

    Ok(())
}
