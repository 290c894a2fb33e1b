use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;

use pulsetag::analyze::{user_message, Analyzer};
use pulsetag::llm::{OpenAiClient, OpenAiClientConfig};
use pulsetag::scrape::{ExtractionOutcome, ExtractionRequest, OutcomeSummary};
use pulsetag::{telemetry, Extractor, LlmCategorizer, ScraperConfig};

#[derive(Args, Debug)]
pub struct ExtractCmd {
    /// Absolute http(s) URL of the post
    url: String,
}

#[derive(Args, Debug)]
pub struct AnalyzeCmd {
    /// Absolute http(s) URL of the post
    url: String,
    /// Override OPENROUTER_MODEL for this run
    #[arg(long)]
    model: Option<String>,
}

/// Returns whether text was extracted.
pub async fn extract(cfg: &ScraperConfig, args: ExtractCmd, cancel: &CancellationToken) -> Result<bool> {
    let started = Instant::now();
    let extractor = Extractor::from_config(cfg).context("build extractor")?;
    let (req, outcome) = match ExtractionRequest::parse(&args.url, None) {
        Ok(req) => {
            let outcome = extractor.run(req.clone(), cancel).await;
            (Some(req), outcome)
        }
        Err(e) => (None, ExtractionOutcome::Error(e)),
    };

    let summary = OutcomeSummary {
        url: &args.url,
        platform: req.as_ref().map(|r| r.platform),
        outcome: outcome.kind(),
        text: outcome.text(),
        error: user_message(req.as_ref(), &outcome),
    };
    telemetry::extract().result_timed(&summary, started)?;
    Ok(outcome.text().is_some())
}

/// Returns whether the post was analyzed.
pub async fn analyze(cfg: &ScraperConfig, args: AnalyzeCmd, cancel: &CancellationToken) -> Result<bool> {
    let started = Instant::now();
    let mut llm_cfg = OpenAiClientConfig::from_env();
    if llm_cfg.api_key.is_none() {
        bail!("OPENROUTER_API_KEY is not set; it is required for `analyze`");
    }
    if let Some(model) = args.model {
        llm_cfg.default_model = model;
    }
    let client = OpenAiClient::new(llm_cfg).context("build provider client")?;
    let categorizer = LlmCategorizer::new(Arc::new(client)).context("build categorizer")?;
    let extractor = Extractor::from_config(cfg).context("build extractor")?;
    let analyzer = Analyzer::new(extractor, Arc::new(categorizer));

    let log = telemetry::analyze();
    match analyzer.analyze(&args.url, cancel).await {
        Ok(resp) => {
            log.result_timed(&resp, started)?;
            Ok(true)
        }
        Err(failure) => {
            log.result_timed(&failure, started)?;
            Ok(false)
        }
    }
}
