use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::ScraperConfig;
use crate::platform::Platform;
use crate::telemetry;
use crate::telemetry::ops::extract::Phase as ExtractPhase;

use super::fastpath::{FastPath, OEmbedFetcher};
use super::render::{BrowserRenderer, ChromiumDriver, Renderer};
use super::{strategy, ExtractError, ExtractionOutcome, ExtractionRequest, RenderedDocument};

/// Runs the extraction cascade: validate, classify, fast path, render, strategy.
///
/// Holds no per-request state; one instance is shared by concurrent requests.
#[derive(Clone)]
pub struct Extractor {
    fast_path: Arc<dyn FastPath>,
    renderer: Arc<dyn Renderer>,
}

impl Extractor {
    pub fn new(fast_path: Arc<dyn FastPath>, renderer: Arc<dyn Renderer>) -> Self {
        Self { fast_path, renderer }
    }

    /// Production wiring: oEmbed fast path plus headless Chromium.
    pub fn from_config(cfg: &ScraperConfig) -> anyhow::Result<Self> {
        let fast_path = OEmbedFetcher::new(&cfg.fast_path, &cfg.user_agent)?;
        let renderer = BrowserRenderer::new(ChromiumDriver::new(cfg.chrome_path.clone()), cfg);
        Ok(Self::new(Arc::new(fast_path), Arc::new(renderer)))
    }

    pub async fn extract(&self, url: &str, cancel: &CancellationToken) -> ExtractionOutcome {
        self.extract_with_hint(url, None, cancel).await
    }

    pub async fn extract_with_hint(&self, url: &str, platform_hint: Option<Platform>, cancel: &CancellationToken) -> ExtractionOutcome {
        let log = telemetry::extract();
        let root = log.root_span_kv([("url", url.to_string())]);

        let req = {
            let _s = root.enter();
            let _c = log.span(&ExtractPhase::Classify).entered();
            match ExtractionRequest::parse(url, platform_hint) {
                Ok(req) => req,
                Err(e) => {
                    log.warn_kv("rejected url", [("reason", e.to_string())]);
                    return ExtractionOutcome::Error(e);
                }
            }
        };
        self.run(req, cancel).instrument(root).await
    }

    /// Cascade for an already validated request.
    pub async fn run(&self, req: ExtractionRequest, cancel: &CancellationToken) -> ExtractionOutcome {
        let log = telemetry::extract();
        let platform = req.platform;

        if platform == Platform::TwitterX {
            let fast = self
                .fast_path
                .try_fast_path(&req.url, cancel)
                .instrument(log.span(&ExtractPhase::FastPath))
                .await;
            match fast {
                Some(text) if !text.trim().is_empty() => {
                    let text = text.trim().to_string();
                    log.outcome(platform.name(), "found", text.chars().count());
                    return ExtractionOutcome::Found(text);
                }
                _ => log.warn_kv("fast path failed, falling back to browser rendering", [("url", req.url.to_string())]),
            }
        }

        let rendered = self
            .renderer
            .render(&req.url, platform, cancel)
            .instrument(log.span_kv(&ExtractPhase::Render, [("platform", platform.name().to_string())]))
            .await;
        let doc = match rendered {
            Ok(doc) => doc,
            Err(e) => {
                log.error_kv("render failed", [("url", req.url.to_string()), ("error", e.to_string())]);
                return ExtractionOutcome::Error(ExtractError::Render(e));
            }
        };

        let outcome = run_strategy(platform, doc).instrument(log.span(&ExtractPhase::Strategy)).await;
        log.outcome(platform.name(), outcome.kind(), outcome.text().map_or(0, |t| t.chars().count()));
        outcome
    }
}

// html parsing is CPU-bound and `scraper::Html` is !Send; a panic in there becomes NotFound
async fn run_strategy(platform: Platform, doc: RenderedDocument) -> ExtractionOutcome {
    match tokio::task::spawn_blocking(move || strategy::extract(platform, &doc)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, platform = platform.name(), "strategy task failed");
            ExtractionOutcome::NotFound
        }
    }
}
