use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::categorize::{Categorizer, HashtagBundle};
use crate::platform::Platform;
use crate::scrape::{ExtractError, ExtractionOutcome, ExtractionRequest, Extractor};
use crate::telemetry;
use crate::telemetry::ops::analyze::Phase;

const LINKEDIN_UNAVAILABLE: &str = "Could not extract text from LinkedIn. LinkedIn may require authentication. Please try with a public post or a different platform.";
const TWITTER_PROFILE: &str = "This appears to be a Twitter profile URL. Please provide a URL to a specific tweet. Click on the tweet and copy that URL instead.";
const TWITTER_UNAVAILABLE: &str = "Could not extract text from this X/Tweet. Please ensure the tweet is public and accessible.";
const GENERIC_UNAVAILABLE: &str = "Could not extract text from the provided URL. Please ensure it's a valid and accessible web page.";
const CANCELLED: &str = "The request was cancelled before it completed.";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalyzeResponse {
    pub original_text: String,
    pub hashtags: HashtagBundle,
}

/// User-facing failure; `detail` is safe to show verbatim.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalyzeFailure {
    pub detail: String,
}

impl std::fmt::Display for AnalyzeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.detail)
    }
}

impl std::error::Error for AnalyzeFailure {}

/// Message shown for an outcome that produced no text, `None` for `Found`.
///
/// `req` is the validated request the outcome came from, absent when the URL
/// was rejected. Render errors read the same as "nothing found" so transient
/// browser faults don't leak internals to the user.
pub fn user_message(req: Option<&ExtractionRequest>, outcome: &ExtractionOutcome) -> Option<String> {
    let platform = req.map_or(Platform::Generic, |r| r.platform);
    let is_status = req.map_or(false, |r| r.url.path().to_ascii_lowercase().contains("/status/"));

    let msg = match outcome {
        ExtractionOutcome::Found(_) => return None,
        ExtractionOutcome::Error(ExtractError::InvalidUrl(reason)) => format!("Invalid URL format: {reason}"),
        ExtractionOutcome::Error(ExtractError::Render(crate::scrape::RenderError::Cancelled)) => CANCELLED.to_string(),
        ExtractionOutcome::AmbiguousProfilePage => TWITTER_PROFILE.to_string(),
        ExtractionOutcome::NotFound | ExtractionOutcome::Error(ExtractError::Render(_)) => match platform {
            Platform::LinkedIn => LINKEDIN_UNAVAILABLE.to_string(),
            Platform::TwitterX if !is_status => TWITTER_PROFILE.to_string(),
            Platform::TwitterX => TWITTER_UNAVAILABLE.to_string(),
            Platform::Generic => GENERIC_UNAVAILABLE.to_string(),
        },
    };
    Some(msg)
}

/// Extraction followed by hashtag categorization.
#[derive(Clone)]
pub struct Analyzer {
    extractor: Extractor,
    categorizer: Arc<dyn Categorizer>,
}

impl Analyzer {
    pub fn new(extractor: Extractor, categorizer: Arc<dyn Categorizer>) -> Self {
        Self { extractor, categorizer }
    }

    pub async fn analyze(&self, url: &str, cancel: &CancellationToken) -> Result<AnalyzeResponse, AnalyzeFailure> {
        self.analyze_with_hint(url, None, cancel).await
    }

    pub async fn analyze_with_hint(
        &self,
        url: &str,
        platform_hint: Option<Platform>,
        cancel: &CancellationToken,
    ) -> Result<AnalyzeResponse, AnalyzeFailure> {
        let log = telemetry::analyze();
        let root = log.root_span_kv([("url", url.to_string())]);

        async {
            let req = match ExtractionRequest::parse(url, platform_hint) {
                Ok(req) => req,
                Err(e) => {
                    log.warn_kv("rejected url", [("reason", e.to_string())]);
                    let detail = user_message(None, &ExtractionOutcome::Error(e)).unwrap_or_default();
                    return Err(AnalyzeFailure { detail });
                }
            };
            let outcome = self
                .extractor
                .run(req.clone(), cancel)
                .instrument(log.span(&Phase::Extract))
                .await;
            let text = match outcome {
                ExtractionOutcome::Found(text) => text,
                other => {
                    let detail = user_message(Some(&req), &other).unwrap_or_else(|| GENERIC_UNAVAILABLE.to_string());
                    log.warn_kv("extraction produced no text", [("outcome", other.kind().to_string())]);
                    return Err(AnalyzeFailure { detail });
                }
            };

            let hashtags = tokio::select! {
                _ = cancel.cancelled() => {
                    log.warn("cancelled during categorization");
                    return Err(AnalyzeFailure { detail: CANCELLED.to_string() });
                }
                bundle = self.categorizer.categorize(&text).instrument(log.span(&Phase::Categorize)) => bundle,
            };
            log.hashtags(hashtags.safe.len(), hashtags.rising.len(), hashtags.niche.len(), hashtags.is_fallback());

            Ok(AnalyzeResponse { original_text: text, hashtags })
        }
        .instrument(root)
        .await
    }
}
