use serde::Serialize;
use url::Url;

use crate::platform::Platform;

pub mod fastpath;
pub mod orchestrator;
pub mod render;
pub mod rules;
pub mod strategy;

pub use fastpath::{FastPath, OEmbedFetcher};
pub use orchestrator::Extractor;
pub use render::{BrowserRenderer, RenderError, Renderer};

/// One inbound extraction call. Built per request and dropped afterwards.
#[derive(Clone, Debug)]
pub struct ExtractionRequest {
    pub url: Url,
    pub platform: Platform,
}

impl ExtractionRequest {
    /// Validate an absolute http(s) URL and classify it, unless a hint is given.
    pub fn parse(raw: &str, platform_hint: Option<Platform>) -> Result<Self, ExtractError> {
        let url = Url::parse(raw.trim()).map_err(|e| ExtractError::InvalidUrl(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ExtractError::InvalidUrl(format!("unsupported scheme `{other}`, only http and https are allowed"))),
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(ExtractError::InvalidUrl("missing host".to_string()));
        }
        let platform = platform_hint.unwrap_or_else(|| Platform::classify(&url));
        Ok(Self { url, platform })
    }
}

/// Serialized DOM snapshot owned by the strategy that consumes it.
#[derive(Clone, Debug)]
pub struct RenderedDocument {
    html: String,
}

impl RenderedDocument {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

#[derive(Debug)]
pub enum ExtractError {
    InvalidUrl(String),
    Render(RenderError),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::InvalidUrl(reason) => write!(f, "invalid url: {reason}"),
            ExtractError::Render(err) => write!(f, "render failed: {err}"),
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::Render(err) => Some(err),
            ExtractError::InvalidUrl(_) => None,
        }
    }
}

impl From<RenderError> for ExtractError {
    fn from(err: RenderError) -> Self {
        ExtractError::Render(err)
    }
}

/// Result of one extraction. `Found` text is trimmed, non-empty and has passed
/// its rule's length threshold.
#[derive(Debug)]
pub enum ExtractionOutcome {
    Found(String),
    NotFound,
    AmbiguousProfilePage,
    Error(ExtractError),
}

impl ExtractionOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionOutcome::Found(_) => "found",
            ExtractionOutcome::NotFound => "not_found",
            ExtractionOutcome::AmbiguousProfilePage => "ambiguous_profile_page",
            ExtractionOutcome::Error(ExtractError::InvalidUrl(_)) => "invalid_url",
            ExtractionOutcome::Error(ExtractError::Render(_)) => "render_error",
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            ExtractionOutcome::Found(t) => Some(t),
            _ => None,
        }
    }
}

/// Serializable view of an outcome for the CLI envelope.
#[derive(Serialize)]
pub struct OutcomeSummary<'a> {
    pub url: &'a str,
    pub platform: Option<Platform>,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
