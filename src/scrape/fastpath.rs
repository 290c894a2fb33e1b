use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::FastPathConfig;

/// Lightweight retrieval that skips the browser when it works.
///
/// Implementations absorb every failure and return `None`; callers treat
/// `None` as "take the heavier path".
#[async_trait]
pub trait FastPath: Send + Sync {
    async fn try_fast_path(&self, url: &Url, cancel: &CancellationToken) -> Option<String>;
}

/// Twitter/X public oEmbed endpoint.
#[derive(Clone)]
pub struct OEmbedFetcher {
    http: Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    #[serde(default)]
    html: Option<String>,
}

impl OEmbedFetcher {
    pub fn new(cfg: &FastPathConfig, user_agent: &str) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(cfg.timeout)
            .build()?;
        Ok(Self { http, endpoint: cfg.oembed_endpoint.clone() })
    }

    async fn fetch(&self, url: &Url) -> Result<Option<String>, reqwest::Error> {
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[("url", url.as_str()), ("omit_script", "true")])
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            warn!(%status, "oembed endpoint returned non-success status");
            return Ok(None);
        }
        let body = resp.text().await?;
        Ok(parse_oembed(&body))
    }
}

#[async_trait]
impl FastPath for OEmbedFetcher {
    async fn try_fast_path(&self, url: &Url, cancel: &CancellationToken) -> Option<String> {
        debug!(endpoint = %self.endpoint, url = %url, "fetching tweet via oembed");
        let res = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("oembed fetch cancelled");
                return None;
            }
            res = self.fetch(url) => res,
        };
        match res {
            Ok(Some(text)) => {
                info!(len = text.chars().count(), "extracted tweet text via oembed");
                Some(text)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "oembed request failed");
                None
            }
        }
    }
}

/// Pull the tweet text out of an oEmbed JSON payload (`blockquote > p`).
pub fn parse_oembed(body: &str) -> Option<String> {
    let payload: OEmbedResponse = match serde_json::from_str(body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "malformed oembed payload");
            return None;
        }
    };
    let fragment = payload.html.filter(|h| !h.trim().is_empty())?;
    let doc = Html::parse_fragment(&fragment);
    let sel = Selector::parse("blockquote p").ok()?;
    let node = doc.select(&sel).next()?;
    let text = node.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() { None } else { Some(text.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_blockquote_paragraph() {
        let body = r#"{"url":"https://x.com/user/status/123","html":"<blockquote class=\"twitter-tweet\"><p lang=\"en\" dir=\"ltr\">Hello <a href=\"https://twitter.com/hashtag/world\">#world</a></p>&mdash; User (@user) <a href=\"https://twitter.com/user/status/123\">May 1, 2024</a></blockquote>\n"}"#;
        assert_eq!(parse_oembed(body).as_deref(), Some("Hello #world"));
    }

    #[test]
    fn minimal_fragment() {
        let body = r#"{"html":"<blockquote><p>Hello #world</p></blockquote>"}"#;
        assert_eq!(parse_oembed(body).as_deref(), Some("Hello #world"));
    }

    #[test]
    fn decodes_entities() {
        let body = r#"{"html":"<blockquote><p>Fish &amp; chips &gt; salad</p></blockquote>"}"#;
        assert_eq!(parse_oembed(body).as_deref(), Some("Fish & chips > salad"));
    }

    #[test]
    fn missing_or_empty_html() {
        assert!(parse_oembed(r#"{"author_name":"someone"}"#).is_none());
        assert!(parse_oembed(r#"{"html":""}"#).is_none());
        assert!(parse_oembed(r#"{"html":"<blockquote><p>   </p></blockquote>"}"#).is_none());
        assert!(parse_oembed(r#"{"html":"<div>no quote</div>"}"#).is_none());
    }

    #[test]
    fn malformed_json() {
        assert!(parse_oembed("<html>rate limited</html>").is_none());
    }

    // answers exactly one request with `status` and `body`, then closes
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut seen = Vec::new();
            while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 { break; }
                seen.extend_from_slice(&buf[..n]);
            }
            let resp = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(resp.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
        });
        format!("http://{addr}/oembed")
    }

    fn fetcher(endpoint: String) -> OEmbedFetcher {
        let cfg = FastPathConfig { oembed_endpoint: endpoint, timeout: std::time::Duration::from_secs(5) };
        OEmbedFetcher::new(&cfg, "test-agent").unwrap()
    }

    const TWEET: &str = r#"{"html":"<blockquote><p>Hello #world</p></blockquote>"}"#;

    #[tokio::test]
    async fn non_success_status_returns_none() {
        let endpoint = serve_once("404 Not Found", TWEET).await;
        let url = Url::parse("https://x.com/user/status/123").unwrap();
        assert!(fetcher(endpoint).try_fast_path(&url, &CancellationToken::new()).await.is_none());
    }

    #[tokio::test]
    async fn success_status_yields_tweet_text() {
        let endpoint = serve_once("200 OK", TWEET).await;
        let url = Url::parse("https://x.com/user/status/123").unwrap();
        let text = fetcher(endpoint).try_fast_path(&url, &CancellationToken::new()).await;
        assert_eq!(text.as_deref(), Some("Hello #world"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_returns_none() {
        let url = Url::parse("https://x.com/user/status/123").unwrap();
        let out = fetcher("http://127.0.0.1:9/oembed".into()).try_fast_path(&url, &CancellationToken::new()).await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn cancelled_before_request_returns_none() {
        let cfg = FastPathConfig {
            oembed_endpoint: "http://127.0.0.1:9/oembed".to_string(),
            timeout: std::time::Duration::from_secs(5),
        };
        let fetcher = OEmbedFetcher::new(&cfg, "test-agent").unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let url = Url::parse("https://x.com/user/status/1").unwrap();
        assert!(fetcher.try_fast_path(&url, &cancel).await.is_none());
    }
}
