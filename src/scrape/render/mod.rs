use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{RenderPolicy, ScraperConfig};
use crate::platform::Platform;

use super::rules::TWEET_TEXT_SELECTOR;
use super::RenderedDocument;

pub mod chromium;

pub use chromium::ChromiumDriver;

/// Produces a fully rendered DOM snapshot for one URL.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, url: &Url, platform: Platform, cancel: &CancellationToken) -> Result<RenderedDocument, RenderError>;
}

/// Navigation readiness signal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WaitUntil {
    DomContentLoaded,
    NetworkIdle,
}

impl WaitUntil {
    /// CDP lifecycle event name for this signal.
    pub fn lifecycle_name(&self) -> &'static str {
        match self {
            WaitUntil::DomContentLoaded => "DOMContentLoaded",
            WaitUntil::NetworkIdle => "networkIdle",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
}

/// Launches one isolated browser per call.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    type Session: BrowserSession + 'static;
    async fn launch(&self, user_agent: &str) -> Result<Self::Session, RenderError>;
}

/// A live browser owned by a single render call. `close` must be awaited to release it.
#[async_trait]
pub trait BrowserSession: Send {
    async fn set_cookies(&mut self, cookies: &[SessionCookie], domain: &str) -> Result<(), RenderError>;
    async fn navigate(&mut self, url: &str, wait: WaitUntil) -> Result<(), RenderError>;
    async fn wait_for_selector(&mut self, selector: &str) -> Result<(), RenderError>;
    async fn content(&mut self) -> Result<String, RenderError>;
    async fn close(self) -> Result<(), RenderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    Launch(String),
    Navigation(String),
    Browser(String),
    Timeout(&'static str),
    Cancelled,
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Launch(e) => write!(f, "browser launch failed: {e}"),
            RenderError::Navigation(e) => write!(f, "navigation failed: {e}"),
            RenderError::Browser(e) => write!(f, "browser error: {e}"),
            RenderError::Timeout(phase) => write!(f, "timed out during {phase}"),
            RenderError::Cancelled => write!(f, "render cancelled"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Applies the per-platform rendering policy on top of a [`BrowserDriver`].
pub struct BrowserRenderer<D: BrowserDriver> {
    driver: D,
    user_agent: String,
    linkedin_cookies: Vec<SessionCookie>,
    policy: RenderPolicy,
}

impl<D: BrowserDriver> BrowserRenderer<D> {
    pub fn new(driver: D, cfg: &ScraperConfig) -> Self {
        let linkedin_cookies = cfg.linkedin_cookies.as_deref().map(parse_cookie_string).unwrap_or_default();
        Self { driver, user_agent: cfg.user_agent.clone(), linkedin_cookies, policy: cfg.render.clone() }
    }

    async fn drive(&self, session: &mut D::Session, url: &Url, platform: Platform) -> Result<RenderedDocument, RenderError> {
        if platform == Platform::LinkedIn && !self.linkedin_cookies.is_empty() {
            if let Some(domain) = platform.cookie_domain() {
                // injection failure is tolerated, navigation proceeds anonymously
                match session.set_cookies(&self.linkedin_cookies, domain).await {
                    Ok(()) => info!(count = self.linkedin_cookies.len(), domain, "injected session cookies"),
                    Err(e) => warn!(error = %e, domain, "cookie injection failed"),
                }
            }
        }

        let delay = pre_navigation_delay(&self.policy);
        if !delay.is_zero() {
            debug!(delay_ms = delay.as_millis() as u64, "pre-navigation delay");
            tokio::time::sleep(delay).await;
        }

        let (wait, nav_timeout, settle) = match platform {
            Platform::TwitterX => (WaitUntil::NetworkIdle, self.policy.twitter_nav_timeout, self.policy.twitter_settle),
            _ => (WaitUntil::DomContentLoaded, self.policy.nav_timeout, self.policy.settle),
        };
        tokio::time::timeout(nav_timeout, session.navigate(url.as_str(), wait))
            .await
            .map_err(|_| RenderError::Timeout("navigation"))??;

        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }

        if platform == Platform::TwitterX {
            match tokio::time::timeout(self.policy.tweet_wait, session.wait_for_selector(TWEET_TEXT_SELECTOR)).await {
                Ok(Ok(())) => debug!("tweet text element present"),
                Ok(Err(e)) => warn!(error = %e, "tweet text selector not found, continuing with heuristic extraction"),
                Err(_) => warn!(wait_ms = self.policy.tweet_wait.as_millis() as u64, "tweet text selector not found, continuing with heuristic extraction"),
            }
        }

        let html = session.content().await?;
        Ok(RenderedDocument::new(html))
    }
}

#[async_trait]
impl<D: BrowserDriver> Renderer for BrowserRenderer<D> {
    async fn render(&self, url: &Url, platform: Platform, cancel: &CancellationToken) -> Result<RenderedDocument, RenderError> {
        if cancel.is_cancelled() {
            return Err(RenderError::Cancelled);
        }
        let mut session = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("cancelled during browser launch");
                return Err(RenderError::Cancelled);
            }
            launched = self.driver.launch(&self.user_agent) => launched?,
        };
        if cancel.is_cancelled() {
            // launch won the race against a cancel that had already fired
            if let Err(e) = session.close().await {
                warn!(error = %e, "browser close failed");
            }
            return Err(RenderError::Cancelled);
        }

        let result = tokio::select! {
            _ = cancel.cancelled() => Err(RenderError::Cancelled),
            r = self.drive(&mut session, url, platform) => r,
        };

        // released on every path, including cancellation
        if let Err(e) = session.close().await {
            warn!(error = %e, "browser close failed");
        }
        result
    }
}

fn pre_navigation_delay(policy: &RenderPolicy) -> Duration {
    let min = policy.nav_delay_min.as_millis() as u64;
    let max = policy.nav_delay_max.as_millis() as u64;
    if max <= min {
        return Duration::from_millis(min);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min..=max))
}

/// Parse a `name=value; name2=value2` header-style cookie string. Pairs without `=` are skipped.
pub fn parse_cookie_string(raw: &str) -> Vec<SessionCookie> {
    raw.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(SessionCookie { name: name.to_string(), value: value.trim().to_string() })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Default)]
    pub struct Counters {
        pub launches: AtomicUsize,
        pub closes: AtomicUsize,
        pub cookies: Mutex<Vec<(String, String, String)>>,
        pub waits: Mutex<Vec<WaitUntil>>,
        pub selector_waits: AtomicUsize,
    }

    impl Counters {
        pub fn launches(&self) -> usize { self.launches.load(Ordering::SeqCst) }
        pub fn closes(&self) -> usize { self.closes.load(Ordering::SeqCst) }
    }

    #[derive(Clone, Default)]
    pub struct Script {
        pub fail_launch: bool,
        pub hang_launch: bool,
        pub cancel_on_launch: Option<CancellationToken>,
        pub fail_navigate: bool,
        pub hang_navigate: bool,
        pub fail_content: bool,
        pub fail_selector: bool,
        pub html: String,
    }

    /// Fake driver that counts launches and closes.
    #[derive(Clone, Default)]
    pub struct FakeDriver {
        pub counters: Arc<Counters>,
        pub script: Script,
    }

    pub struct FakeSession {
        counters: Arc<Counters>,
        script: Script,
    }

    #[async_trait]
    impl BrowserDriver for FakeDriver {
        type Session = FakeSession;
        async fn launch(&self, _user_agent: &str) -> Result<FakeSession, RenderError> {
            if self.script.fail_launch {
                return Err(RenderError::Launch("no chromium".into()));
            }
            if self.script.hang_launch {
                std::future::pending::<()>().await;
            }
            self.counters.launches.fetch_add(1, Ordering::SeqCst);
            if let Some(cancel) = &self.script.cancel_on_launch {
                cancel.cancel();
            }
            Ok(FakeSession { counters: self.counters.clone(), script: self.script.clone() })
        }
    }

    #[async_trait]
    impl BrowserSession for FakeSession {
        async fn set_cookies(&mut self, cookies: &[SessionCookie], domain: &str) -> Result<(), RenderError> {
            let mut seen = self.counters.cookies.lock().unwrap();
            seen.extend(cookies.iter().map(|c| (c.name.clone(), c.value.clone(), domain.to_string())));
            Ok(())
        }

        async fn navigate(&mut self, _url: &str, wait: WaitUntil) -> Result<(), RenderError> {
            self.counters.waits.lock().unwrap().push(wait);
            if self.script.hang_navigate {
                std::future::pending::<()>().await;
            }
            if self.script.fail_navigate {
                return Err(RenderError::Navigation("net::ERR_NAME_NOT_RESOLVED".into()));
            }
            Ok(())
        }

        async fn wait_for_selector(&mut self, _selector: &str) -> Result<(), RenderError> {
            self.counters.selector_waits.fetch_add(1, Ordering::SeqCst);
            if self.script.fail_selector {
                return Err(RenderError::Browser("selector missing".into()));
            }
            Ok(())
        }

        async fn content(&mut self) -> Result<String, RenderError> {
            if self.script.fail_content {
                return Err(RenderError::Browser("target closed".into()));
            }
            Ok(self.script.html.clone())
        }

        async fn close(self) -> Result<(), RenderError> {
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    pub fn renderer(script: Script, cookies: Option<&str>) -> (BrowserRenderer<FakeDriver>, Arc<Counters>) {
        let driver = FakeDriver { counters: Arc::default(), script };
        let counters = driver.counters.clone();
        let cfg = ScraperConfig {
            linkedin_cookies: cookies.map(str::to_string),
            render: RenderPolicy::immediate(),
            ..ScraperConfig::default()
        };
        (BrowserRenderer::new(driver, &cfg), counters)
    }
}
