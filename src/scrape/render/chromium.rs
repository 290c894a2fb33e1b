use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::cdp::browser_protocol::page::{EventLifecycleEvent, NavigateParams, SetLifecycleEventsEnabledParams};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{BrowserDriver, BrowserSession, RenderError, SessionCookie, WaitUntil};

const SELECTOR_POLL: Duration = Duration::from_millis(250);

/// Headless Chromium over CDP. Every launch gets its own process and profile directory.
#[derive(Clone, Debug, Default)]
pub struct ChromiumDriver {
    chrome_path: Option<PathBuf>,
}

impl ChromiumDriver {
    pub fn new(chrome_path: Option<PathBuf>) -> Self {
        Self { chrome_path }
    }
}

pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    type Session = ChromiumSession;

    async fn launch(&self, user_agent: &str) -> Result<ChromiumSession, RenderError> {
        let profile_dir = std::env::temp_dir().join(format!("pulsetag-{}", Uuid::new_v4()));
        let mut builder = BrowserConfig::builder()
            .user_data_dir(&profile_dir)
            .window_size(1280, 1024)
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            // hide navigator.webdriver and the automation infobar
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg(format!("--user-agent={user_agent}"));
        if let Some(path) = &self.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(RenderError::Launch)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "cdp handler event error");
                }
            }
        });

        match browser.new_page("about:blank").await {
            Ok(page) => {
                debug!(profile = %profile_dir.display(), "chromium launched");
                Ok(ChromiumSession { browser, page, handler, profile_dir })
            }
            Err(e) => {
                // no session to hand back, so tear down here
                if let Err(err) = browser.close().await {
                    warn!(error = %err, "closing chromium after failed page open");
                }
                if let Err(err) = browser.wait().await {
                    warn!(error = %err, "waiting for chromium exit failed");
                }
                handler.abort();
                remove_profile(&profile_dir).await;
                Err(RenderError::Launch(format!("failed to open page: {e}")))
            }
        }
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn set_cookies(&mut self, cookies: &[SessionCookie], domain: &str) -> Result<(), RenderError> {
        let params = cookies
            .iter()
            .map(|c| {
                CookieParam::builder()
                    .name(c.name.clone())
                    .value(c.value.clone())
                    .domain(domain)
                    .path("/")
                    .build()
                    .map_err(RenderError::Browser)
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.page.set_cookies(params).await.map_err(browser_err)?;
        Ok(())
    }

    async fn navigate(&mut self, url: &str, wait: WaitUntil) -> Result<(), RenderError> {
        self.page
            .execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .map_err(browser_err)?;
        let mut events = self.page.event_listener::<EventLifecycleEvent>().await.map_err(browser_err)?;

        let nav = self
            .page
            .execute(NavigateParams::new(url))
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;
        if let Some(err) = nav.result.error_text.as_ref().filter(|t| !t.is_empty()) {
            return Err(RenderError::Navigation(err.clone()));
        }
        let loader = nav.result.loader_id.clone();

        let target = wait.lifecycle_name();
        while let Some(ev) = events.next().await {
            let same_load = loader.as_ref().map_or(true, |id| *id == ev.loader_id);
            if same_load && ev.name == target {
                debug!(event = target, "navigation reached lifecycle event");
                return Ok(());
            }
        }
        Err(RenderError::Navigation("event stream closed before page loaded".to_string()))
    }

    async fn wait_for_selector(&mut self, selector: &str) -> Result<(), RenderError> {
        // bounded by the caller's timeout
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            tokio::time::sleep(SELECTOR_POLL).await;
        }
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        self.page.content().await.map_err(browser_err)
    }

    async fn close(self) -> Result<(), RenderError> {
        let ChromiumSession { mut browser, page, handler, profile_dir } = self;
        if let Err(e) = page.close().await {
            debug!(error = %e, "page close failed");
        }
        let closed = browser.close().await.map(|_| ()).map_err(browser_err);
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "waiting for chromium exit failed");
        }
        handler.abort();
        remove_profile(&profile_dir).await;
        closed
    }
}

// failures are logged, never surfaced
async fn remove_profile(profile_dir: &Path) {
    match tokio::fs::remove_dir_all(profile_dir).await {
        Ok(()) => debug!(profile = %profile_dir.display(), "profile removed"),
        Err(e) => debug!(error = %e, profile = %profile_dir.display(), "profile cleanup failed"),
    }
}

fn browser_err(e: chromiumoxide::error::CdpError) -> RenderError {
    RenderError::Browser(e.to_string())
}
