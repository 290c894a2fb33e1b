use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const DEFAULT_OEMBED_ENDPOINT: &str = "https://publish.twitter.com/oembed";
const DEFAULT_FAST_PATH_TIMEOUT_SECS: u64 = 10;

/// Process-wide scraper settings. Loaded once, read-only afterwards.
#[derive(Clone, Debug)]
pub struct ScraperConfig {
    pub user_agent: String,
    /// Raw `name=value; name2=value2` cookie string for LinkedIn.
    pub linkedin_cookies: Option<String>,
    pub fast_path: FastPathConfig,
    pub render: RenderPolicy,
    pub chrome_path: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct FastPathConfig {
    pub oembed_endpoint: String,
    pub timeout: Duration,
}

/// Delays and timeouts applied by the rendering backend.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderPolicy {
    pub nav_delay_min: Duration,
    pub nav_delay_max: Duration,
    pub nav_timeout: Duration,
    pub twitter_nav_timeout: Duration,
    pub settle: Duration,
    pub twitter_settle: Duration,
    pub tweet_wait: Duration,
}

impl Default for FastPathConfig {
    fn default() -> Self {
        Self {
            oembed_endpoint: DEFAULT_OEMBED_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_FAST_PATH_TIMEOUT_SECS),
        }
    }
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self {
            nav_delay_min: Duration::from_millis(1000),
            nav_delay_max: Duration::from_millis(3000),
            nav_timeout: Duration::from_secs(30),
            twitter_nav_timeout: Duration::from_secs(60),
            settle: Duration::from_millis(2000),
            twitter_settle: Duration::from_millis(5000),
            tweet_wait: Duration::from_secs(10),
        }
    }
}

impl RenderPolicy {
    /// No artificial delays; timeouts kept short. Used by tests.
    pub fn immediate() -> Self {
        Self {
            nav_delay_min: Duration::ZERO,
            nav_delay_max: Duration::ZERO,
            nav_timeout: Duration::from_secs(5),
            twitter_nav_timeout: Duration::from_secs(5),
            settle: Duration::ZERO,
            twitter_settle: Duration::ZERO,
            tweet_wait: Duration::ZERO,
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            linkedin_cookies: None,
            fast_path: FastPathConfig::default(),
            render: RenderPolicy::default(),
            chrome_path: None,
        }
    }
}

impl ScraperConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(ua) = non_empty_var("PULSETAG_USER_AGENT") {
            cfg.user_agent = ua;
        }
        cfg.linkedin_cookies = non_empty_var("PULSETAG_LINKEDIN_COOKIES");
        cfg.chrome_path = non_empty_var("PULSETAG_CHROME_PATH").map(PathBuf::from);

        if let Some(endpoint) = non_empty_var("PULSETAG_OEMBED_ENDPOINT") {
            cfg.fast_path.oembed_endpoint = endpoint;
        }
        if let Some(secs) = parsed_var::<u64>("PULSETAG_FAST_PATH_TIMEOUT_SECS") {
            cfg.fast_path.timeout = Duration::from_secs(secs);
        }

        let r = &mut cfg.render;
        if let Some(ms) = parsed_var::<u64>("PULSETAG_NAV_DELAY_MIN_MS") { r.nav_delay_min = Duration::from_millis(ms); }
        if let Some(ms) = parsed_var::<u64>("PULSETAG_NAV_DELAY_MAX_MS") { r.nav_delay_max = Duration::from_millis(ms); }
        if let Some(s) = parsed_var::<u64>("PULSETAG_NAV_TIMEOUT_SECS") { r.nav_timeout = Duration::from_secs(s); }
        if let Some(s) = parsed_var::<u64>("PULSETAG_TWITTER_NAV_TIMEOUT_SECS") { r.twitter_nav_timeout = Duration::from_secs(s); }
        if let Some(ms) = parsed_var::<u64>("PULSETAG_SETTLE_MS") { r.settle = Duration::from_millis(ms); }
        if let Some(ms) = parsed_var::<u64>("PULSETAG_TWITTER_SETTLE_MS") { r.twitter_settle = Duration::from_millis(ms); }
        if let Some(s) = parsed_var::<u64>("PULSETAG_TWEET_WAIT_SECS") { r.tweet_wait = Duration::from_secs(s); }
        if r.nav_delay_max < r.nav_delay_min {
            r.nav_delay_max = r.nav_delay_min;
        }
        cfg
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    non_empty_var(key).and_then(|v| v.parse::<T>().ok())
}
