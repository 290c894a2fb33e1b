use serde::Serialize;
use url::Url;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    LinkedIn,
    TwitterX,
    Generic,
}

const LINKEDIN_HOSTS: &[&str] = &["linkedin.com"];
const TWITTER_HOSTS: &[&str] = &["twitter.com", "x.com"];

impl Platform {
    /// Classify a parsed URL by host. Subdomains (`www.`, `mobile.`) match their parent.
    pub fn classify(url: &Url) -> Self {
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        if host_matches(&host, LINKEDIN_HOSTS) {
            Platform::LinkedIn
        } else if host_matches(&host, TWITTER_HOSTS) {
            Platform::TwitterX
        } else {
            Platform::Generic
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "linkedin",
            Platform::TwitterX => "twitter_x",
            Platform::Generic => "generic",
        }
    }

    /// Cookie domain for session cookies, when the platform takes any.
    pub fn cookie_domain(&self) -> Option<&'static str> {
        match self {
            Platform::LinkedIn => Some(".linkedin.com"),
            _ => None,
        }
    }
}

fn host_matches(host: &str, known: &[&str]) -> bool {
    let host = host.trim_end_matches('.');
    known.iter().any(|k| {
        host == *k || (host.len() > k.len() && host.ends_with(k) && host[..host.len() - k.len()].ends_with('.'))
    })
}
