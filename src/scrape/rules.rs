//! Per-platform selector tables.
//!
//! Each table is evaluated top to bottom and the first rule that yields
//! qualifying text wins. Tables run from the most precise structural
//! selector to broad class-name selectors, so page chrome matching a broad
//! selector only gets a chance once nothing specific matched.

/// How a rule treats the nodes its pattern selects.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Scan {
    /// Only the first matched node is considered.
    First,
    /// The first matched node whose text qualifies.
    Any,
    /// Every qualifying node, space-joined in document order.
    Join,
    /// Inside each matched node, one candidate: the first descendant of the
    /// first inner pattern that has any. The first qualifying candidate wins.
    Scoped(&'static [&'static str]),
}

#[derive(Copy, Clone, Debug)]
pub struct SelectorRule {
    pub pattern: &'static str,
    /// Text must be strictly longer than this many characters.
    pub min_len: usize,
    pub scan: Scan,
}

const fn rule(pattern: &'static str, min_len: usize, scan: Scan) -> SelectorRule {
    SelectorRule { pattern, min_len, scan }
}

pub const LINKEDIN_MIN_LEN: usize = 50;

pub static LINKEDIN_RULES: &[SelectorRule] = &[
    rule("article[data-id] .feed-shared-text__text", LINKEDIN_MIN_LEN, Scan::First),
    rule(".feed-shared-update-v2__description", LINKEDIN_MIN_LEN, Scan::First),
    rule(r#"[data-test-id="main-feed-activity-card"] .feed-shared-text"#, LINKEDIN_MIN_LEN, Scan::First),
    rule("article .break-words", LINKEDIN_MIN_LEN, Scan::First),
    rule(".feed-shared-text", LINKEDIN_MIN_LEN, Scan::First),
    // any article with substantial body text
    rule("article", LINKEDIN_MIN_LEN, Scan::Any),
];

/// Marker present on profile/timeline pages, never on a single-tweet page.
pub const TWITTER_PROFILE_MARKER: &str = r#"div[data-testid="profileHeader"]"#;

/// Element the renderer waits for on Twitter/X before snapshotting.
pub const TWEET_TEXT_SELECTOR: &str = r#"[data-testid="tweetText"]"#;

pub static TWITTER_RULES: &[SelectorRule] = &[
    rule(TWEET_TEXT_SELECTOR, 10, Scan::First),
    rule(".tweet-text", 20, Scan::First),
    rule(r#"[data-test-id="tweet"]"#, 20, Scan::First),
    rule(".css-1dbjc4n.r-1iusvr4.r-16y2uox.r-1kbdv8c", 20, Scan::First),
    // tweets always declare their language
    rule(r#"div[lang][dir="auto"]"#, 20, Scan::Any),
    // per tweet article: its tweet text, else its first language-tagged div
    rule(r#"article[data-testid="tweet"]"#, 10, Scan::Scoped(&[TWEET_TEXT_SELECTOR, "div[lang]"])),
];

pub const GENERIC_MIN_LEN: usize = 10;

pub static GENERIC_RULES: &[SelectorRule] = &[
    rule("main article", GENERIC_MIN_LEN, Scan::Join),
    rule("article", GENERIC_MIN_LEN, Scan::Join),
    rule(".content", GENERIC_MIN_LEN, Scan::Join),
    rule(".post-content", GENERIC_MIN_LEN, Scan::Join),
    rule(".entry-content", GENERIC_MIN_LEN, Scan::Join),
    rule("main p", GENERIC_MIN_LEN, Scan::Join),
    rule("body p", GENERIC_MIN_LEN, Scan::Join),
];
