use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::platform::Platform;

use super::rules::{Scan, SelectorRule, GENERIC_RULES, LINKEDIN_RULES, TWITTER_PROFILE_MARKER, TWITTER_RULES};
use super::{ExtractionOutcome, RenderedDocument};

/// Run the platform's strategy over a rendered document.
///
/// Never returns `ExtractionOutcome::Error`; only the orchestrator produces errors.
pub fn extract(platform: Platform, doc: &RenderedDocument) -> ExtractionOutcome {
    let html = Html::parse_document(doc.html());
    let outcome = match platform {
        Platform::LinkedIn => found_or_not(first_qualifying(&html, LINKEDIN_RULES)),
        Platform::TwitterX => extract_twitter(&html),
        Platform::Generic => {
            found_or_not(first_qualifying(&html, GENERIC_RULES).or_else(|| title_and_description(&html)))
        }
    };
    if matches!(outcome, ExtractionOutcome::NotFound) {
        warn!(platform = platform.name(), "no selector matched");
    }
    outcome
}

fn extract_twitter(html: &Html) -> ExtractionOutcome {
    if has_match(html, TWITTER_PROFILE_MARKER) {
        debug!("profile header present, not a single tweet");
        return ExtractionOutcome::AmbiguousProfilePage;
    }
    found_or_not(first_qualifying(html, TWITTER_RULES))
}

/// Walk `rules` in order and return the text of the first rule that qualifies.
pub fn first_qualifying(doc: &Html, rules: &[SelectorRule]) -> Option<String> {
    for rule in rules {
        let Ok(sel) = Selector::parse(rule.pattern) else {
            warn!(selector = rule.pattern, "skipping unparseable selector");
            continue;
        };
        if let Some(text) = apply_rule(doc, &sel, rule) {
            debug!(selector = rule.pattern, len = text.chars().count(), "selector matched");
            return Some(text);
        }
    }
    None
}

fn apply_rule(doc: &Html, sel: &Selector, rule: &SelectorRule) -> Option<String> {
    let mut nodes = doc.select(sel);
    match rule.scan {
        Scan::First => {
            let text = node_text(nodes.next()?);
            if qualifies(&text, rule.min_len) {
                Some(text)
            } else {
                debug!(selector = rule.pattern, len = text.chars().count(), min_len = rule.min_len, "selector rejected: text too short");
                None
            }
        }
        Scan::Any => {
            let found = nodes.map(node_text).find(|t| qualifies(t, rule.min_len));
            if found.is_none() {
                debug!(selector = rule.pattern, min_len = rule.min_len, "no node above threshold");
            }
            found
        }
        Scan::Scoped(inner) => {
            let inner: Vec<Selector> = inner.iter().filter_map(|p| Selector::parse(p).ok()).collect();
            let found = nodes
                .filter_map(|scope| inner.iter().find_map(|s| scope.select(s).next()))
                .map(node_text)
                .find(|t| qualifies(t, rule.min_len));
            if found.is_none() {
                debug!(selector = rule.pattern, min_len = rule.min_len, "no scoped candidate above threshold");
            }
            found
        }
        Scan::Join => {
            let parts: Vec<String> = nodes.map(node_text).filter(|t| qualifies(t, rule.min_len)).collect();
            if parts.is_empty() {
                debug!(selector = rule.pattern, min_len = rule.min_len, "no node above threshold");
                None
            } else {
                Some(parts.join(" "))
            }
        }
    }
}

// last resort for generic pages: <title> then meta description
fn title_and_description(doc: &Html) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(title) = select_first(doc, "title").map(node_text) {
        if !title.is_empty() { parts.push(title); }
    }
    if let Some(meta) = select_first(doc, "meta[name=description]") {
        let content = meta.value().attr("content").unwrap_or("").trim();
        if !content.is_empty() { parts.push(content.to_string()); }
    }
    if parts.is_empty() {
        None
    } else {
        debug!(parts = parts.len(), "falling back to title and meta description");
        Some(parts.join(" "))
    }
}

fn select_first<'a>(doc: &'a Html, pattern: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(pattern).ok()?;
    doc.select(&sel).next()
}

fn has_match(doc: &Html, pattern: &str) -> bool {
    select_first(doc, pattern).is_some()
}

fn node_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn qualifies(text: &str, min_len: usize) -> bool {
    text.chars().count() > min_len
}

fn found_or_not(text: Option<String>) -> ExtractionOutcome {
    match text {
        Some(t) if !t.trim().is_empty() => ExtractionOutcome::Found(t),
        _ => ExtractionOutcome::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(platform: Platform, html: &str) -> ExtractionOutcome {
        extract(platform, &RenderedDocument::new(html))
    }

    fn found(outcome: ExtractionOutcome) -> String {
        match outcome {
            ExtractionOutcome::Found(t) => t,
            other => panic!("expected Found, got {other:?}"),
        }
    }

    const EIGHTY: &str = "This LinkedIn post talks about shipping software with small teams every week.";

    #[test]
    fn linkedin_primary_selector() {
        let html = format!(
            r#"<html><body><article data-id="1"><div class="feed-shared-text__text">  {EIGHTY}  </div></article></body></html>"#
        );
        assert_eq!(found(run(Platform::LinkedIn, &html)), EIGHTY);
    }

    #[test]
    fn linkedin_short_primary_falls_through_to_article() {
        let article = "Only the generic article fallback carries the real post text in this document ok";
        assert_eq!(article.chars().count(), 80);
        let html = format!(
            r#"<html><body>
                <div class="feed-shared-update-v2__description">Too short</div>
                <article><p>{article}</p></article>
            </body></html>"#
        );
        assert_eq!(found(run(Platform::LinkedIn, &html)), article);
    }

    #[test]
    fn linkedin_skips_short_articles() {
        let html = format!(
            r#"<html><body><article>Sign in</article><article>{EIGHTY}</article></body></html>"#
        );
        assert_eq!(found(run(Platform::LinkedIn, &html)), EIGHTY);
    }

    #[test]
    fn linkedin_nothing_qualifies() {
        let html = r#"<html><body><article>Join now</article><p>short</p></body></html>"#;
        assert!(matches!(run(Platform::LinkedIn, html), ExtractionOutcome::NotFound));
    }

    #[test]
    fn linkedin_decodes_entities() {
        let html = r#"<html><body><div class="feed-shared-text">Tom &amp; Jerry&#39;s guide to building durable, well-tested Rust services</div></body></html>"#;
        assert_eq!(
            found(run(Platform::LinkedIn, html)),
            "Tom & Jerry's guide to building durable, well-tested Rust services"
        );
    }

    #[test]
    fn twitter_profile_marker_wins_over_tweet_text() {
        let html = r#"<html><body>
            <div data-testid="profileHeader">@someone</div>
            <div data-testid="tweetText">A perfectly good looking tweet body</div>
        </body></html>"#;
        assert!(matches!(run(Platform::TwitterX, html), ExtractionOutcome::AmbiguousProfilePage));
    }

    #[test]
    fn twitter_primary_selector() {
        let html = r#"<html><body><div data-testid="tweetText"><span>Hello </span><a>#world</a> again</div></body></html>"#;
        assert_eq!(found(run(Platform::TwitterX, html)), "Hello #world again");
    }

    #[test]
    fn twitter_falls_back_to_lang_attribute() {
        let html = r#"<html><body>
            <div data-testid="tweetText">hi</div>
            <div lang="en" dir="auto">short</div>
            <div lang="en" dir="auto">A longer tweet body that declares its language</div>
        </body></html>"#;
        assert_eq!(found(run(Platform::TwitterX, html)), "A longer tweet body that declares its language");
    }

    #[test]
    fn twitter_article_scoped_lookup() {
        let html = r#"<html><body>
            <article data-testid="tweet"><div lang="en">Twelve chars</div></article>
        </body></html>"#;
        assert_eq!(found(run(Platform::TwitterX, html)), "Twelve chars");
    }

    #[test]
    fn twitter_article_takes_only_its_first_lang_div() {
        let html = r#"<html><body>
            <article data-testid="tweet"><div lang="en">short</div><div lang="en">quoted tweet body here</div></article>
        </body></html>"#;
        assert!(matches!(run(Platform::TwitterX, html), ExtractionOutcome::NotFound));
    }

    #[test]
    fn twitter_article_uses_tweet_text_before_lang_div() {
        let short = r#"<html><body>
            <article data-testid="tweet"><div data-testid="tweetText">tiny</div><div lang="en">Another long language div</div></article>
            <article data-testid="tweet"><div lang="en">Second article text</div></article>
        </body></html>"#;
        // the first article's tweet text is too short, so its long lang div is never considered
        assert_eq!(found(run(Platform::TwitterX, short)), "Second article text");
    }

    #[test]
    fn twitter_secondary_selectors_beat_lang_fallback() {
        let lang = r#"<div lang="en" dir="auto">Language tagged text that is long enough</div>"#;
        for (markup, expected) in [
            (r#"<p class="tweet-text">Legacy tweet markup body text</p>"#, "Legacy tweet markup body text"),
            (r#"<div data-test-id="tweet">Test id tweet body text here</div>"#, "Test id tweet body text here"),
            (
                r#"<div class="css-1dbjc4n r-1iusvr4 r-16y2uox r-1kbdv8c">Atomic class tweet body text</div>"#,
                "Atomic class tweet body text",
            ),
        ] {
            let html = format!("<html><body>{lang}{markup}</body></html>");
            assert_eq!(found(run(Platform::TwitterX, &html)), expected, "{markup}");
        }
    }

    #[test]
    fn thresholds_are_strictly_greater_than() {
        let fifty = "a".repeat(50);
        let html = format!(r#"<html><body><div class="feed-shared-text">{fifty}</div></body></html>"#);
        assert!(matches!(run(Platform::LinkedIn, &html), ExtractionOutcome::NotFound));
        let html = format!(r#"<html><body><div class="feed-shared-text">{fifty}b</div></body></html>"#);
        assert_eq!(found(run(Platform::LinkedIn, &html)).chars().count(), 51);

        let html = r#"<html><body><div data-testid="tweetText">0123456789</div></body></html>"#;
        assert!(matches!(run(Platform::TwitterX, html), ExtractionOutcome::NotFound));
        let html = r#"<html><body><div data-testid="tweetText">0123456789a</div></body></html>"#;
        assert_eq!(found(run(Platform::TwitterX, html)), "0123456789a");

        let twenty = "b".repeat(20);
        let html = format!(r#"<html><body><p class="tweet-text">{twenty}</p></body></html>"#);
        assert!(matches!(run(Platform::TwitterX, &html), ExtractionOutcome::NotFound));
        let html = format!(r#"<html><body><p class="tweet-text">{twenty}c</p></body></html>"#);
        assert_eq!(found(run(Platform::TwitterX, &html)).chars().count(), 21);
    }

    #[test]
    fn twitter_not_found() {
        let html = r#"<html><body><div>Something went wrong. Try reloading.</div></body></html>"#;
        assert!(matches!(run(Platform::TwitterX, html), ExtractionOutcome::NotFound));
    }

    #[test]
    fn generic_joins_paragraphs_under_main() {
        let html = r#"<html><body>
            <nav><p>Home</p></nav>
            <main>
                <p>First paragraph of the post.</p>
                <p>tiny</p>
                <p>Second paragraph of the post.</p>
            </main>
        </body></html>"#;
        assert_eq!(
            found(run(Platform::Generic, html)),
            "First paragraph of the post. Second paragraph of the post."
        );
    }

    #[test]
    fn generic_prefers_article_over_paragraphs() {
        let html = r#"<html><body>
            <p>Unrelated footer paragraph text</p>
            <article>The article body wins here.</article>
        </body></html>"#;
        assert_eq!(found(run(Platform::Generic, html)), "The article body wins here.");
    }

    #[test]
    fn generic_title_and_description_fallback() {
        let html = r#"<html><head>
            <title> My Page </title>
            <meta name="description" content="A page about things">
        </head><body><div>hi</div></body></html>"#;
        assert_eq!(found(run(Platform::Generic, html)), "My Page A page about things");
    }

    #[test]
    fn generic_title_only() {
        let html = r#"<html><head><title>Just a title</title></head><body></body></html>"#;
        assert_eq!(found(run(Platform::Generic, html)), "Just a title");
    }

    #[test]
    fn generic_empty_page() {
        let html = r#"<html><head></head><body><span>x</span></body></html>"#;
        assert!(matches!(run(Platform::Generic, html), ExtractionOutcome::NotFound));
    }

    #[test]
    fn first_qualifying_respects_rule_order() {
        let rules = [
            SelectorRule { pattern: ".a", min_len: 3, scan: Scan::First },
            SelectorRule { pattern: ".b", min_len: 3, scan: Scan::First },
        ];
        let doc = Html::parse_document(r#"<div class="b">from b</div><div class="a">from a</div>"#);
        assert_eq!(first_qualifying(&doc, &rules).as_deref(), Some("from a"));
    }
}
