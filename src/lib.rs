//! PulseTag: pull the text out of a social-media post and suggest hashtags for it.
//!
//! [`scrape::Extractor`] runs the extraction cascade (oEmbed fast path for
//! Twitter/X, then headless browser rendering and per-platform selector rules).
//! [`analyze::Analyzer`] feeds the extracted text to a [`categorize::Categorizer`].

pub mod analyze;
pub mod categorize;
pub mod config;
pub mod llm;
pub mod output;
pub mod platform;
pub mod scrape;
pub mod telemetry;

pub use analyze::{AnalyzeFailure, AnalyzeResponse, Analyzer};
pub use categorize::{Categorizer, HashtagBundle, LlmCategorizer};
pub use config::ScraperConfig;
pub use platform::Platform;
pub use scrape::{ExtractError, ExtractionOutcome, Extractor};
