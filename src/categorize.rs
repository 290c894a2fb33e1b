use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::llm::openai::{ChatCompletionRequest, ChatMessage, ChatRole, LlmClient};

const MAX_INPUT_CHARS: usize = 5000;
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 1000;

const STRATEGIST_PROMPT: &str = "\
You are a Viral Social Media Strategist. You analyse social media posts to maximise reach.
**Input:** The text content of a user's post.
**Task:** Analyse the core topics, tone, and industry.
**Output:** Return ONLY a JSON object with three arrays of hashtags:
1. 'safe': High-volume, broad tags (e.g., #Marketing, #Tech). Use these for baseline visibility.
2. 'rising': Trending, mid-volume tags relevant *right now* or to specific modern sub-cultures (e.g., #GenAI, #GrowthHacking).
3. 'niche': Specific, low-competition tags that target high-intent users (e.g., #SaaSMarketingTips).

**Rules:**
* Do not include the # symbol in the string, just the word.
* Ensure tags are CamelCase (e.g., 'DigitalMarketing', not 'digitalmarketing').
* Do not return any conversational text, only the JSON.";

/// Hashtag suggestions grouped by reach tier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashtagBundle {
    pub safe: Vec<String>,
    pub rising: Vec<String>,
    pub niche: Vec<String>,
}

impl HashtagBundle {
    /// Returned whenever the provider cannot produce a usable answer.
    pub fn fallback() -> Self {
        Self {
            safe: vec!["SocialMedia".into(), "Marketing".into()],
            rising: vec!["DigitalTrends".into()],
            niche: vec!["ContentStrategy".into()],
        }
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }

    /// Reads `safe`/`rising`/`niche` from a JSON object, matching keys case-insensitively.
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let tier = |name: &str| -> Vec<String> {
            obj.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .and_then(|(_, v)| v.as_array())
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|t| t.trim().trim_start_matches('#').to_string())
                        .filter(|t| !t.is_empty())
                        .collect()
                })
                .unwrap_or_default()
        };
        Some(Self { safe: tier("safe"), rising: tier("rising"), niche: tier("niche") })
    }
}

/// Turns post text into hashtag suggestions. Never fails; degrades to [`HashtagBundle::fallback`].
#[async_trait]
pub trait Categorizer: Send + Sync {
    async fn categorize(&self, text: &str) -> HashtagBundle;
}

pub struct LlmCategorizer {
    client: Arc<dyn LlmClient>,
    role_marker: Regex,
    json_span: Regex,
}

impl LlmCategorizer {
    pub fn new(client: Arc<dyn LlmClient>) -> Result<Self, regex::Error> {
        Ok(Self {
            client,
            role_marker: Regex::new(r"(?i)(?:system|assistant|user)\s*:")?,
            json_span: Regex::new(r"(?s)\{.*\}")?,
        })
    }

    /// Strips chat role markers and caps the length.
    pub fn sanitize(&self, text: &str) -> String {
        let cleaned = self.role_marker.replace_all(text, "");
        cleaned.chars().take(MAX_INPUT_CHARS).collect()
    }

    fn request_for(&self, text: &str) -> ChatCompletionRequest {
        let content = format!("{STRATEGIST_PROMPT}\n\nAnalyze this post:\n\n{}", self.sanitize(text));
        ChatCompletionRequest {
            model: None,
            messages: vec![ChatMessage::new(ChatRole::User, content)],
            max_tokens: Some(MAX_TOKENS),
            temperature: Some(TEMPERATURE),
        }
    }

    /// Direct JSON first, then the outermost `{...}` span embedded in prose.
    pub fn parse_reply(&self, reply: &str) -> Option<HashtagBundle> {
        if let Ok(value) = serde_json::from_str::<Value>(reply.trim()) {
            if let Some(bundle) = HashtagBundle::from_value(&value) {
                return Some(bundle);
            }
        }
        let span = self.json_span.find(reply)?;
        let value = serde_json::from_str::<Value>(span.as_str()).ok()?;
        HashtagBundle::from_value(&value)
    }
}

#[async_trait]
impl Categorizer for LlmCategorizer {
    async fn categorize(&self, text: &str) -> HashtagBundle {
        let response = match self.client.chat_completion(self.request_for(text)).await {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, "hashtag provider call failed");
                return HashtagBundle::fallback();
            }
        };
        if response.content.trim().is_empty() {
            warn!("hashtag provider returned empty content");
            return HashtagBundle::fallback();
        }
        if let Some(usage) = &response.usage {
            debug!(total_tokens = ?usage.total_tokens, "hashtag provider usage");
        }
        match self.parse_reply(&response.content) {
            Some(bundle) => {
                info!(safe = bundle.safe.len(), rising = bundle.rising.len(), niche = bundle.niche.len(), "hashtags parsed");
                bundle
            }
            None => {
                error!(content = %response.content, "could not parse hashtag reply");
                HashtagBundle::fallback()
            }
        }
    }
}
