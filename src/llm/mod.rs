pub mod openai;

pub use openai::{LlmClient, OpenAiClient, OpenAiClientConfig, OpenAiError};
