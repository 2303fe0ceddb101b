use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerateRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages, temperature: 0.3, max_tokens: 1000 }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Output token count surfaced alongside generated text so callers can
/// meter without a second tokenizer pass.
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A large language model capability: text generation plus embedding.
///
/// The composite primary/secondary provider (`support_agent_model_gateway`)
/// implements this itself: generation tries primary then falls back to
/// secondary on any error; embedding always routes to secondary.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;

    /// Returns one embedding vector per input text, same order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Cross-encoder rerank: query against each candidate text, returning
    /// up to `top_n` `(original_index, relevance_score)` pairs sorted
    /// descending by score.
    async fn rerank(&self, query: &str, candidates: &[String], top_n: usize) -> Result<Vec<(usize, f32)>>;
}
