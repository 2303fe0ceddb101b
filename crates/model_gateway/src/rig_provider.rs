//! A single `rig-core` backed provider ("one primary ... and
//! one secondary ... provider"). This is the leaf `LanguageModel`
//! implementation; `CompositeLanguageModel` is what callers actually
//! inject.

use async_trait::async_trait;
use rig::completion::Prompt;
use rig::providers::openai;

use support_agent_core::ports::{ChatRole, GenerateRequest, GenerateResponse, LanguageModel};
use support_agent_core::{Error, Result};

pub struct RigProvider {
    client: openai::Client,
    chat_model: String,
    embedding_model: String,
}

impl RigProvider {
    pub fn new(api_key: &str, base_url: Option<&str>, chat_model: impl Into<String>, embedding_model: impl Into<String>) -> Self {
        let client = match base_url {
            Some(url) => openai::Client::from_url(api_key, url),
            None => openai::Client::new(api_key),
        };
        Self { client, chat_model: chat_model.into(), embedding_model: embedding_model.into() }
    }
}

#[async_trait]
impl LanguageModel for RigProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let agent = self.client.agent(&self.chat_model).temperature(request.temperature as f64).build();

        let system_prompt = request
            .messages
            .iter()
            .find(|m| m.role == ChatRole::System)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let user_prompt = request
            .messages
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .map(|m| m.content.clone())
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = if system_prompt.is_empty() { user_prompt } else { format!("{system_prompt}\n\n{user_prompt}") };

        let text = agent
            .prompt(prompt.as_str())
            .await
            .map_err(|err| Error::Other(anyhow::anyhow!("language model generation failed: {err}")))?;

        Ok(GenerateResponse {
            input_tokens: estimate_tokens(&prompt),
            output_tokens: estimate_tokens(&text),
            text,
        })
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let embedding_model = self.client.embedding_model(&self.embedding_model);
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            let embedding = embedding_model
                .embed_text(text)
                .await
                .map_err(|err| Error::Other(anyhow::anyhow!("embedding failed: {err}")))?;
            vectors.push(embedding.vec.into_iter().map(|v| v as f32).collect());
        }
        Ok(vectors)
    }

    async fn rerank(&self, _query: &str, _candidates: &[String], _top_n: usize) -> Result<Vec<(usize, f32)>> {
        Err(Error::Other(anyhow::anyhow!("rig provider does not implement rerank; use the composite's rerank client")))
    }
}

/// Rough token estimate used only for the `GenerateResponse` counters
/// when the provider doesn't return usage; the tokenizer crate is the
/// source of truth for chunking/budget decisions.
fn estimate_tokens(text: &str) -> u32 {
    (text.split_whitespace().count() as f32 * 1.3).ceil() as u32
}
