//! The composite `LanguageModel`: generation tries primary, falls back
//! to secondary on any error; embedding always routes to secondary;
//! rerank delegates to the external cross-encoder client.

use std::sync::Arc;

use async_trait::async_trait;

use support_agent_core::ports::{GenerateRequest, GenerateResponse, LanguageModel};
use support_agent_core::Result;

use crate::rerank::RerankClient;

pub struct CompositeLanguageModel {
    primary: Arc<dyn LanguageModel>,
    secondary: Arc<dyn LanguageModel>,
    rerank_client: RerankClient,
}

impl CompositeLanguageModel {
    pub fn new(primary: Arc<dyn LanguageModel>, secondary: Arc<dyn LanguageModel>, rerank_client: RerankClient) -> Self {
        Self { primary, secondary, rerank_client }
    }
}

#[async_trait]
impl LanguageModel for CompositeLanguageModel {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        match self.primary.generate(request.clone()).await {
            Ok(response) => Ok(response),
            Err(err) => {
                tracing::warn!(error = %err, "primary provider failed, falling back to secondary");
                self.secondary.generate(request).await
            }
        }
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.secondary.embed(texts).await
    }

    async fn rerank(&self, query: &str, candidates: &[String], top_n: usize) -> Result<Vec<(usize, f32)>> {
        self.rerank_client.rerank(query, candidates, top_n).await
    }
}
