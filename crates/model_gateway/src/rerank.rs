//! External cross-encoder rerank client. Reranking lives outside
//! `rig-core`'s completion/embedding surface, so this is a plain HTTP
//! client against the configured rerank endpoint.

use serde::{Deserialize, Serialize};

use support_agent_core::{Error, Result};

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    documents: &'a [String],
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankResultItem>,
}

#[derive(Deserialize)]
struct RerankResultItem {
    index: usize,
    relevance_score: f32,
}

pub struct RerankClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RerankClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { http_client: reqwest::Client::new(), endpoint: endpoint.into(), api_key: api_key.into() }
    }

    pub async fn rerank(&self, query: &str, candidates: &[String], top_n: usize) -> Result<Vec<(usize, f32)>> {
        let body = RerankRequest { query, documents: candidates, top_n };
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| Error::Other(anyhow::anyhow!("rerank request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(Error::Other(anyhow::anyhow!("rerank service returned status {}", response.status())));
        }

        let parsed: RerankResponse = response
            .json()
            .await
            .map_err(|err| Error::Other(anyhow::anyhow!("rerank response parse failed: {err}")))?;

        Ok(parsed.results.into_iter().map(|r| (r.index, r.relevance_score)).collect())
    }
}
