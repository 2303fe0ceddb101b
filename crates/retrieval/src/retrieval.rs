//! Hybrid retrieval pipeline. Never fails: every downstream
//! error degrades gracefully rather than propagating.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use support_agent_core::cache_keys::bm25_cache_key;
use support_agent_core::confidence::{compute_confidence, should_escalate, RankedRelevance};
use support_agent_core::domain::{Chunk, VectorType};
use support_agent_core::ports::{KeyValueStore, LanguageModel, VectorFilter, VectorIndex};
use support_agent_core::rrf::{reciprocal_rank_fusion, RRF_K};

use crate::bm25::Bm25Index;

pub const DENSE_SEARCH_LIMIT: usize = 20;
pub const RRF_TOP_N: usize = 40;
pub const RERANK_TOP_N: usize = 8;
pub const BM25_CACHE_TTL: Duration = Duration::from_secs(3600);
pub const RERANK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct RankedResult {
    pub chunk_id: Uuid,
    pub text: String,
    pub payload: Chunk,
    pub relevance_score: f32,
    pub rank: usize,
}

#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub results: Vec<RankedResult>,
    pub confidence: f64,
    pub should_escalate: bool,
    pub escalation_reason: Option<&'static str>,
    pub latency_ms: u64,
}

pub struct RetrievalOptions {
    pub escalation_threshold: f64,
    pub max_turns: u32,
    pub turn_count: u32,
}

pub struct HybridRetriever {
    language_model: Arc<dyn LanguageModel>,
    vector_index: Arc<dyn VectorIndex>,
    kv_store: Arc<dyn KeyValueStore>,
}

impl HybridRetriever {
    pub fn new(
        language_model: Arc<dyn LanguageModel>,
        vector_index: Arc<dyn VectorIndex>,
        kv_store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self { language_model, vector_index, kv_store }
    }

    pub async fn retrieve(&self, query: &str, tenant_id: Uuid, options: RetrievalOptions) -> RetrievalOutcome {
        let started = Instant::now();

        match self.vector_index.is_empty(tenant_id).await {
            Ok(true) => {
                return RetrievalOutcome {
                    results: Vec::new(),
                    confidence: 0.0,
                    should_escalate: false,
                    escalation_reason: None,
                    latency_ms: started.elapsed().as_millis() as u64,
                };
            }
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(tenant_id = %tenant_id, error = %err, "failed to check collection emptiness, proceeding");
            }
        }

        let (dense, sparse) = tokio::join!(
            self.dense_search(query, tenant_id),
            self.sparse_search(query, tenant_id),
        );

        let fused = self.fuse(dense, sparse);
        let ranked = self.rerank(query, fused).await;

        let relevances: Vec<RankedRelevance> =
            ranked.iter().map(|r| RankedRelevance { relevance_score: r.relevance_score }).collect();
        let confidence = compute_confidence(&relevances);
        let reason = should_escalate(confidence, options.turn_count, options.max_turns, options.escalation_threshold);

        RetrievalOutcome {
            results: ranked,
            confidence,
            should_escalate: reason.is_some(),
            escalation_reason: reason,
            latency_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Stage A: one dense search per vector-type, merged by chunk-id
    /// keeping the maximum score seen for each chunk.
    async fn dense_search(&self, query: &str, tenant_id: Uuid) -> Vec<(Uuid, f32, Chunk)> {
        let query_vector = match self.language_model.embed(&[query.to_string()]).await {
            Ok(mut vs) if !vs.is_empty() => vs.remove(0),
            Ok(_) => {
                tracing::warn!(tenant_id = %tenant_id, "query embedding returned no vector");
                return Vec::new();
            }
            Err(err) => {
                tracing::warn!(tenant_id = %tenant_id, error = %err, "query embedding failed, dense search degraded to empty");
                return Vec::new();
            }
        };

        let searches = VectorType::ALL.iter().map(|vt| {
            let filter = VectorFilter::latest(*vt);
            let vector_index = self.vector_index.clone();
            let query_vector = query_vector.clone();
            async move { vector_index.search(tenant_id, &query_vector, &filter, DENSE_SEARCH_LIMIT).await }
        });

        let results = futures::future::join_all(searches).await;

        let mut best: HashMap<Uuid, (f32, Chunk)> = HashMap::new();
        for result in results {
            match result {
                Ok(points) => {
                    for point in points {
                        best.entry(point.chunk_id)
                            .and_modify(|(score, chunk)| {
                                if point.score > *score {
                                    *score = point.score;
                                    *chunk = point.chunk.clone();
                                }
                            })
                            .or_insert((point.score, point.chunk));
                    }
                }
                Err(err) => tracing::warn!(tenant_id = %tenant_id, error = %err, "dense search view failed, continuing with other views"),
            }
        }

        let mut merged: Vec<(Uuid, f32, Chunk)> = best.into_iter().map(|(id, (score, chunk))| (id, score, chunk)).collect();
        merged.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        merged
    }

    /// Stage B: BM25 via the per-tenant lexical-index cache, rebuilding
    /// on miss or on deserialization failure.
    async fn sparse_search(&self, query: &str, tenant_id: Uuid) -> Vec<(Uuid, f64, Chunk)> {
        let cache_key = bm25_cache_key(tenant_id);

        let cached = match self.kv_store.get(&cache_key).await {
            Ok(Some(bytes)) => Bm25Index::deserialize(&bytes),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(tenant_id = %tenant_id, error = %err, "bm25 cache lookup failed");
                None
            }
        };

        let index = match cached {
            Some(index) => index,
            None => match self.rebuild_bm25_index(tenant_id).await {
                Some(index) => index,
                None => return Vec::new(),
            },
        };

        if index.is_empty() {
            return Vec::new();
        }

        index.search(query, 20)
    }

    async fn rebuild_bm25_index(&self, tenant_id: Uuid) -> Option<Bm25Index> {
        let filter = VectorFilter::latest(VectorType::Raw);
        let points = match self.vector_index.scan(tenant_id, &filter).await {
            Ok(points) => points,
            Err(err) => {
                tracing::warn!(tenant_id = %tenant_id, error = %err, "bm25 corpus scan failed, sparse search degraded to empty");
                return None;
            }
        };
        if points.is_empty() {
            return None;
        }

        let mut chunk_ids = Vec::with_capacity(points.len());
        let mut texts = Vec::with_capacity(points.len());
        let mut payloads = Vec::with_capacity(points.len());
        for point in points {
            chunk_ids.push(point.chunk_id);
            texts.push(point.chunk.chunk_text.clone());
            payloads.push(point.chunk);
        }

        let index = Bm25Index::build(chunk_ids, texts, payloads);
        let blob = index.serialize();
        if let Err(err) = self.kv_store.set(&bm25_cache_key(tenant_id), blob, BM25_CACHE_TTL).await {
            tracing::warn!(tenant_id = %tenant_id, error = %err, "failed to persist rebuilt bm25 cache, continuing uncached");
        }
        Some(index)
    }

    /// Stage C: RRF over dense + sparse rank lists, keeping the top 40
    /// with the fuller payload/text preserved where both lists agree.
    fn fuse(
        &self,
        dense: Vec<(Uuid, f32, Chunk)>,
        sparse: Vec<(Uuid, f64, Chunk)>,
    ) -> Vec<(Uuid, String, Chunk, f32)> {
        let mut payloads: HashMap<Uuid, (String, Chunk)> = HashMap::new();
        let mut dense_scores: HashMap<Uuid, f32> = HashMap::new();
        let dense_ids: Vec<Uuid> = dense
            .into_iter()
            .map(|(id, score, chunk)| {
                payloads.entry(id).or_insert_with(|| (chunk.chunk_text.clone(), chunk));
                dense_scores.insert(id, score);
                id
            })
            .collect();
        let sparse_ids: Vec<Uuid> = sparse
            .into_iter()
            .map(|(id, _, chunk)| {
                payloads.entry(id).or_insert_with(|| (chunk.chunk_text.clone(), chunk));
                id
            })
            .collect();

        let fused = reciprocal_rank_fusion(&[dense_ids, sparse_ids], RRF_K);
        fused
            .into_iter()
            .take(RRF_TOP_N)
            .filter_map(|(id, _score)| {
                payloads.get(&id).map(|(text, chunk)| {
                    let dense_score = dense_scores.get(&id).copied().unwrap_or(0.0).max(0.0);
                    (id, text.clone(), chunk.clone(), dense_score)
                })
            })
            .collect()
    }

    /// Stage D: cross-encoder rerank with a 10s timeout, falling back
    /// to the first 8 RRF candidates (dense score clamped >= 0) on any
    /// error or timeout.
    async fn rerank(&self, query: &str, candidates: Vec<(Uuid, String, Chunk, f32)>) -> Vec<RankedResult> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let texts: Vec<String> = candidates.iter().map(|(_, text, _, _)| text.clone()).collect();
        let call = self.language_model.rerank(query, &texts, RERANK_TOP_N);

        match tokio::time::timeout(RERANK_TIMEOUT, call).await {
            Ok(Ok(ranked)) => ranked
                .into_iter()
                .enumerate()
                .map(|(rank, (index, score))| {
                    let (chunk_id, text, payload, _) = candidates[index].clone();
                    RankedResult { chunk_id, text, payload, relevance_score: score, rank }
                })
                .collect(),
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "rerank call failed, falling back to rrf ranking");
                self.fallback_ranking(candidates)
            }
            Err(_) => {
                tracing::warn!("rerank call timed out, falling back to rrf ranking");
                self.fallback_ranking(candidates)
            }
        }
    }

    /// On rerank failure, falls back to the first 8 RRF candidates
    /// using each one's dense score (already clamped to >= 0 in
    /// `fuse`) as its relevance score.
    fn fallback_ranking(&self, candidates: Vec<(Uuid, String, Chunk, f32)>) -> Vec<RankedResult> {
        candidates
            .into_iter()
            .take(RERANK_TOP_N)
            .enumerate()
            .map(|(rank, (chunk_id, text, payload, dense_score))| RankedResult {
                chunk_id,
                text,
                payload,
                relevance_score: dense_score,
                rank,
            })
            .collect()
    }
}
