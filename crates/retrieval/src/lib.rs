#![deny(unused_must_use)]
//! Hybrid retrieval: dense multi-view search + BM25 fused by
//! Reciprocal Rank Fusion, reranked, scored for confidence, gated for
//! escalation.

pub mod bm25;
pub mod retrieval;

pub use retrieval::{HybridRetriever, RankedResult, RetrievalOptions, RetrievalOutcome};
pub use support_agent_core::cache_keys::bm25_cache_key;
