//! Hand-rolled BM25 Okapi scoring for the per-tenant lexical index
//!. This is pinned-algorithm logic like RRF and the
//! confidence formula, not an ambient concern, so it is implemented
//! directly rather than pulled from a crate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use support_agent_core::domain::Chunk;

const K1: f64 = 1.5;
const B: f64 = 0.75;

/// Version byte prefixing the serialized cache blob. A mismatched
/// version is treated as a cache miss, never decoded.
pub const CACHE_VERSION: u8 = 1;

#[derive(Serialize, Deserialize)]
struct CachePayload {
    chunk_ids: Vec<Uuid>,
    tokenized_docs: Vec<Vec<String>>,
    payloads: Vec<Chunk>,
}

/// Parallel arrays of chunk-ids / tokenized texts / payloads, the shape
/// named in  Stage B.
pub struct Bm25Index {
    chunk_ids: Vec<Uuid>,
    tokenized_docs: Vec<Vec<String>>,
    payloads: Vec<Chunk>,
    doc_freq: HashMap<String, usize>,
    avg_doc_len: f64,
}

pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase().split_whitespace().map(|s| s.to_string()).collect()
}

impl Bm25Index {
    pub fn build(chunk_ids: Vec<Uuid>, texts: Vec<String>, payloads: Vec<Chunk>) -> Self {
        let tokenized_docs: Vec<Vec<String>> = texts.iter().map(|t| tokenize(t)).collect();
        Self::from_tokenized(chunk_ids, tokenized_docs, payloads)
    }

    fn from_tokenized(chunk_ids: Vec<Uuid>, tokenized_docs: Vec<Vec<String>>, payloads: Vec<Chunk>) -> Self {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut total_len = 0usize;
        for doc in &tokenized_docs {
            total_len += doc.len();
            let mut seen = std::collections::HashSet::new();
            for term in doc {
                if seen.insert(term.clone()) {
                    *doc_freq.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }
        let avg_doc_len = if tokenized_docs.is_empty() {
            0.0
        } else {
            total_len as f64 / tokenized_docs.len() as f64
        };
        Self { chunk_ids, tokenized_docs, payloads, doc_freq, avg_doc_len }
    }

    pub fn is_empty(&self) -> bool {
        self.tokenized_docs.is_empty()
    }

    fn idf(&self, term: &str) -> f64 {
        let n = self.tokenized_docs.len() as f64;
        let df = *self.doc_freq.get(term).unwrap_or(&0) as f64;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    fn score_doc(&self, doc_index: usize, query_terms: &[String]) -> f64 {
        let doc = &self.tokenized_docs[doc_index];
        let doc_len = doc.len() as f64;
        let mut term_freq: HashMap<&str, usize> = HashMap::new();
        for term in doc {
            *term_freq.entry(term.as_str()).or_insert(0) += 1;
        }

        query_terms
            .iter()
            .map(|term| {
                let tf = *term_freq.get(term.as_str()).unwrap_or(&0) as f64;
                if tf == 0.0 {
                    return 0.0;
                }
                let idf = self.idf(term);
                idf * (tf * (K1 + 1.0)) / (tf + K1 * (1.0 - B + B * (doc_len / self.avg_doc_len.max(1.0))))
            })
            .sum()
    }

    /// Scores the query against every document, sorts descending,
    /// keeps positive-scoring entries only.
    pub fn search(&self, query: &str, limit: usize) -> Vec<(Uuid, f64, Chunk)> {
        if self.is_empty() {
            return Vec::new();
        }
        let query_terms = tokenize(query);
        let mut scored: Vec<(usize, f64)> = (0..self.tokenized_docs.len())
            .map(|i| (i, self.score_doc(i, &query_terms)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(limit)
            .map(|(i, score)| (self.chunk_ids[i], score, self.payloads[i].clone()))
            .collect()
    }

    pub fn serialize(&self) -> Vec<u8> {
        let payload = CachePayload {
            chunk_ids: self.chunk_ids.clone(),
            tokenized_docs: self.tokenized_docs.clone(),
            payloads: self.payloads.clone(),
        };
        let json = serde_json::to_vec(&payload).unwrap_or_default();
        let mut blob = Vec::with_capacity(json.len() + 1);
        blob.push(CACHE_VERSION);
        blob.extend(json);
        blob
    }

    /// Refuses to decode a mismatched version byte by treating it as a
    /// cache miss rather than erroring.
    pub fn deserialize(blob: &[u8]) -> Option<Self> {
        let (version, rest) = blob.split_first()?;
        if *version != CACHE_VERSION {
            return None;
        }
        let payload: CachePayload = serde_json::from_slice(rest).ok()?;
        Some(Self::from_tokenized(payload.chunk_ids, payload.tokenized_docs, payload.payloads))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use support_agent_core::domain::{ElementType, VectorType};

    fn chunk(text: &str) -> Chunk {
        Chunk {
            chunk_id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            filename: "f.txt".to_string(),
            document_version: 1,
            is_latest_version: true,
            section_heading: None,
            element_type: ElementType::NarrativeText,
            chunk_text: text.to_string(),
            char_count: text.len() as i32,
            token_count: 10,
            summary: String::new(),
            hypothetical_questions: vec![],
            vector_type: VectorType::Raw,
            ingested_at: Utc::now(),
        }
    }

    #[test]
    fn matching_term_scores_above_zero_and_ranks_first() {
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        let texts = vec!["refund policy for returns".to_string(), "shipping times overview".to_string()];
        let payloads = vec![chunk(&texts[0]), chunk(&texts[1])];
        let index = Bm25Index::build(ids.clone(), texts, payloads);
        let results = index.search("refund policy", 10);
        assert_eq!(results[0].0, ids[0]);
    }

    #[test]
    fn empty_corpus_returns_empty() {
        let index = Bm25Index::build(vec![], vec![], vec![]);
        assert!(index.search("anything", 10).is_empty());
    }

    #[test]
    fn round_trip_through_serialization_preserves_results() {
        let ids = vec![Uuid::new_v4()];
        let texts = vec!["warranty claims process".to_string()];
        let payloads = vec![chunk(&texts[0])];
        let index = Bm25Index::build(ids.clone(), texts, payloads);
        let blob = index.serialize();
        let restored = Bm25Index::deserialize(&blob).unwrap();
        assert_eq!(restored.search("warranty", 10)[0].0, ids[0]);
    }

    #[test]
    fn mismatched_version_byte_is_treated_as_cache_miss() {
        let mut blob = vec![CACHE_VERSION + 1];
        blob.extend(b"{}".to_vec());
        assert!(Bm25Index::deserialize(&blob).is_none());
    }
}
