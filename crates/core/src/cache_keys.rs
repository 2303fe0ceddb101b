//! Redis key naming shared across crates that read or write the same
//! cache entries, so ingestion (which invalidates) and retrieval (which
//! reads and rebuilds) can never drift apart on the format.

use uuid::Uuid;

/// Versioned BM25 lexical-index cache blob for a tenant.
pub fn bm25_cache_key(tenant_id: Uuid) -> String {
    format!("bm25_index:{tenant_id}")
}
