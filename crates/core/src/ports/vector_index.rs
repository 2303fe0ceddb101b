use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Chunk, VectorType};
use crate::error::Result;

/// The two mandatory filter fields on every query.
#[derive(Debug, Clone)]
pub struct VectorFilter {
    pub is_latest_version: bool,
    pub vector_type: VectorType,
}

impl VectorFilter {
    pub fn latest(vector_type: VectorType) -> Self {
        Self { is_latest_version: true, vector_type }
    }
}

/// One point to upsert: an embedding vector plus the chunk payload it
/// was derived from and the `vector_type` tag that makes it distinct
/// from the chunk's other views.
#[derive(Debug, Clone)]
pub struct UpsertPoint {
    pub vector: Vec<f32>,
    pub chunk: Chunk,
}

#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub chunk_id: Uuid,
    pub score: f32,
    pub chunk: Chunk,
}

/// Per-tenant vector collection, canonical name `tenant_{tenantId}`,
/// cosine distance.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn ensure_collection(&self, tenant_id: Uuid, dimension: usize) -> Result<()>;

    async fn upsert(&self, tenant_id: Uuid, points: Vec<UpsertPoint>) -> Result<()>;

    async fn search(
        &self,
        tenant_id: Uuid,
        query_vector: &[f32],
        filter: &VectorFilter,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>>;

    /// Page through every point matching the filter — used to rebuild
    /// the BM25 lexical index on cache miss.
    async fn scan(&self, tenant_id: Uuid, filter: &VectorFilter) -> Result<Vec<ScoredPoint>>;

    /// Returns true if the tenant's collection has zero points, for the
    /// retrieval fast-exit path.
    async fn is_empty(&self, tenant_id: Uuid) -> Result<bool>;

    /// Async vector purge after a document soft-delete: removes every
    /// point with the given `document_id`.
    async fn delete_document(&self, tenant_id: Uuid, document_id: Uuid) -> Result<()>;
}
