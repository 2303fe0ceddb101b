//! Qdrant-backed `VectorIndex` adapter. Collection naming
//! `tenant_{tenantId}`, cosine distance, `is_latest_version` and
//! `vector_type` as the two mandatory filter fields on every query.

use async_trait::async_trait;
use qdrant_client::qdrant::{
    Condition, CreateCollection, Distance, Filter, PointId, PointStruct, ScrollPoints, SearchPoints,
    UpsertPointsBuilder, VectorParams, VectorsConfig,
};
use qdrant_client::{Payload, Qdrant};
use uuid::Uuid;

use support_agent_core::domain::Chunk;
use support_agent_core::ports::{ScoredPoint, UpsertPoint, VectorFilter, VectorIndex};
use support_agent_core::{Error, Result};

pub struct QdrantVectorIndex {
    client: Qdrant,
}

impl QdrantVectorIndex {
    pub fn connect(url: &str, api_key: Option<&str>) -> Result<Self> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let client = builder.build().map_err(|err| Error::VectorStoreUnavailable(err.to_string()))?;
        Ok(Self { client })
    }
}

pub fn collection_name(tenant_id: Uuid) -> String {
    format!("tenant_{tenant_id}")
}

fn point_id_to_chunk_id(id: &PointId) -> Option<Uuid> {
    match &id.point_id_options {
        Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(s)) => Uuid::parse_str(s).ok(),
        _ => None,
    }
}

fn chunk_to_payload(chunk: &Chunk) -> Result<Payload> {
    let value = serde_json::to_value(chunk).map_err(|err| Error::Other(anyhow::anyhow!(err)))?;
    Payload::try_from(value).map_err(|err| Error::Other(anyhow::anyhow!("payload conversion failed: {err}")))
}

fn payload_to_chunk(payload: &std::collections::HashMap<String, qdrant_client::qdrant::Value>) -> Option<Chunk> {
    let json = qdrant_client::qdrant::value::json_from_payload_map(payload.clone());
    serde_json::from_value(json).ok()
}

fn filter_to_conditions(filter: &VectorFilter) -> Filter {
    Filter::must([
        Condition::matches("is_latest_version", filter.is_latest_version),
        Condition::matches("vector_type", filter.vector_type.as_str().to_string()),
    ])
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn ensure_collection(&self, tenant_id: Uuid, dimension: usize) -> Result<()> {
        let name = collection_name(tenant_id);
        let exists = self
            .client
            .collection_exists(&name)
            .await
            .map_err(|err| Error::VectorStoreUnavailable(err.to_string()))?;
        if exists {
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollection::builder(&name).vectors_config(VectorsConfig::from(VectorParams {
                    size: dimension as u64,
                    distance: Distance::Cosine.into(),
                    ..Default::default()
                })),
            )
            .await
            .map_err(|err| Error::VectorStoreUnavailable(err.to_string()))?;
        Ok(())
    }

    async fn upsert(&self, tenant_id: Uuid, points: Vec<UpsertPoint>) -> Result<()> {
        let name = collection_name(tenant_id);
        let mut qdrant_points = Vec::with_capacity(points.len());
        for point in points {
            let payload = chunk_to_payload(&point.chunk)?;
            let point_id: PointId = point.chunk.chunk_id.to_string().into();
            qdrant_points.push(PointStruct::new(point_id, point.vector, payload));
        }

        self.client
            .upsert_points(UpsertPointsBuilder::new(name, qdrant_points))
            .await
            .map_err(|err| Error::VectorStoreUnavailable(err.to_string()))?;
        Ok(())
    }

    async fn search(
        &self,
        tenant_id: Uuid,
        query_vector: &[f32],
        filter: &VectorFilter,
        limit: usize,
    ) -> Result<Vec<ScoredPoint>> {
        let name = collection_name(tenant_id);
        let response = self
            .client
            .search_points(SearchPoints {
                collection_name: name,
                vector: query_vector.to_vec(),
                filter: Some(filter_to_conditions(filter)),
                limit: limit as u64,
                with_payload: Some(true.into()),
                ..Default::default()
            })
            .await
            .map_err(|err| Error::VectorStoreUnavailable(err.to_string()))?;

        let mut results = Vec::with_capacity(response.result.len());
        for scored in response.result {
            let Some(chunk) = payload_to_chunk(&scored.payload) else { continue };
            let Some(id) = scored.id.as_ref().and_then(point_id_to_chunk_id) else { continue };
            results.push(ScoredPoint { chunk_id: id, score: scored.score, chunk });
        }
        Ok(results)
    }

    async fn scan(&self, tenant_id: Uuid, filter: &VectorFilter) -> Result<Vec<ScoredPoint>> {
        let name = collection_name(tenant_id);
        let mut all = Vec::new();
        let mut offset = None;

        loop {
            let response = self
                .client
                .scroll(ScrollPoints {
                    collection_name: name.clone(),
                    filter: Some(filter_to_conditions(filter)),
                    with_payload: Some(true.into()),
                    offset: offset.clone(),
                    limit: Some(256),
                    ..Default::default()
                })
                .await
                .map_err(|err| Error::VectorStoreUnavailable(err.to_string()))?;

            for point in &response.result {
                if let (Some(chunk), Some(id)) = (payload_to_chunk(&point.payload), point.id.as_ref().and_then(point_id_to_chunk_id)) {
                    all.push(ScoredPoint { chunk_id: id, score: 0.0, chunk });
                }
            }

            offset = response.next_page_offset;
            if offset.is_none() {
                break;
            }
        }

        Ok(all)
    }

    async fn is_empty(&self, tenant_id: Uuid) -> Result<bool> {
        let name = collection_name(tenant_id);
        if !self.client.collection_exists(&name).await.map_err(|err| Error::VectorStoreUnavailable(err.to_string()))? {
            return Ok(true);
        }
        let info = self
            .client
            .collection_info(&name)
            .await
            .map_err(|err| Error::VectorStoreUnavailable(err.to_string()))?;
        Ok(info.result.map(|r| r.points_count.unwrap_or(0) == 0).unwrap_or(true))
    }

    async fn delete_document(&self, tenant_id: Uuid, document_id: Uuid) -> Result<()> {
        let name = collection_name(tenant_id);
        let filter = Filter::must([Condition::matches("document_id", document_id.to_string())]);
        self.client
            .delete_points(qdrant_client::qdrant::DeletePointsBuilder::new(name).points(filter))
            .await
            .map_err(|err| Error::VectorStoreUnavailable(err.to_string()))?;
        Ok(())
    }
}
