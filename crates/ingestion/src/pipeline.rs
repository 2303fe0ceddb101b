//! Document ingestion pipeline: parse -> chunk -> enrich ->
//! embed -> store, driving the `KnowledgeDocument` status machine.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use support_agent_core::cache_keys::bm25_cache_key;
use support_agent_core::chunker::{chunk_elements, ChunkDraft};
use support_agent_core::domain::{Chunk, FileType, KnowledgeDocument, VectorType};
use support_agent_core::ports::{KeyValueStore, LanguageModel, RelationalStore, UpsertPoint, VectorIndex};
use support_agent_core::tokenizer::Tokenizer;
use support_agent_core::{Error, Result};

use crate::metadata::enrich_chunk;
use crate::parser::DocumentParser;

const ENRICH_CONCURRENCY: usize = 5;
const EMBED_BATCH_SIZE: usize = 100;

pub struct IngestionPipeline {
    parser: Arc<dyn DocumentParser>,
    language_model: Arc<dyn LanguageModel>,
    vector_index: Arc<dyn VectorIndex>,
    relational_store: Arc<dyn RelationalStore>,
    kv_store: Arc<dyn KeyValueStore>,
    tokenizer: Tokenizer,
    embedding_dimension: usize,
}

impl IngestionPipeline {
    pub fn new(
        parser: Arc<dyn DocumentParser>,
        language_model: Arc<dyn LanguageModel>,
        vector_index: Arc<dyn VectorIndex>,
        relational_store: Arc<dyn RelationalStore>,
        kv_store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            parser,
            language_model,
            vector_index,
            relational_store,
            kv_store,
            tokenizer: Tokenizer::new(),
            embedding_dimension: 1536,
        }
    }

    pub fn with_embedding_dimension(mut self, dimension: usize) -> Self {
        self.embedding_dimension = dimension;
        self
    }

    /// Runs the full pipeline for a document that already has a
    /// `processing` row. The HTTP endpoint returns 202 before this is
    /// ever awaited; this is the background task body.
    pub async fn ingest(
        &self,
        document_id: Uuid,
        tenant_id: Uuid,
        filepath: &str,
        filename: &str,
        file_type: FileType,
        version: i32,
    ) -> Result<usize> {
        match self.run(document_id, tenant_id, filepath, file_type, version).await {
            Ok(point_count) => {
                self.finalize(document_id, point_count).await?;
                self.kv_store.delete(&bm25_cache_key(tenant_id)).await?;
                Ok(point_count)
            }
            Err(err) => {
                tracing::error!(document_id = %document_id, filename, error = %err, "ingestion failed");
                // Best-effort status write must itself be guarded: a
                // failure here is logged, not propagated over the
                // original error.
                if let Err(write_err) = self.mark_failed(document_id, &err.to_string()).await {
                    tracing::error!(document_id = %document_id, error = %write_err, "failed to persist failed ingestion status");
                }
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        document_id: Uuid,
        tenant_id: Uuid,
        filepath: &str,
        file_type: FileType,
        version: i32,
    ) -> Result<usize> {
        let document = self
            .relational_store
            .get_document(document_id)
            .await?
            .ok_or(Error::DocumentNotFound(document_id))?;

        let elements = self.parser.parse(filepath, file_type).await?;
        let drafts = chunk_elements(&elements, &self.tokenizer);

        let enriched = self.enrich(&drafts).await;

        self.vector_index.ensure_collection(tenant_id, self.embedding_dimension).await?;

        let chunks = self.build_chunks(document_id, tenant_id, &document.filename, version, drafts, enriched);
        let point_count = chunks.len();
        self.embed_and_store(tenant_id, chunks).await?;

        Ok(point_count)
    }

    async fn enrich(&self, drafts: &[ChunkDraft]) -> Vec<crate::metadata::ChunkMetadata> {
        let semaphore = Arc::new(Semaphore::new(ENRICH_CONCURRENCY));
        stream::iter(drafts.iter().cloned())
            .map(|draft| {
                let semaphore = semaphore.clone();
                let language_model = self.language_model.clone();
                async move {
                    let _permit = semaphore.acquire().await.expect("semaphore not closed");
                    enrich_chunk(&language_model, &draft.text).await
                }
            })
            .buffered(ENRICH_CONCURRENCY)
            .collect()
            .await
    }

    fn build_chunks(
        &self,
        document_id: Uuid,
        tenant_id: Uuid,
        filename: &str,
        version: i32,
        drafts: Vec<ChunkDraft>,
        enriched: Vec<crate::metadata::ChunkMetadata>,
    ) -> Vec<Chunk> {
        let now = Utc::now();
        drafts
            .into_iter()
            .zip(enriched)
            .map(|(draft, meta)| Chunk {
                chunk_id: Uuid::new_v4(),
                document_id,
                tenant_id,
                filename: filename.to_string(),
                document_version: version,
                is_latest_version: true,
                section_heading: draft.section_heading,
                element_type: draft.element_type,
                chunk_text: draft.text,
                char_count: draft.char_count as i32,
                token_count: draft.token_count as i32,
                summary: meta.summary,
                hypothetical_questions: meta.questions,
                vector_type: VectorType::Raw,
                ingested_at: now,
            })
            .collect()
    }

    /// Stage 4: request up to three embeddings per chunk, each a
    /// separate point sharing the payload plus its `vector_type`. The
    /// `raw` embedding is mandatory; losing it skips the whole chunk.
    async fn embed_and_store(&self, tenant_id: Uuid, chunks: Vec<Chunk>) -> Result<()> {
        let mut points = Vec::new();

        for chunk in chunks {
            let raw_vector = match self.language_model.embed(&[chunk.chunk_text.clone()]).await {
                Ok(mut vs) if !vs.is_empty() => vs.remove(0),
                Ok(_) => {
                    tracing::error!(chunk_id = %chunk.chunk_id, "raw embedding returned no vectors, skipping chunk");
                    continue;
                }
                Err(err) => {
                    tracing::error!(chunk_id = %chunk.chunk_id, error = %err, "raw embedding failed, skipping chunk");
                    continue;
                }
            };
            points.push(UpsertPoint { vector: raw_vector, chunk: Chunk { vector_type: VectorType::Raw, ..chunk.clone() } });

            if !chunk.summary.is_empty() {
                match self.language_model.embed(&[chunk.summary.clone()]).await {
                    Ok(mut vs) if !vs.is_empty() => points.push(UpsertPoint {
                        vector: vs.remove(0),
                        chunk: Chunk { vector_type: VectorType::Summary, ..chunk.clone() },
                    }),
                    Ok(_) => {}
                    Err(err) => tracing::warn!(chunk_id = %chunk.chunk_id, error = %err, "summary embedding failed, continuing with fewer vectors"),
                }
            }

            if !chunk.hypothetical_questions.is_empty() {
                let joined = chunk.hypothetical_questions.join(" ");
                match self.language_model.embed(&[joined]).await {
                    Ok(mut vs) if !vs.is_empty() => points.push(UpsertPoint {
                        vector: vs.remove(0),
                        chunk: Chunk { vector_type: VectorType::Hypothetical, ..chunk.clone() },
                    }),
                    Ok(_) => {}
                    Err(err) => tracing::warn!(chunk_id = %chunk.chunk_id, error = %err, "hypothetical embedding failed, continuing with fewer vectors"),
                }
            }
        }

        for batch in points.chunks(EMBED_BATCH_SIZE) {
            self.vector_index.upsert(tenant_id, batch.to_vec()).await?;
        }

        Ok(())
    }

    async fn finalize(&self, document_id: Uuid, point_count: usize) -> Result<()> {
        let mut document = self
            .relational_store
            .get_document(document_id)
            .await?
            .ok_or(Error::DocumentNotFound(document_id))?;
        document.mark_ready(point_count as i32);
        self.relational_store.update_document(document).await?;
        Ok(())
    }

    async fn mark_failed(&self, document_id: Uuid, message: &str) -> Result<()> {
        let mut document: KnowledgeDocument = self
            .relational_store
            .get_document(document_id)
            .await?
            .ok_or(Error::DocumentNotFound(document_id))?;
        document.mark_failed(message);
        self.relational_store.update_document(document).await?;
        Ok(())
    }
}
