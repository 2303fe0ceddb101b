use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Html,
    Txt,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeDocumentStatus {
    Processing,
    Ready,
    Failed,
}

/// A logical unit of the tenant corpus. `status` is a finite state
/// machine: `processing -> ready | failed`; no transitions out of a
/// terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub filename: String,
    pub file_type: FileType,
    pub version: i32,
    pub is_active: bool,
    pub ingested_at: DateTime<Utc>,
    pub chunk_count: Option<i32>,
    pub status: KnowledgeDocumentStatus,
    pub error_message: Option<String>,
}

impl KnowledgeDocument {
    pub fn new(
        tenant_id: Uuid,
        filename: impl Into<String>,
        file_type: FileType,
        version: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            filename: filename.into(),
            file_type,
            version,
            is_active: true,
            ingested_at: now,
            chunk_count: None,
            status: KnowledgeDocumentStatus::Processing,
            error_message: None,
        }
    }

    pub fn mark_ready(&mut self, chunk_count: i32) {
        self.status = KnowledgeDocumentStatus::Ready;
        self.chunk_count = Some(chunk_count);
        self.error_message = None;
    }

    pub fn mark_failed(&mut self, error_message: impl Into<String>) {
        self.status = KnowledgeDocumentStatus::Failed;
        self.error_message = Some(error_message.into());
    }

    /// Soft-delete is idempotent: deleting an already-inactive document
    /// is a no-op success, not an error.
    pub fn soft_delete(&mut self) {
        self.is_active = false;
    }
}
