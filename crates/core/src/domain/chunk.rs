use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ElementType {
    Title,
    NarrativeText,
    Table,
    ListItem,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorType {
    Raw,
    Summary,
    Hypothetical,
}

impl VectorType {
    pub const ALL: [VectorType; 3] = [VectorType::Raw, VectorType::Summary, VectorType::Hypothetical];

    pub fn as_str(&self) -> &'static str {
        match self {
            VectorType::Raw => "raw",
            VectorType::Summary => "summary",
            VectorType::Hypothetical => "hypothetical",
        }
    }
}

/// Vector-store payload, not a relational row. Each logical chunk
/// produces up to three points sharing `chunk_id` but differing in
/// `vector_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: Uuid,
    pub document_id: Uuid,
    pub tenant_id: Uuid,
    pub filename: String,
    pub document_version: i32,
    pub is_latest_version: bool,
    pub section_heading: Option<String>,
    pub element_type: ElementType,
    pub chunk_text: String,
    pub char_count: i32,
    pub token_count: i32,
    pub summary: String,
    pub hypothetical_questions: Vec<String>,
    pub vector_type: VectorType,
    pub ingested_at: DateTime<Utc>,
}
