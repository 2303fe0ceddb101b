use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Conversational,
    DomainQuery,
    OutOfScope,
}

/// One retrieved chunk attached to an assistant message for citation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceChunkRef {
    pub chunk_id: Uuid,
    pub document: String,
    pub section: Option<String>,
}

/// One user or assistant utterance. Immutable after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub session_id: Uuid,
    pub tenant_id: Uuid,
    pub role: Role,
    pub content: String,
    pub intent_type: Option<IntentType>,
    pub source_chunks: Option<Vec<SourceChunkRef>>,
    pub confidence_score: Option<f64>,
    pub escalation_flag: bool,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub latency_ms: i64,
    pub created_at: DateTime<Utc>,
}

impl Message {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: Uuid,
        tenant_id: Uuid,
        role: Role,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            tenant_id,
            role,
            content: content.into(),
            intent_type: None,
            source_chunks: None,
            confidence_score: None,
            escalation_flag: false,
            input_tokens: 0,
            output_tokens: 0,
            latency_ms: 0,
            created_at: now,
        }
    }
}
