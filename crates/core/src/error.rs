//! Domain error taxonomy.
//!
//! One `thiserror` enum carries every kind a caller needs to branch on.
//! The gateway crate maps each variant to an HTTP status and an
//! `UPPER_SNAKE` error code; nothing in this crate knows about HTTP.

use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("session {0} not found")]
    InvalidSession(Uuid),

    #[error("session {0} is not active")]
    SessionInactive(Uuid),

    #[error("invalid api key")]
    InvalidApiKey,

    #[error("tenant {0} not found")]
    TenantNotFound(Uuid),

    #[error("tenant {0} is inactive")]
    TenantInactive(Uuid),

    #[error("rate limit exceeded for tenant {0}")]
    RateLimitExceeded(Uuid),

    #[error("ingestion failed: {0}")]
    IngestionFailed(String),

    #[error("escalation failed: {0}")]
    EscalationFailed(String),

    #[error("knowledge base is empty for tenant {0}")]
    KnowledgeBaseEmpty(Uuid),

    #[error("embedding request timed out")]
    EmbeddingTimeout,

    #[error("relational store unavailable: {0}")]
    RelationalStoreUnavailable(String),

    #[error("key-value store unavailable: {0}")]
    KeyValueStoreUnavailable(String),

    #[error("vector store unavailable: {0}")]
    VectorStoreUnavailable(String),

    #[error("invalid file type: {0}")]
    InvalidFileType(String),

    #[error("document {0} not found")]
    DocumentNotFound(Uuid),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Taxonomy kind, independent of the formatted message — used by the
/// gateway to pick an HTTP status and an `UPPER_SNAKE` error code
/// without matching on display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidSession,
    SessionInactive,
    InvalidApiKey,
    TenantNotFound,
    TenantInactive,
    RateLimitExceeded,
    IngestionFailed,
    EscalationFailed,
    KnowledgeBaseEmpty,
    EmbeddingTimeout,
    RelationalStoreUnavailable,
    KeyValueStoreUnavailable,
    VectorStoreUnavailable,
    InvalidFileType,
    DocumentNotFound,
    Unhandled,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidSession(_) => ErrorKind::InvalidSession,
            Error::SessionInactive(_) => ErrorKind::SessionInactive,
            Error::InvalidApiKey => ErrorKind::InvalidApiKey,
            Error::TenantNotFound(_) => ErrorKind::TenantNotFound,
            Error::TenantInactive(_) => ErrorKind::TenantInactive,
            Error::RateLimitExceeded(_) => ErrorKind::RateLimitExceeded,
            Error::IngestionFailed(_) => ErrorKind::IngestionFailed,
            Error::EscalationFailed(_) => ErrorKind::EscalationFailed,
            Error::KnowledgeBaseEmpty(_) => ErrorKind::KnowledgeBaseEmpty,
            Error::EmbeddingTimeout => ErrorKind::EmbeddingTimeout,
            Error::RelationalStoreUnavailable(_) => ErrorKind::RelationalStoreUnavailable,
            Error::KeyValueStoreUnavailable(_) => ErrorKind::KeyValueStoreUnavailable,
            Error::VectorStoreUnavailable(_) => ErrorKind::VectorStoreUnavailable,
            Error::InvalidFileType(_) => ErrorKind::InvalidFileType,
            Error::DocumentNotFound(_) => ErrorKind::DocumentNotFound,
            Error::Other(_) => ErrorKind::Unhandled,
        }
    }

    /// `UPPER_SNAKE` code used in the `{"error":{"code":...}}` envelope.
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::InvalidSession => "INVALID_SESSION",
            ErrorKind::SessionInactive => "SESSION_INACTIVE",
            ErrorKind::InvalidApiKey => "INVALID_API_KEY",
            ErrorKind::TenantNotFound => "TENANT_NOT_FOUND",
            ErrorKind::TenantInactive => "TENANT_INACTIVE",
            ErrorKind::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorKind::IngestionFailed => "INGESTION_FAILED",
            ErrorKind::EscalationFailed => "ESCALATION_FAILED",
            ErrorKind::KnowledgeBaseEmpty => "KNOWLEDGE_BASE_EMPTY",
            ErrorKind::EmbeddingTimeout => "EMBEDDING_TIMEOUT",
            ErrorKind::RelationalStoreUnavailable => "RELATIONAL_STORE_UNAVAILABLE",
            ErrorKind::KeyValueStoreUnavailable => "KEY_VALUE_STORE_UNAVAILABLE",
            ErrorKind::VectorStoreUnavailable => "VECTOR_STORE_UNAVAILABLE",
            ErrorKind::InvalidFileType => "INVALID_FILE_TYPE",
            ErrorKind::DocumentNotFound => "DOCUMENT_NOT_FOUND",
            ErrorKind::Unhandled => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code table.
    pub fn status(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidFileType => 400,
            ErrorKind::InvalidApiKey | ErrorKind::TenantInactive => 401,
            ErrorKind::InvalidSession
            | ErrorKind::TenantNotFound
            | ErrorKind::DocumentNotFound => 404,
            ErrorKind::SessionInactive => 409,
            ErrorKind::RateLimitExceeded => 429,
            ErrorKind::RelationalStoreUnavailable
            | ErrorKind::KeyValueStoreUnavailable
            | ErrorKind::VectorStoreUnavailable => 503,
            ErrorKind::EmbeddingTimeout => 504,
            ErrorKind::IngestionFailed
            | ErrorKind::EscalationFailed
            | ErrorKind::KnowledgeBaseEmpty
            | ErrorKind::Unhandled => 500,
        }
    }
}
