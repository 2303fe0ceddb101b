//! Entities shared by every crate.
//!
//! `Chunk` is the odd one out: it is a vector-store payload, not a
//! relational row, so it carries `Serialize`/`Deserialize` but no
//! relational-store mapping of its own.

mod billing_event;
mod chunk;
mod knowledge_document;
mod message;
mod session;
mod tenant;

pub use billing_event::{BillingEvent, BillingEventType};
pub use chunk::{Chunk, ElementType, VectorType};
pub use knowledge_document::{FileType, KnowledgeDocument, KnowledgeDocumentStatus};
pub use message::{IntentType, Message, Role, SourceChunkRef};
pub use session::{Session, SessionStatus};
pub use tenant::{Tenant, TenantConfig, TenantConfigPatch};
