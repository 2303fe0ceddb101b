use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    BillingEvent, KnowledgeDocument, Message, Session, Tenant, TenantConfigPatch,
};
use crate::error::Result;

/// Connection-pooled relational store capability (sessions, messages,
/// billing events, knowledge documents, tenants). Pool sizing (20 + 10
/// overflow, pre-ping on checkout) is the adapter's concern;
/// this trait only names the operations the domain needs.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    async fn get_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>>;

    /// Looks a tenant up by the hashed value of an incoming `X-API-Key`
    /// header. Hashing the candidate key is the caller's job; this never
    /// sees or logs the raw key.
    async fn get_tenant_by_api_key_hash(&self, api_key_hash: &str) -> Result<Option<Tenant>>;

    async fn update_tenant_config(&self, tenant_id: Uuid, patch: TenantConfigPatch) -> Result<Tenant>;

    async fn create_session(&self, session: Session) -> Result<Session>;

    async fn get_session(&self, session_id: Uuid) -> Result<Option<Session>>;

    async fn update_session(&self, session: Session) -> Result<Session>;

    /// Sessions with `status=active` and `started_at` older than `idle_before` —
    /// feeds the idle-session sweeper.
    async fn list_stale_active_sessions(
        &self,
        idle_before: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<Session>>;

    async fn insert_message(&self, message: Message) -> Result<Message>;

    /// All messages in a session, ascending by `created_at`.
    async fn list_messages(&self, session_id: Uuid) -> Result<Vec<Message>>;

    /// Count of prior messages with `role=user`, used as `turnCount`
    /// input to retrieval's escalation gate.
    async fn count_user_messages(&self, session_id: Uuid) -> Result<u32>;

    async fn insert_billing_event(&self, event: BillingEvent) -> Result<BillingEvent>;

    async fn create_document(&self, document: KnowledgeDocument) -> Result<KnowledgeDocument>;

    async fn get_document(&self, document_id: Uuid) -> Result<Option<KnowledgeDocument>>;

    async fn update_document(&self, document: KnowledgeDocument) -> Result<KnowledgeDocument>;

    async fn list_documents(&self, tenant_id: Uuid) -> Result<Vec<KnowledgeDocument>>;
}
