//! Postgres-backed `RelationalStore` adapter (sessions, messages,
//! billing events, knowledge documents, tenants). Pool sizing (20 + 10
//! overflow, pre-ping on checkout) lives in `PgPoolOptions`
//! at construction time. Table DDL is recorded in DESIGN.md; migration
//! tooling itself is out of scope and not executed by this crate.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use support_agent_core::domain::{
    BillingEvent, BillingEventType, FileType, KnowledgeDocument, KnowledgeDocumentStatus, Message,
    Role, Session, SessionStatus, Tenant, TenantConfig, TenantConfigPatch,
};
use support_agent_core::ports::RelationalStore;
use support_agent_core::{Error, Result};

pub struct PostgresRelationalStore {
    pool: PgPool,
}

impl PostgresRelationalStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(0)
            .test_before_acquire(true)
            .connect(database_url)
            .await
            .map_err(|err| Error::RelationalStoreUnavailable(err.to_string()))?;
        Ok(Self { pool })
    }
}

fn map_sqlx_err(err: sqlx::Error) -> Error {
    Error::RelationalStoreUnavailable(err.to_string())
}

fn session_status_str(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Active => "active",
        SessionStatus::Resolved => "resolved",
        SessionStatus::Escalated => "escalated",
    }
}

fn parse_session_status(s: &str) -> SessionStatus {
    match s {
        "resolved" => SessionStatus::Resolved,
        "escalated" => SessionStatus::Escalated,
        _ => SessionStatus::Active,
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}

fn parse_role(s: &str) -> Role {
    match s {
        "assistant" => Role::Assistant,
        "system" => Role::System,
        _ => Role::User,
    }
}

fn billing_event_type_str(event_type: BillingEventType) -> &'static str {
    match event_type {
        BillingEventType::Resolved => "resolved",
        BillingEventType::Escalated => "escalated",
        BillingEventType::Timeout => "timeout",
        BillingEventType::EscalationWebhookFailed => "escalation_webhook_failed",
    }
}

fn parse_billing_event_type(s: &str) -> BillingEventType {
    match s {
        "escalated" => BillingEventType::Escalated,
        "timeout" => BillingEventType::Timeout,
        "escalation_webhook_failed" => BillingEventType::EscalationWebhookFailed,
        _ => BillingEventType::Resolved,
    }
}

fn file_type_str(file_type: FileType) -> &'static str {
    match file_type {
        FileType::Pdf => "pdf",
        FileType::Docx => "docx",
        FileType::Html => "html",
        FileType::Txt => "txt",
        FileType::Csv => "csv",
    }
}

fn parse_file_type(s: &str) -> FileType {
    match s {
        "docx" => FileType::Docx,
        "html" => FileType::Html,
        "txt" => FileType::Txt,
        "csv" => FileType::Csv,
        _ => FileType::Pdf,
    }
}

fn document_status_str(status: KnowledgeDocumentStatus) -> &'static str {
    match status {
        KnowledgeDocumentStatus::Processing => "processing",
        KnowledgeDocumentStatus::Ready => "ready",
        KnowledgeDocumentStatus::Failed => "failed",
    }
}

fn parse_document_status(s: &str) -> KnowledgeDocumentStatus {
    match s {
        "ready" => KnowledgeDocumentStatus::Ready,
        "failed" => KnowledgeDocumentStatus::Failed,
        _ => KnowledgeDocumentStatus::Processing,
    }
}

#[async_trait::async_trait]
impl RelationalStore for PostgresRelationalStore {
    async fn get_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>> {
        let row = sqlx::query(
            "SELECT id, display_name, api_key_hash, vertical, config, active FROM tenants WHERE id = $1",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let Some(row) = row else { return Ok(None) };
        let config_json: Value = row.try_get("config").map_err(map_sqlx_err)?;
        let config: TenantConfig = serde_json::from_value(config_json).unwrap_or_default();
        Ok(Some(Tenant {
            id: row.try_get("id").map_err(map_sqlx_err)?,
            display_name: row.try_get("display_name").map_err(map_sqlx_err)?,
            api_key_hash: row.try_get("api_key_hash").map_err(map_sqlx_err)?,
            vertical: row.try_get("vertical").map_err(map_sqlx_err)?,
            config,
            active: row.try_get("active").map_err(map_sqlx_err)?,
        }))
    }

    async fn get_tenant_by_api_key_hash(&self, api_key_hash: &str) -> Result<Option<Tenant>> {
        let row = sqlx::query(
            "SELECT id, display_name, api_key_hash, vertical, config, active FROM tenants WHERE api_key_hash = $1",
        )
        .bind(api_key_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let Some(row) = row else { return Ok(None) };
        let config_json: Value = row.try_get("config").map_err(map_sqlx_err)?;
        let config: TenantConfig = serde_json::from_value(config_json).unwrap_or_default();
        Ok(Some(Tenant {
            id: row.try_get("id").map_err(map_sqlx_err)?,
            display_name: row.try_get("display_name").map_err(map_sqlx_err)?,
            api_key_hash: row.try_get("api_key_hash").map_err(map_sqlx_err)?,
            vertical: row.try_get("vertical").map_err(map_sqlx_err)?,
            config,
            active: row.try_get("active").map_err(map_sqlx_err)?,
        }))
    }

    async fn update_tenant_config(&self, tenant_id: Uuid, patch: TenantConfigPatch) -> Result<Tenant> {
        let mut tenant = self.get_tenant(tenant_id).await?.ok_or(Error::TenantNotFound(tenant_id))?;
        tenant.config.merge(patch);
        let config_json = serde_json::to_value(&tenant.config).map_err(|err| Error::Other(anyhow::anyhow!(err)))?;
        sqlx::query("UPDATE tenants SET config = $1 WHERE id = $2")
            .bind(config_json)
            .bind(tenant_id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(tenant)
    }

    async fn create_session(&self, session: Session) -> Result<Session> {
        sqlx::query(
            "INSERT INTO sessions (id, tenant_id, external_user_id, started_at, ended_at, status, escalation_reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(session.id)
        .bind(session.tenant_id)
        .bind(&session.external_user_id)
        .bind(session.started_at)
        .bind(session.ended_at)
        .bind(session_status_str(session.status))
        .bind(&session.escalation_reason)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(session)
    }

    async fn get_session(&self, session_id: Uuid) -> Result<Option<Session>> {
        let row = sqlx::query(
            "SELECT id, tenant_id, external_user_id, started_at, ended_at, status, escalation_reason \
             FROM sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let Some(row) = row else { return Ok(None) };
        let status_str: String = row.try_get("status").map_err(map_sqlx_err)?;
        Ok(Some(Session {
            id: row.try_get("id").map_err(map_sqlx_err)?,
            tenant_id: row.try_get("tenant_id").map_err(map_sqlx_err)?,
            external_user_id: row.try_get("external_user_id").map_err(map_sqlx_err)?,
            started_at: row.try_get("started_at").map_err(map_sqlx_err)?,
            ended_at: row.try_get("ended_at").map_err(map_sqlx_err)?,
            status: parse_session_status(&status_str),
            escalation_reason: row.try_get("escalation_reason").map_err(map_sqlx_err)?,
        }))
    }

    async fn update_session(&self, session: Session) -> Result<Session> {
        sqlx::query(
            "UPDATE sessions SET ended_at = $1, status = $2, escalation_reason = $3 WHERE id = $4",
        )
        .bind(session.ended_at)
        .bind(session_status_str(session.status))
        .bind(&session.escalation_reason)
        .bind(session.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(session)
    }

    async fn list_stale_active_sessions(&self, idle_before: DateTime<Utc>) -> Result<Vec<Session>> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, external_user_id, started_at, ended_at, status, escalation_reason \
             FROM sessions WHERE status = 'active' AND started_at < $1",
        )
        .bind(idle_before)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        rows.into_iter()
            .map(|row| {
                let status_str: String = row.try_get("status").map_err(map_sqlx_err)?;
                Ok(Session {
                    id: row.try_get("id").map_err(map_sqlx_err)?,
                    tenant_id: row.try_get("tenant_id").map_err(map_sqlx_err)?,
                    external_user_id: row.try_get("external_user_id").map_err(map_sqlx_err)?,
                    started_at: row.try_get("started_at").map_err(map_sqlx_err)?,
                    ended_at: row.try_get("ended_at").map_err(map_sqlx_err)?,
                    status: parse_session_status(&status_str),
                    escalation_reason: row.try_get("escalation_reason").map_err(map_sqlx_err)?,
                })
            })
            .collect()
    }

    async fn insert_message(&self, message: Message) -> Result<Message> {
        let source_chunks_json = message
            .source_chunks
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|err| Error::Other(anyhow::anyhow!(err)))?;
        let intent_type_str = message.intent_type.map(|intent| {
            serde_json::to_value(intent).ok().and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default()
        });

        sqlx::query(
            "INSERT INTO messages (id, session_id, tenant_id, role, content, intent_type, source_chunks, \
             confidence_score, escalation_flag, input_tokens, output_tokens, latency_ms, created_at) \
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)",
        )
        .bind(message.id)
        .bind(message.session_id)
        .bind(message.tenant_id)
        .bind(role_str(message.role))
        .bind(&message.content)
        .bind(intent_type_str)
        .bind(source_chunks_json)
        .bind(message.confidence_score)
        .bind(message.escalation_flag)
        .bind(message.input_tokens)
        .bind(message.output_tokens)
        .bind(message.latency_ms)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(message)
    }

    async fn list_messages(&self, session_id: Uuid) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT id, session_id, tenant_id, role, content, intent_type, source_chunks, confidence_score, \
             escalation_flag, input_tokens, output_tokens, latency_ms, created_at \
             FROM messages WHERE session_id = $1 ORDER BY created_at ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        rows.into_iter()
            .map(|row| {
                let role_s: String = row.try_get("role").map_err(map_sqlx_err)?;
                let intent_s: Option<String> = row.try_get("intent_type").map_err(map_sqlx_err)?;
                let source_chunks_json: Option<Value> = row.try_get("source_chunks").map_err(map_sqlx_err)?;
                Ok(Message {
                    id: row.try_get("id").map_err(map_sqlx_err)?,
                    session_id: row.try_get("session_id").map_err(map_sqlx_err)?,
                    tenant_id: row.try_get("tenant_id").map_err(map_sqlx_err)?,
                    role: parse_role(&role_s),
                    content: row.try_get("content").map_err(map_sqlx_err)?,
                    intent_type: intent_s.and_then(|s| serde_json::from_value(Value::String(s)).ok()),
                    source_chunks: source_chunks_json.and_then(|v| serde_json::from_value(v).ok()),
                    confidence_score: row.try_get("confidence_score").map_err(map_sqlx_err)?,
                    escalation_flag: row.try_get("escalation_flag").map_err(map_sqlx_err)?,
                    input_tokens: row.try_get("input_tokens").map_err(map_sqlx_err)?,
                    output_tokens: row.try_get("output_tokens").map_err(map_sqlx_err)?,
                    latency_ms: row.try_get("latency_ms").map_err(map_sqlx_err)?,
                    created_at: row.try_get("created_at").map_err(map_sqlx_err)?,
                })
            })
            .collect()
    }

    async fn count_user_messages(&self, session_id: Uuid) -> Result<u32> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM messages WHERE session_id = $1 AND role = 'user'")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        let count: i64 = row.try_get("count").map_err(map_sqlx_err)?;
        Ok(count as u32)
    }

    async fn insert_billing_event(&self, event: BillingEvent) -> Result<BillingEvent> {
        sqlx::query(
            "INSERT INTO billing_events (id, tenant_id, session_id, event_type, total_input_tokens, \
             total_output_tokens, total_messages, billed_at) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)",
        )
        .bind(event.id)
        .bind(event.tenant_id)
        .bind(event.session_id)
        .bind(billing_event_type_str(event.event_type))
        .bind(event.total_input_tokens)
        .bind(event.total_output_tokens)
        .bind(event.total_messages)
        .bind(event.billed_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(event)
    }

    async fn create_document(&self, document: KnowledgeDocument) -> Result<KnowledgeDocument> {
        sqlx::query(
            "INSERT INTO knowledge_documents (id, tenant_id, filename, file_type, version, is_active, \
             ingested_at, chunk_count, status, error_message) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)",
        )
        .bind(document.id)
        .bind(document.tenant_id)
        .bind(&document.filename)
        .bind(file_type_str(document.file_type))
        .bind(document.version)
        .bind(document.is_active)
        .bind(document.ingested_at)
        .bind(document.chunk_count)
        .bind(document_status_str(document.status))
        .bind(&document.error_message)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(document)
    }

    async fn get_document(&self, document_id: Uuid) -> Result<Option<KnowledgeDocument>> {
        let row = sqlx::query(
            "SELECT id, tenant_id, filename, file_type, version, is_active, ingested_at, chunk_count, \
             status, error_message FROM knowledge_documents WHERE id = $1",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let Some(row) = row else { return Ok(None) };
        Ok(Some(row_to_document(&row)?))
    }

    async fn update_document(&self, document: KnowledgeDocument) -> Result<KnowledgeDocument> {
        sqlx::query(
            "UPDATE knowledge_documents SET is_active = $1, chunk_count = $2, status = $3, error_message = $4 \
             WHERE id = $5",
        )
        .bind(document.is_active)
        .bind(document.chunk_count)
        .bind(document_status_str(document.status))
        .bind(&document.error_message)
        .bind(document.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(document)
    }

    async fn list_documents(&self, tenant_id: Uuid) -> Result<Vec<KnowledgeDocument>> {
        let rows = sqlx::query(
            "SELECT id, tenant_id, filename, file_type, version, is_active, ingested_at, chunk_count, \
             status, error_message FROM knowledge_documents WHERE tenant_id = $1 ORDER BY ingested_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        rows.iter().map(row_to_document).collect()
    }
}

fn row_to_document(row: &sqlx::postgres::PgRow) -> Result<KnowledgeDocument> {
    let file_type_s: String = row.try_get("file_type").map_err(map_sqlx_err)?;
    let status_s: String = row.try_get("status").map_err(map_sqlx_err)?;
    Ok(KnowledgeDocument {
        id: row.try_get("id").map_err(map_sqlx_err)?,
        tenant_id: row.try_get("tenant_id").map_err(map_sqlx_err)?,
        filename: row.try_get("filename").map_err(map_sqlx_err)?,
        file_type: parse_file_type(&file_type_s),
        version: row.try_get("version").map_err(map_sqlx_err)?,
        is_active: row.try_get("is_active").map_err(map_sqlx_err)?,
        ingested_at: row.try_get("ingested_at").map_err(map_sqlx_err)?,
        chunk_count: row.try_get("chunk_count").map_err(map_sqlx_err)?,
        status: parse_document_status(&status_s),
        error_message: row.try_get("error_message").map_err(map_sqlx_err)?,
    })
}
