#![deny(unused_must_use)]
//! Escalation: strict ordering for the hot-path sequence, a detached
//! retrying webhook dispatch, and the compensating billing record on
//! exhaustion.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use support_agent_core::domain::{BillingEvent, BillingEventType, Message, Role};
use support_agent_core::ports::RelationalStore;
use support_agent_core::Result;
use support_agent_lifecycle::MeteringService;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_BACKOFFS: [Duration; 3] = [Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)];

#[derive(Debug, Serialize)]
pub struct EscalationPayload {
    pub event: &'static str,
    pub session_id: Uuid,
    pub tenant_id: Uuid,
    pub external_user_id: Option<String>,
    pub escalation_reason: String,
    pub transcript: Vec<TranscriptEntry>,
    pub last_user_message: String,
    pub escalated_at: String,
}

#[derive(Debug, Serialize)]
pub struct TranscriptEntry {
    pub role: String,
    pub content: String,
    pub timestamp: String,
}

fn to_transcript(messages: &[Message]) -> Vec<TranscriptEntry> {
    messages
        .iter()
        .map(|m| TranscriptEntry {
            role: match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::System => "system",
            }
            .to_string(),
            content: m.content.clone(),
            timestamp: m.created_at.to_rfc3339(),
        })
        .collect()
}

pub struct EscalationService {
    relational_store: Arc<dyn RelationalStore>,
    kv_store: Arc<dyn support_agent_core::ports::KeyValueStore>,
    metering: Arc<MeteringService>,
    http_client: reqwest::Client,
}

impl EscalationService {
    pub fn new(
        relational_store: Arc<dyn RelationalStore>,
        kv_store: Arc<dyn support_agent_core::ports::KeyValueStore>,
        metering: Arc<MeteringService>,
    ) -> Self {
        Self { relational_store, kv_store, metering, http_client: reqwest::Client::new() }
    }

    /// The strictly ordered hot-path sequence: load transcript -> update
    /// session -> close the billing counters -> enqueue detached webhook
    /// retry -> clear memory. Escalation itself must complete even if
    /// the detached task later crashes, so the webhook is never awaited
    /// here.
    #[allow(clippy::too_many_arguments)]
    pub async fn escalate(
        &self,
        session_id: Uuid,
        tenant_id: Uuid,
        reason: &str,
        last_user_message: &str,
        webhook_url: Option<String>,
        external_user_id: Option<String>,
    ) -> Result<()> {
        let transcript = self.relational_store.list_messages(session_id).await?;

        let mut session = self
            .relational_store
            .get_session(session_id)
            .await?
            .ok_or(support_agent_core::Error::InvalidSession(session_id))?;
        session.escalate(reason, Utc::now());
        self.relational_store.update_session(session).await?;

        self.metering.close_session(session_id, tenant_id, BillingEventType::Escalated).await?;

        if let Some(url) = webhook_url {
            let payload = EscalationPayload {
                event: "escalation",
                session_id,
                tenant_id,
                external_user_id,
                escalation_reason: reason.to_string(),
                transcript: to_transcript(&transcript),
                last_user_message: last_user_message.to_string(),
                escalated_at: Utc::now().to_rfc3339(),
            };
            self.spawn_webhook_retry(url, payload);
        }

        self.kv_store.delete(&format!("memory:{session_id}")).await?;

        Ok(())
    }

    /// Detached background task: not tied to the request's lifetime.
    /// Any error in the task body is logged and swallowed — it must
    /// never reach the event loop as a panic or unhandled rejection.
    fn spawn_webhook_retry(&self, url: String, payload: EscalationPayload) {
        let http_client = self.http_client.clone();
        let relational_store = self.relational_store.clone();
        tokio::spawn(async move {
            if let Err(err) = deliver_with_retry(&http_client, &url, &payload).await {
                tracing::error!(session_id = %payload.session_id, error = %err, "escalation webhook exhausted retries");
                let event = BillingEvent::webhook_failed(payload.tenant_id, payload.session_id, Utc::now());
                if let Err(insert_err) = relational_store.insert_billing_event(event).await {
                    tracing::error!(session_id = %payload.session_id, error = %insert_err, "failed to insert compensating billing event");
                }
            }
        });
    }
}

async fn deliver_with_retry(client: &reqwest::Client, url: &str, payload: &EscalationPayload) -> anyhow::Result<()> {
    let mut last_err = None;
    for (attempt, backoff) in std::iter::once(Duration::ZERO).chain(RETRY_BACKOFFS).enumerate() {
        if attempt > 0 {
            tokio::time::sleep(backoff).await;
        }
        match client
            .post(url)
            .timeout(WEBHOOK_TIMEOUT)
            .json(payload)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => return Ok(()),
            Ok(response) => last_err = Some(anyhow::anyhow!("webhook returned status {}", response.status())),
            Err(err) => last_err = Some(anyhow::anyhow!(err)),
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("webhook delivery failed with no recorded error")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use support_agent_core::domain::{
        KnowledgeDocument, Session, Tenant, TenantConfigPatch,
    };
    use support_agent_core::ports::KeyValueStore;

    #[test]
    fn retry_backoffs_are_one_two_four_seconds() {
        assert_eq!(RETRY_BACKOFFS, [Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)]);
    }

    #[test]
    fn transcript_entries_map_role_to_lowercase_string() {
        let now = Utc::now();
        let message = Message::new(Uuid::new_v4(), Uuid::new_v4(), Role::User, "hi", now);
        let entries = to_transcript(&[message]);
        assert_eq!(entries[0].role, "user");
    }

    struct MockKv {
        data: Mutex<HashMap<String, Vec<u8>>>,
    }

    #[async_trait]
    impl KeyValueStore for MockKv {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.data.lock().unwrap().get(key).cloned())
        }
        async fn set(&self, key: &str, value: Vec<u8>, _ttl: Duration) -> Result<()> {
            self.data.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }
        async fn delete(&self, key: &str) -> Result<()> {
            self.data.lock().unwrap().remove(key);
            Ok(())
        }
        async fn incr_by(&self, _key: &str, _delta: i64) -> Result<i64> {
            Ok(0)
        }
        async fn expire(&self, _key: &str, _ttl: Duration) -> Result<()> {
            Ok(())
        }
    }

    struct MockRelational {
        session: Session,
        events: Mutex<Vec<BillingEvent>>,
    }

    #[async_trait]
    impl RelationalStore for MockRelational {
        async fn get_tenant(&self, _tenant_id: Uuid) -> Result<Option<Tenant>> {
            unimplemented!()
        }
        async fn get_tenant_by_api_key_hash(&self, _api_key_hash: &str) -> Result<Option<Tenant>> {
            unimplemented!()
        }
        async fn update_tenant_config(&self, _tenant_id: Uuid, _patch: TenantConfigPatch) -> Result<Tenant> {
            unimplemented!()
        }
        async fn create_session(&self, session: Session) -> Result<Session> {
            Ok(session)
        }
        async fn get_session(&self, _session_id: Uuid) -> Result<Option<Session>> {
            Ok(Some(self.session.clone()))
        }
        async fn update_session(&self, session: Session) -> Result<Session> {
            Ok(session)
        }
        async fn list_stale_active_sessions(&self, _idle_before: chrono::DateTime<chrono::Utc>) -> Result<Vec<Session>> {
            Ok(vec![])
        }
        async fn insert_message(&self, message: Message) -> Result<Message> {
            Ok(message)
        }
        async fn list_messages(&self, _session_id: Uuid) -> Result<Vec<Message>> {
            Ok(vec![])
        }
        async fn count_user_messages(&self, _session_id: Uuid) -> Result<u32> {
            Ok(0)
        }
        async fn insert_billing_event(&self, event: BillingEvent) -> Result<BillingEvent> {
            self.events.lock().unwrap().push(event.clone());
            Ok(event)
        }
        async fn create_document(&self, document: KnowledgeDocument) -> Result<KnowledgeDocument> {
            Ok(document)
        }
        async fn get_document(&self, _document_id: Uuid) -> Result<Option<KnowledgeDocument>> {
            Ok(None)
        }
        async fn update_document(&self, document: KnowledgeDocument) -> Result<KnowledgeDocument> {
            Ok(document)
        }
        async fn list_documents(&self, _tenant_id: Uuid) -> Result<Vec<KnowledgeDocument>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn escalate_closes_the_billing_counters_with_escalated_event_type() {
        let tenant_id = Uuid::new_v4();
        let session = Session::new(tenant_id, None, Utc::now());
        let session_id = session.id;

        let relational = Arc::new(MockRelational { session, events: Mutex::new(vec![]) });
        let kv: Arc<dyn KeyValueStore> = Arc::new(MockKv { data: Mutex::new(HashMap::new()) });
        let metering = Arc::new(MeteringService::new(kv.clone(), relational.clone(), Duration::from_secs(60)));
        let service = EscalationService::new(relational.clone(), kv, metering);

        service
            .escalate(session_id, tenant_id, "needs a human", "please help", None, None)
            .await
            .unwrap();

        let events = relational.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, BillingEventType::Escalated);
        assert_eq!(events[0].session_id, session_id);
    }
}
