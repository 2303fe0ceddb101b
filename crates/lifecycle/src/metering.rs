//! Metering. Counters are not globally atomic with respect
//! to session termination; the contract is best-effort after a session
//! reaches a terminal state.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use support_agent_core::domain::{BillingEvent, BillingEventType};
use support_agent_core::ports::{KeyValueStore, RelationalStore};
use support_agent_core::Result;

fn input_tokens_key(session_id: Uuid) -> String {
    format!("billing:{session_id}:input_tokens")
}

fn output_tokens_key(session_id: Uuid) -> String {
    format!("billing:{session_id}:output_tokens")
}

fn message_count_key(session_id: Uuid) -> String {
    format!("billing:{session_id}:message_count")
}

pub struct MeteringService {
    kv_store: Arc<dyn KeyValueStore>,
    relational_store: Arc<dyn RelationalStore>,
    counter_ttl: Duration,
}

impl MeteringService {
    pub fn new(kv_store: Arc<dyn KeyValueStore>, relational_store: Arc<dyn RelationalStore>, counter_ttl: Duration) -> Self {
        Self { kv_store, relational_store, counter_ttl }
    }

    /// Atomically increments the three counters, then refreshes all
    /// three TTLs.
    pub async fn record_message(&self, session_id: Uuid, input_tokens: i64, output_tokens: i64) -> Result<()> {
        let input_key = input_tokens_key(session_id);
        let output_key = output_tokens_key(session_id);
        let count_key = message_count_key(session_id);

        self.kv_store.incr_by(&input_key, input_tokens).await?;
        self.kv_store.incr_by(&output_key, output_tokens).await?;
        self.kv_store.incr_by(&count_key, 1).await?;

        self.kv_store.expire(&input_key, self.counter_ttl).await?;
        self.kv_store.expire(&output_key, self.counter_ttl).await?;
        self.kv_store.expire(&count_key, self.counter_ttl).await?;
        Ok(())
    }

    /// Reads the three counters (missing -> 0), inserts one durable
    /// `BillingEvent`, deletes the three keys. Missing keys do not
    /// raise; they produce a zero-count event and a warning.
    pub async fn close_session(&self, session_id: Uuid, tenant_id: Uuid, event_type: BillingEventType) -> Result<BillingEvent> {
        let input_key = input_tokens_key(session_id);
        let output_key = output_tokens_key(session_id);
        let count_key = message_count_key(session_id);

        let total_input_tokens = self.kv_store.get_i64(&input_key).await?;
        let total_output_tokens = self.kv_store.get_i64(&output_key).await?;
        let total_messages = self.kv_store.get_i64(&count_key).await?;

        if total_input_tokens == 0 && total_output_tokens == 0 && total_messages == 0 {
            tracing::warn!(session_id = %session_id, "closing session with no billing counters present");
        }

        let event = BillingEvent::new(
            tenant_id,
            session_id,
            event_type,
            total_input_tokens,
            total_output_tokens,
            total_messages,
            chrono::Utc::now(),
        );
        let event = self.relational_store.insert_billing_event(event).await?;

        self.kv_store.delete(&input_key).await?;
        self.kv_store.delete(&output_key).await?;
        self.kv_store.delete(&count_key).await?;

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use support_agent_core::domain::{KnowledgeDocument, Message, Session, Tenant, TenantConfigPatch};

    struct MockKv {
        data: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MockKv {
        fn new() -> Self {
            Self { data: Mutex::new(HashMap::new()) }
        }
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
        async fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
            let mut data = self.data.lock().unwrap();
            let current: i64 = data
                .get(key)
                .and_then(|v| std::str::from_utf8(v).ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            let next = current + delta;
            data.insert(key.to_string(), next.to_string().into_bytes());
            Ok(next)
        }
        async fn expire(&self, _key: &str, _ttl: Duration) -> Result<()> {
            Ok(())
        }
    }

    struct MockRelational {
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
            unimplemented!()
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
    async fn close_session_flushes_correct_totals_and_clears_keys() {
        let kv = Arc::new(MockKv::new());
        let relational = Arc::new(MockRelational { events: Mutex::new(vec![]) });
        let service = MeteringService::new(kv.clone(), relational.clone(), Duration::from_secs(60));

        let session_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();
        service.record_message(session_id, 100, 50).await.unwrap();
        service.record_message(session_id, 100, 50).await.unwrap();

        let event = service.close_session(session_id, tenant_id, BillingEventType::Resolved).await.unwrap();
        assert_eq!(event.total_input_tokens, 200);
        assert_eq!(event.total_output_tokens, 100);
        assert_eq!(event.total_messages, 2);

        assert!(kv.get(&input_tokens_key(session_id)).await.unwrap().is_none());
        assert!(kv.get(&output_tokens_key(session_id)).await.unwrap().is_none());
        assert!(kv.get(&message_count_key(session_id)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_counters_produce_zero_event_not_an_error() {
        let kv = Arc::new(MockKv::new());
        let relational = Arc::new(MockRelational { events: Mutex::new(vec![]) });
        let service = MeteringService::new(kv, relational, Duration::from_secs(60));
        let event = service.close_session(Uuid::new_v4(), Uuid::new_v4(), BillingEventType::Timeout).await.unwrap();
        assert_eq!(event.total_input_tokens, 0);
        assert_eq!(event.total_messages, 0);
    }
}
