//! Tenant config read/merge backing `GET`/`PUT /v1/config`. The merge
//! itself lives on `TenantConfig` (non-null patch fields overwrite);
//! this service is just the load/merge/save orchestration.

use std::sync::Arc;

use uuid::Uuid;

use support_agent_core::domain::{TenantConfig, TenantConfigPatch};
use support_agent_core::error::{Error, Result};
use support_agent_core::ports::RelationalStore;

pub struct TenantConfigService {
    relational_store: Arc<dyn RelationalStore>,
}

impl TenantConfigService {
    pub fn new(relational_store: Arc<dyn RelationalStore>) -> Self {
        Self { relational_store }
    }

    pub async fn get_config(&self, tenant_id: Uuid) -> Result<TenantConfig> {
        let tenant = self
            .relational_store
            .get_tenant(tenant_id)
            .await?
            .ok_or(Error::TenantNotFound(tenant_id))?;
        Ok(tenant.config)
    }

    pub async fn update_config(&self, tenant_id: Uuid, patch: TenantConfigPatch) -> Result<TenantConfig> {
        let tenant = self.relational_store.update_tenant_config(tenant_id, patch).await?;
        Ok(tenant.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use support_agent_core::domain::{BillingEvent, KnowledgeDocument, Message, Session, Tenant};

    struct StubStore {
        tenant: tokio::sync::Mutex<Tenant>,
    }

    #[async_trait]
    impl RelationalStore for StubStore {
        async fn get_tenant(&self, _tenant_id: Uuid) -> Result<Option<Tenant>> {
            Ok(Some(self.tenant.lock().await.clone()))
        }
        async fn get_tenant_by_api_key_hash(&self, _api_key_hash: &str) -> Result<Option<Tenant>> {
            Ok(Some(self.tenant.lock().await.clone()))
        }
        async fn update_tenant_config(&self, _tenant_id: Uuid, patch: TenantConfigPatch) -> Result<Tenant> {
            let mut tenant = self.tenant.lock().await;
            tenant.config.merge(patch);
            Ok(tenant.clone())
        }
        async fn create_session(&self, session: Session) -> Result<Session> {
            Ok(session)
        }
        async fn get_session(&self, _session_id: Uuid) -> Result<Option<Session>> {
            Ok(None)
        }
        async fn update_session(&self, session: Session) -> Result<Session> {
            Ok(session)
        }
        async fn list_stale_active_sessions(&self, _idle_before: chrono::DateTime<chrono::Utc>) -> Result<Vec<Session>> {
            Ok(Vec::new())
        }
        async fn insert_message(&self, message: Message) -> Result<Message> {
            Ok(message)
        }
        async fn list_messages(&self, _session_id: Uuid) -> Result<Vec<Message>> {
            Ok(Vec::new())
        }
        async fn count_user_messages(&self, _session_id: Uuid) -> Result<u32> {
            Ok(0)
        }
        async fn insert_billing_event(&self, event: BillingEvent) -> Result<BillingEvent> {
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
            Ok(Vec::new())
        }
    }

    fn tenant() -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            display_name: "Acme".to_string(),
            api_key_hash: "deadbeef".to_string(),
            vertical: "retail".to_string(),
            config: TenantConfig::default(),
            active: true,
        }
    }

    #[tokio::test]
    async fn update_merges_onto_existing_config() {
        let tenant = tenant();
        let tenant_id = tenant.id;
        let store = Arc::new(StubStore { tenant: tokio::sync::Mutex::new(tenant) });
        let service = TenantConfigService::new(store);

        let patch = TenantConfigPatch { persona_name: Some("Nova".to_string()), ..Default::default() };
        let updated = service.update_config(tenant_id, patch).await.unwrap();

        assert_eq!(updated.persona_name, "Nova");
        assert_eq!(updated.escalation_threshold, 0.55);
    }

    #[tokio::test]
    async fn get_unknown_tenant_is_not_found() {
        struct EmptyStore;
        #[async_trait]
        impl RelationalStore for EmptyStore {
            async fn get_tenant(&self, _tenant_id: Uuid) -> Result<Option<Tenant>> {
                Ok(None)
            }
            async fn get_tenant_by_api_key_hash(&self, _api_key_hash: &str) -> Result<Option<Tenant>> {
                Ok(None)
            }
            async fn update_tenant_config(&self, _tenant_id: Uuid, _patch: TenantConfigPatch) -> Result<Tenant> {
                unreachable!()
            }
            async fn create_session(&self, session: Session) -> Result<Session> {
                Ok(session)
            }
            async fn get_session(&self, _session_id: Uuid) -> Result<Option<Session>> {
                Ok(None)
            }
            async fn update_session(&self, session: Session) -> Result<Session> {
                Ok(session)
            }
            async fn list_stale_active_sessions(&self, _idle_before: chrono::DateTime<chrono::Utc>) -> Result<Vec<Session>> {
                Ok(Vec::new())
            }
            async fn insert_message(&self, message: Message) -> Result<Message> {
                Ok(message)
            }
            async fn list_messages(&self, _session_id: Uuid) -> Result<Vec<Message>> {
                Ok(Vec::new())
            }
            async fn count_user_messages(&self, _session_id: Uuid) -> Result<u32> {
                Ok(0)
            }
            async fn insert_billing_event(&self, event: BillingEvent) -> Result<BillingEvent> {
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
                Ok(Vec::new())
            }
        }

        let service = TenantConfigService::new(Arc::new(EmptyStore));
        let err = service.get_config(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::TenantNotFound(_)));
    }
}
