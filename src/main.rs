//! Process entrypoint: load settings, wire concrete adapters behind the
//! core ports, start the HTTP server plus the idle-session sweeper.

use std::sync::Arc;

use support_agent_admin::TenantConfigService;
use support_agent_controller::AgentTurnController;
use support_agent_core::config::Settings;
use support_agent_core::ports::{KeyValueStore, LanguageModel, RelationalStore, VectorIndex};
use support_agent_escalation::EscalationService;
use support_agent_gateway::{build_router, AppState};
use support_agent_governance::{init_tracing, install_recorder};
use support_agent_ingestion::{IngestionPipeline, PlainTextParser};
use support_agent_lifecycle::{IdleSessionSweeper, MeteringService};
use support_agent_model_gateway::{CompositeLanguageModel, RerankClient, RigProvider};
use support_agent_retrieval::HybridRetriever;
use support_agent_store::{PostgresRelationalStore, QdrantVectorIndex, RedisKeyValueStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;
    init_tracing(&settings.log_level, "support-agent", std::env::var("OTLP_ENDPOINT").ok().as_deref())?;
    let metrics = install_recorder()?;

    let relational_store: Arc<dyn RelationalStore> = Arc::new(PostgresRelationalStore::connect(&settings.relational_store_url).await?);
    let kv_store: Arc<dyn KeyValueStore> = Arc::new(RedisKeyValueStore::connect(&settings.key_value_store_url).await?);
    let vector_store_url = format!("http://{}:{}", settings.vector_store_host, settings.vector_store_port);
    let vector_index: Arc<dyn VectorIndex> = Arc::new(QdrantVectorIndex::connect(&vector_store_url, settings.vector_store_api_key.as_deref())?);

    let primary: Arc<dyn LanguageModel> = Arc::new(RigProvider::new(&settings.llm_primary_api_key, None, "gpt-4o", "text-embedding-3-small"));
    let secondary: Arc<dyn LanguageModel> = Arc::new(RigProvider::new(&settings.llm_secondary_api_key, None, "gpt-4o-mini", "text-embedding-3-small"));
    let rerank_client = RerankClient::new(
        std::env::var("RERANK_ENDPOINT").unwrap_or_else(|_| "https://api.cohere.ai/v1/rerank".to_string()),
        settings.rerank_api_key.clone(),
    );
    let language_model: Arc<dyn LanguageModel> = Arc::new(CompositeLanguageModel::new(primary, secondary, rerank_client));

    let retriever = Arc::new(HybridRetriever::new(language_model.clone(), vector_index.clone(), kv_store.clone()));
    let metering = Arc::new(MeteringService::new(kv_store.clone(), relational_store.clone(), settings.billing_counter_ttl()));
    let escalation = Arc::new(EscalationService::new(relational_store.clone(), kv_store.clone(), metering.clone()));
    let memory = support_agent_controller::ConversationMemory::new(kv_store.clone(), settings.idle_session_timeout());
    let turn_controller = Arc::new(AgentTurnController::new(
        language_model.clone(),
        relational_store.clone(),
        retriever.clone(),
        memory,
        metering.clone(),
        escalation.clone(),
    ));

    let parser = Arc::new(PlainTextParser);
    let ingestion = Arc::new(IngestionPipeline::new(
        parser,
        language_model.clone(),
        vector_index.clone(),
        relational_store.clone(),
        kv_store.clone(),
    ));

    let sweeper = Arc::new(IdleSessionSweeper::new(relational_store.clone(), metering.clone(), settings.idle_session_timeout()));
    tokio::spawn(sweeper.run_forever());

    let state = AppState {
        relational_store: relational_store.clone(),
        kv_store,
        vector_index,
        language_model,
        turn_controller,
        ingestion,
        retriever,
        escalation,
        metering,
        idle_session_timeout: settings.idle_session_timeout(),
        upload_dir: Arc::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| "/tmp/support-agent-uploads".to_string())),
        metrics,
    };

    let config_service = Arc::new(TenantConfigService::new(relational_store));
    let app = build_router(state, config_service);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    tracing::info!(bind_addr, "starting support-agent");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
