//! Shared application state handed to every route as an `axum::State`.
//! Construction (wiring concrete adapters behind the core ports) lives
//! in the binary's `main`; this crate only holds the `Arc`s.

use std::sync::Arc;
use std::time::Duration;

use support_agent_controller::AgentTurnController;
use support_agent_core::ports::{KeyValueStore, LanguageModel, RelationalStore, VectorIndex};
use support_agent_escalation::EscalationService;
use support_agent_governance::MetricsHandle;
use support_agent_ingestion::IngestionPipeline;
use support_agent_lifecycle::MeteringService;
use support_agent_retrieval::HybridRetriever;

#[derive(Clone)]
pub struct AppState {
    pub relational_store: Arc<dyn RelationalStore>,
    pub kv_store: Arc<dyn KeyValueStore>,
    pub vector_index: Arc<dyn VectorIndex>,
    pub language_model: Arc<dyn LanguageModel>,
    pub turn_controller: Arc<AgentTurnController>,
    pub ingestion: Arc<IngestionPipeline>,
    pub retriever: Arc<HybridRetriever>,
    pub escalation: Arc<EscalationService>,
    pub metering: Arc<MeteringService>,
    pub idle_session_timeout: Duration,
    /// Local scratch directory uploaded files are written to before the
    /// ingestion pipeline reads them back; a real deployment would hand
    /// this off to `support_agent_store::BlobStore` instead.
    pub upload_dir: Arc<str>,
    pub metrics: MetricsHandle,
}
