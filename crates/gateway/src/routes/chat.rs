//! `POST /v1/chat/message`: the one endpoint fronting
//! `AgentTurnController::handle_turn`.

use axum::extract::{Extension, State};
use axum::response::Json;
use axum::routing::post;
use axum::Router;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use support_agent_core::domain::{IntentType, SourceChunkRef, Tenant};
use support_agent_core::Error;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/chat/message", post(send_message))
}

#[derive(Debug, Deserialize)]
pub struct ChatMessageRequest {
    pub session_id: Uuid,
    pub message: String,
    /// Accepted for schema compatibility; streaming delivery is a
    /// non-goal of this backend and is always ignored.
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatMessageResponse {
    pub message_id: Uuid,
    pub response: String,
    pub confidence: Option<f64>,
    pub sources: Vec<SourceChunkRef>,
    pub escalation_required: bool,
    pub escalation_reason: Option<String>,
    pub latency_ms: i64,
    pub intent_type: IntentType,
}

async fn send_message(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Json(body): Json<ChatMessageRequest>,
) -> Result<Json<ChatMessageResponse>, ApiError> {
    let session = state
        .relational_store
        .get_session(body.session_id)
        .await?
        .ok_or(ApiError(Error::InvalidSession(body.session_id)))?;
    if session.tenant_id != tenant.id {
        return Err(ApiError(Error::InvalidSession(body.session_id)));
    }
    if !session.is_active() {
        return Err(ApiError(Error::SessionInactive(body.session_id)));
    }

    let outcome = state
        .turn_controller
        .handle_turn(body.session_id, tenant.id, &body.message, &tenant.config)
        .await?;

    support_agent_governance::record_turn(intent_label(outcome.intent_type), outcome.escalation_required);
    if let Some(reason) = &outcome.escalation_reason {
        support_agent_governance::record_escalation(reason);
    }

    Ok(Json(ChatMessageResponse {
        message_id: outcome.message_id,
        response: outcome.response,
        confidence: outcome.confidence,
        sources: outcome.source_chunks.unwrap_or_default(),
        escalation_required: outcome.escalation_required,
        escalation_reason: outcome.escalation_reason,
        latency_ms: outcome.latency_ms,
        intent_type: outcome.intent_type,
    }))
}

fn intent_label(intent: IntentType) -> &'static str {
    match intent {
        IntentType::Conversational => "conversational",
        IntentType::DomainQuery => "domain_query",
        IntentType::OutOfScope => "out_of_scope",
    }
}
