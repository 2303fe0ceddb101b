//! `POST /v1/session/start`, `POST /v1/session/{id}/end`,
//! `GET /v1/session/{id}/transcript`.

use axum::extract::{Extension, Path, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use support_agent_core::domain::{BillingEventType, Message, Session, SessionStatus, Tenant};
use support_agent_core::Error;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/session/start", post(start_session))
        .route("/v1/session/:id/end", post(end_session))
        .route("/v1/session/:id/transcript", get(get_transcript))
}

#[derive(Debug, Deserialize, Default)]
pub struct StartSessionRequest {
    #[serde(default)]
    pub external_user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: Uuid,
    pub created_at: chrono::DateTime<Utc>,
}

async fn start_session(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    body: Option<Json<StartSessionRequest>>,
) -> Result<Json<StartSessionResponse>, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let now = Utc::now();
    let session = Session::new(tenant.id, body.external_user_id, now);
    let session = state.relational_store.create_session(session).await?;
    Ok(Json(StartSessionResponse { session_id: session.id, created_at: session.started_at }))
}

#[derive(Debug, Serialize)]
pub struct EndSessionResponse {
    pub session_id: Uuid,
    pub status: &'static str,
}

async fn end_session(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<EndSessionResponse>, ApiError> {
    let mut session = load_owned_session(&state, tenant.id, session_id).await?;
    if !session.is_active() {
        return Err(ApiError(Error::SessionInactive(session_id)));
    }

    session.resolve(Utc::now());
    state.relational_store.update_session(session).await?;
    state.metering.close_session(session_id, tenant.id, BillingEventType::Resolved).await?;
    state.kv_store.delete(&format!("memory:{session_id}")).await?;

    Ok(Json(EndSessionResponse { session_id, status: "resolved" }))
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub session_id: Uuid,
    pub messages: Vec<Message>,
}

async fn get_transcript(
    State(state): State<AppState>,
    Extension(tenant): Extension<Tenant>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    load_owned_session(&state, tenant.id, session_id).await?;
    let messages = state.relational_store.list_messages(session_id).await?;
    Ok(Json(TranscriptResponse { session_id, messages }))
}

/// Cross-tenant isolation: a session that exists but belongs
/// to a different tenant is reported as not-found, never leaked.
async fn load_owned_session(state: &AppState, tenant_id: Uuid, session_id: Uuid) -> Result<Session, ApiError> {
    let session = state
        .relational_store
        .get_session(session_id)
        .await?
        .ok_or(ApiError(Error::InvalidSession(session_id)))?;
    if session.tenant_id != tenant_id {
        return Err(ApiError(Error::InvalidSession(session_id)));
    }
    Ok(session)
}

#[allow(dead_code)]
fn _status_is_exhaustive(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Active => "active",
        SessionStatus::Resolved => "resolved",
        SessionStatus::Escalated => "escalated",
    }
}
