//! API-key authentication middleware (`X-API-Key` on every
//! route but `/health`). Hashing and tenant lookup are the only pieces
//! this crate owns, so this is deliberately thin: hex-encode a SHA-256
//! digest of the raw header value and hand it to
//! `RelationalStore::get_tenant_by_api_key_hash`.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};

use support_agent_core::domain::Tenant;
use support_agent_core::Error;

use crate::error::ApiError;
use crate::state::AppState;

pub fn hash_api_key(raw_key: &str) -> String {
    let digest = Sha256::digest(raw_key.as_bytes());
    hex::encode(digest)
}

pub async fn require_api_key(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let raw_key = request
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError(Error::InvalidApiKey))?;

    let hash = hash_api_key(raw_key);
    let tenant = state
        .relational_store
        .get_tenant_by_api_key_hash(&hash)
        .await?
        .ok_or(ApiError(Error::InvalidApiKey))?;

    if !tenant.active {
        return Err(ApiError(Error::TenantInactive(tenant.id)));
    }

    // `support_agent_admin`'s handlers only need the tenant id; the
    // route handlers in this crate want the full `Tenant`, so both are
    // installed.
    request.extensions_mut().insert(tenant.id);
    request.extensions_mut().insert(tenant);
    Ok(next.run(request).await)
}

/// Convenience extractor alias used throughout the route handlers.
pub type AuthenticatedTenant = axum::extract::Extension<Tenant>;
