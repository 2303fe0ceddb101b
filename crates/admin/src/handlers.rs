//! Axum handlers for `GET`/`PUT /v1/config`. Tenant identity arrives as
//! an `Extension<Uuid>` inserted by the gateway's API-key middleware
//! upstream of this router — these handlers never see the raw key.

use std::sync::Arc;

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, put};
use axum::Router;
use uuid::Uuid;

use support_agent_core::domain::{TenantConfig, TenantConfigPatch};
use support_agent_core::error::Error;

use crate::config::TenantConfigService;
use crate::openapi::TenantConfigDoc;

struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(serde_json::json!({
            "error": { "code": self.0.code(), "message": self.0.to_string() }
        }));
        (status, body).into_response()
    }
}

#[utoipa::path(get, path = "/v1/config", tag = "admin", responses((status = 200, body = TenantConfigDoc)))]
pub(crate) async fn get_config(
    Extension(service): Extension<Arc<TenantConfigService>>,
    Extension(tenant_id): Extension<Uuid>,
) -> Result<Json<TenantConfig>, ApiError> {
    let config = service.get_config(tenant_id).await?;
    Ok(Json(config))
}

#[utoipa::path(put, path = "/v1/config", tag = "admin", responses((status = 200, body = TenantConfigDoc)))]
pub(crate) async fn put_config(
    Extension(service): Extension<Arc<TenantConfigService>>,
    Extension(tenant_id): Extension<Uuid>,
    Json(patch): Json<TenantConfigPatch>,
) -> Result<Json<TenantConfig>, ApiError> {
    let config = service.update_config(tenant_id, patch).await?;
    Ok(Json(config))
}

/// Mounted by the gateway under the authenticated router; `service` is
/// shared across tenants, tenant scoping happens per-request via the
/// `Extension<Uuid>` the auth middleware installs.
pub fn router<S>(service: Arc<TenantConfigService>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/v1/config", get(get_config).put(put_config))
        .layer(Extension(service))
}
