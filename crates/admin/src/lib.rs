#![deny(unused_must_use)]
//! Tenant configuration surface and admin dashboard: a read/merge
//! endpoint backing `/v1/config`, OpenAPI docs for it, and a static
//! dashboard UI, all mountable into the gateway's router.

pub mod config;
pub mod dashboard;
pub mod handlers;
pub mod openapi;

use std::sync::Arc;

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::TenantConfigService;

/// Everything this crate contributes to the gateway's router: the
/// `/v1/config` routes (tenant-scoped, expects an `Extension<Uuid>`
/// upstream), `/admin/dashboard/*`, and `/admin/docs` Swagger UI.
/// Generic over the gateway's state type — this crate never reads it,
/// only `Extension`s the auth middleware installs.
pub fn router<S>(service: Arc<TenantConfigService>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .merge(handlers::router(service))
        .merge(dashboard::router())
        .merge(SwaggerUi::new("/admin/docs").url("/admin/openapi.json", openapi::ApiDoc::openapi()))
}
