#![deny(unused_must_use)]
//! HTTP surface. Request routing and schema validation are
//! treated as an out-of-scope external collaborator here, so this
//! crate stays thin: axum routers that deserialize a body, call one
//! domain service, and serialize the result — no business logic lives
//! here.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use axum::middleware;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Builds the full `/v1` router: `/health` unauthenticated, everything
/// else behind the `X-API-Key` middleware, plus the admin crate's
/// `/v1/config` and `/admin/*` routes.
pub fn build_router(state: AppState, config_service: std::sync::Arc<support_agent_admin::TenantConfigService>) -> Router {
    let authenticated = Router::new()
        .merge(routes::session::router())
        .merge(routes::chat::router())
        .merge(routes::knowledge::router())
        .merge(support_agent_admin::router::<AppState>(config_service))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_api_key));

    Router::new()
        .merge(routes::health::router())
        .merge(routes::metrics::router())
        .merge(authenticated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
