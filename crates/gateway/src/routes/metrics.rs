//! `GET /metrics`: Prometheus text exposition, unauthenticated like
//! `/health` (scraped by infrastructure, not an API-key-bearing client).

use axum::extract::State;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(render_metrics))
}

async fn render_metrics(State(state): State<AppState>) -> String {
    state.metrics.render()
}
