//! OpenAPI documentation for the admin surface. `TenantConfigDoc` is a
//! documentation-only mirror of `support_agent_core::domain::TenantConfig`
//! — kept separate so the domain crate never has to carry a `utoipa`
//! dependency just to describe its own shape for Swagger UI.

use utoipa::{OpenApi, ToSchema};

use crate::handlers;

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct TenantConfigDoc {
    persona_name: String,
    persona_description: String,
    company_name: String,
    vertical: String,
    allowed_topics: Vec<String>,
    blocked_topics: Vec<String>,
    escalation_threshold: f64,
    max_turns_before_escalation: u32,
    escalation_webhook_url: Option<String>,
    data_webhook_url: Option<String>,
    external_user_id: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_config, handlers::put_config),
    components(schemas(TenantConfigDoc)),
    tags((name = "admin", description = "Tenant configuration"))
)]
pub struct ApiDoc;
