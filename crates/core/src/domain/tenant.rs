use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity key for isolation. Created externally, read-only on the hot path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub display_name: String,
    /// Opaque 64-hex digest; api-key lookup itself is out of scope here.
    pub api_key_hash: String,
    pub vertical: String,
    pub config: TenantConfig,
    pub active: bool,
}

/// Per-tenant behavior knobs consumed by turn orchestration and retrieval.
///
/// `auto_resolve_threshold` deserializes but is never consulted in any
/// decision path — kept so unknown-but-present config fields round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    pub persona_name: String,
    pub persona_description: String,
    pub company_name: String,
    pub vertical: String,
    #[serde(default)]
    pub allowed_topics: Vec<String>,
    #[serde(default)]
    pub blocked_topics: Vec<String>,
    #[serde(default = "default_escalation_threshold")]
    pub escalation_threshold: f64,
    #[serde(default = "default_max_turns")]
    pub max_turns_before_escalation: u32,
    #[serde(default)]
    pub escalation_webhook_url: Option<String>,
    #[serde(default)]
    pub data_webhook_url: Option<String>,
    #[serde(default)]
    pub external_user_id: Option<String>,
    #[serde(default)]
    pub auto_resolve_threshold: Option<f64>,
}

fn default_escalation_threshold() -> f64 {
    0.55
}

fn default_max_turns() -> u32 {
    10
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            persona_name: "Assistant".to_string(),
            persona_description: String::new(),
            company_name: String::new(),
            vertical: String::new(),
            allowed_topics: Vec::new(),
            blocked_topics: Vec::new(),
            escalation_threshold: default_escalation_threshold(),
            max_turns_before_escalation: default_max_turns(),
            escalation_webhook_url: None,
            data_webhook_url: None,
            external_user_id: None,
            auto_resolve_threshold: None,
        }
    }
}

impl TenantConfig {
    /// Merge semantics for `PUT /v1/config`: non-null fields overwrite,
    /// everything else is left untouched.
    pub fn merge(&mut self, patch: TenantConfigPatch) {
        if let Some(v) = patch.persona_name {
            self.persona_name = v;
        }
        if let Some(v) = patch.persona_description {
            self.persona_description = v;
        }
        if let Some(v) = patch.company_name {
            self.company_name = v;
        }
        if let Some(v) = patch.vertical {
            self.vertical = v;
        }
        if let Some(v) = patch.allowed_topics {
            self.allowed_topics = v;
        }
        if let Some(v) = patch.blocked_topics {
            self.blocked_topics = v;
        }
        if let Some(v) = patch.escalation_threshold {
            self.escalation_threshold = v;
        }
        if let Some(v) = patch.max_turns_before_escalation {
            self.max_turns_before_escalation = v;
        }
        if let Some(v) = patch.escalation_webhook_url {
            self.escalation_webhook_url = Some(v);
        }
        if let Some(v) = patch.data_webhook_url {
            self.data_webhook_url = Some(v);
        }
        if let Some(v) = patch.external_user_id {
            self.external_user_id = Some(v);
        }
        if let Some(v) = patch.auto_resolve_threshold {
            self.auto_resolve_threshold = Some(v);
        }
    }
}

/// Partial update body for `PUT /v1/config`: every field optional, absent
/// fields leave the corresponding `TenantConfig` field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenantConfigPatch {
    pub persona_name: Option<String>,
    pub persona_description: Option<String>,
    pub company_name: Option<String>,
    pub vertical: Option<String>,
    pub allowed_topics: Option<Vec<String>>,
    pub blocked_topics: Option<Vec<String>>,
    pub escalation_threshold: Option<f64>,
    pub max_turns_before_escalation: Option<u32>,
    pub escalation_webhook_url: Option<String>,
    pub data_webhook_url: Option<String>,
    pub external_user_id: Option<String>,
    pub auto_resolve_threshold: Option<f64>,
}
