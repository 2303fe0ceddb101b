use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingEventType {
    Resolved,
    Escalated,
    Timeout,
    EscalationWebhookFailed,
}

/// Durable metering record. One per terminating transition per session
/// under normal operation; an additional `EscalationWebhookFailed`
/// compensating record may be inserted independently of that rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingEvent {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub session_id: Uuid,
    pub event_type: BillingEventType,
    pub total_input_tokens: i64,
    pub total_output_tokens: i64,
    pub total_messages: i64,
    pub billed_at: DateTime<Utc>,
}

impl BillingEvent {
    pub fn new(
        tenant_id: Uuid,
        session_id: Uuid,
        event_type: BillingEventType,
        total_input_tokens: i64,
        total_output_tokens: i64,
        total_messages: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            session_id,
            event_type,
            total_input_tokens,
            total_output_tokens,
            total_messages,
            billed_at: now,
        }
    }

    /// The independent compensating record inserted when webhook retries
    /// are exhausted — zero counters, its own transaction.
    pub fn webhook_failed(tenant_id: Uuid, session_id: Uuid, now: DateTime<Utc>) -> Self {
        Self::new(
            tenant_id,
            session_id,
            BillingEventType::EscalationWebhookFailed,
            0,
            0,
            0,
            now,
        )
    }
}
