use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bounded conversation. Transitions are monotonic: `active -> resolved`
/// or `active -> escalated`, never back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub external_user_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub escalation_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Resolved,
    Escalated,
}

impl Session {
    pub fn new(tenant_id: Uuid, external_user_id: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            external_user_id,
            started_at: now,
            ended_at: None,
            status: SessionStatus::Active,
            escalation_reason: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// `active -> resolved`. Caller is responsible for enforcing monotonicity
    /// at the storage layer (a terminal session is never reopened).
    pub fn resolve(&mut self, now: DateTime<Utc>) {
        self.status = SessionStatus::Resolved;
        self.ended_at = Some(now);
    }

    pub fn escalate(&mut self, reason: impl Into<String>, now: DateTime<Utc>) {
        self.status = SessionStatus::Escalated;
        self.escalation_reason = Some(reason.into());
        self.ended_at = Some(now);
    }
}
