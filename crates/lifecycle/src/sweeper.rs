//! Idle-session sweeper: every 5 minutes, resolve sessions
//! that have been active longer than the idle threshold.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use support_agent_core::domain::BillingEventType;
use support_agent_core::ports::RelationalStore;

use crate::metering::MeteringService;

pub const SWEEP_PERIOD: Duration = Duration::from_secs(5 * 60);

pub struct IdleSessionSweeper {
    relational_store: Arc<dyn RelationalStore>,
    metering: Arc<MeteringService>,
    idle_threshold: Duration,
}

impl IdleSessionSweeper {
    pub fn new(relational_store: Arc<dyn RelationalStore>, metering: Arc<MeteringService>, idle_threshold: Duration) -> Self {
        Self { relational_store, metering, idle_threshold }
    }

    /// Runs the sweep loop forever as a detached background task —
    /// intended to be `tokio::spawn`ed once from `main`.
    pub async fn run_forever(self: Arc<Self>) {
        let mut interval = tokio::time::interval(SWEEP_PERIOD);
        loop {
            interval.tick().await;
            self.sweep_once().await;
        }
    }

    /// One sweep pass. Failures per session are logged and do not
    /// interrupt the rest of the sweep.
    pub async fn sweep_once(&self) {
        let idle_before = Utc::now() - chrono::Duration::from_std(self.idle_threshold).unwrap_or(chrono::Duration::zero());

        let stale = match self.relational_store.list_stale_active_sessions(idle_before).await {
            Ok(sessions) => sessions,
            Err(err) => {
                tracing::error!(error = %err, "idle sweeper failed to list stale sessions");
                return;
            }
        };

        for mut session in stale {
            let session_id = session.id;
            let tenant_id = session.tenant_id;
            session.resolve(Utc::now());
            if let Err(err) = self.relational_store.update_session(session).await {
                tracing::error!(session_id = %session_id, error = %err, "idle sweeper failed to update session, skipping");
                continue;
            }
            if let Err(err) = self.metering.close_session(session_id, tenant_id, BillingEventType::Timeout).await {
                tracing::error!(session_id = %session_id, error = %err, "idle sweeper failed to close billing for session");
            }
        }
    }
}
