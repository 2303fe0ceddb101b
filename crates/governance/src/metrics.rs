//! Prometheus metrics: turns handled, escalations fired, ingestion/
//! retrieval latency, webhook retry counts — the counters the gateway's
//! `/metrics` route exposes.

use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

#[derive(Clone)]
pub struct MetricsHandle(PrometheusHandle);

impl MetricsHandle {
    pub fn render(&self) -> String {
        self.0.render()
    }
}

/// Installs the global `metrics` recorder. Call once, near the top of
/// `main`, before any `record_*` call below.
pub fn install_recorder() -> anyhow::Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(MetricsHandle(handle))
}

pub fn record_turn(intent: &str, escalated: bool) {
    metrics::counter!("support_agent_turns_total", "intent" => intent.to_string(), "escalated" => escalated.to_string()).increment(1);
}

pub fn record_escalation(reason: &str) {
    metrics::counter!("support_agent_escalations_total", "reason" => reason.to_string()).increment(1);
}

pub fn record_ingestion(file_type: &str, succeeded: bool, elapsed: Duration) {
    metrics::counter!("support_agent_ingestions_total", "file_type" => file_type.to_string(), "succeeded" => succeeded.to_string()).increment(1);
    metrics::histogram!("support_agent_ingestion_duration_seconds", "file_type" => file_type.to_string()).record(elapsed.as_secs_f64());
}

pub fn record_retrieval(escalated: bool, elapsed: Duration) {
    metrics::histogram!("support_agent_retrieval_duration_seconds", "escalated" => escalated.to_string()).record(elapsed.as_secs_f64());
}

pub fn record_webhook_retry(attempt: usize, succeeded: bool) {
    metrics::counter!("support_agent_webhook_retries_total", "attempt" => attempt.to_string(), "succeeded" => succeeded.to_string()).increment(1);
}
