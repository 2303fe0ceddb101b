//! Tracing/logging initialization. Structured fields on every span and
//! event follow the same shape as the turn/retrieval/escalation crates:
//! `tracing::info!(session_id = %id, ...)`, never bare string
//! interpolation of identifiers.

use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::Config as TraceConfig;
use opentelemetry_sdk::Resource;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Installs a `tracing` subscriber: an env-filter-gated fmt layer on
/// stdout, plus an OTLP exporter layer when `otlp_endpoint` is set.
/// `otlp_endpoint` absent is the common case (ambient observability,
/// never required for correctness) — logging still works without it.
pub fn init_tracing(log_level: &str, service_name: &str, otlp_endpoint: Option<&str>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true).with_thread_ids(true);

    let registry = Registry::default().with(env_filter).with(fmt_layer);

    match otlp_endpoint {
        Some(endpoint) => {
            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint))
                .with_trace_config(
                    TraceConfig::default().with_resource(Resource::new(vec![KeyValue::new("service.name", service_name.to_string())])),
                )
                .install_batch(opentelemetry_sdk::runtime::Tokio)?;
            registry.with(tracing_opentelemetry::layer().with_tracer(tracer)).try_init()?;
        }
        None => {
            registry.try_init()?;
        }
    }

    Ok(())
}
