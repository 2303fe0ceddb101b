#![deny(unused_must_use)]
//! Cross-cutting observability: structured logging/tracing setup and
//! metrics registration. Nothing here is load-bearing for any business
//! decision path — it is the ambient stack every other crate assumes is
//! already wired up by the time it starts logging.

pub mod metrics;
pub mod telemetry;

pub use metrics::{install_recorder, record_escalation, record_ingestion, record_retrieval, record_turn, record_webhook_retry, MetricsHandle};
pub use telemetry::init_tracing;
