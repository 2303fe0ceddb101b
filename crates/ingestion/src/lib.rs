#![deny(unused_must_use)]
//! Document ingestion pipeline: parse -> chunk -> enrich -> embed -> store.

pub mod metadata;
pub mod parser;
pub mod pipeline;

pub use parser::{DocumentParser, PlainTextParser};
pub use pipeline::IngestionPipeline;
pub use support_agent_core::cache_keys::bm25_cache_key;
