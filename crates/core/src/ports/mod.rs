//! Capability traits that isolate the domain from concrete drivers.
//!
//! Every adapter in `support_agent_store` / `support_agent_model_gateway`
//! implements one of these; the domain crates only ever hold
//! `Arc<dyn Trait>`, injected at construction rather than reached via a
//! process-global client.

mod kv_store;
mod language_model;
mod relational_store;
mod vector_index;

pub use kv_store::KeyValueStore;
pub use language_model::{ChatMessage, ChatRole, GenerateRequest, GenerateResponse, LanguageModel};
pub use relational_store::RelationalStore;
pub use vector_index::{
    ScoredPoint, UpsertPoint, VectorFilter, VectorIndex,
};
