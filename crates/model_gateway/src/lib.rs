#![deny(unused_must_use)]
//! `LanguageModel` implementations: a `rig-core` backed provider and
//! the composite primary/secondary/rerank capability injected
//! everywhere else.

pub mod composite;
pub mod rerank;
pub mod rig_provider;

pub use composite::CompositeLanguageModel;
pub use rerank::RerankClient;
pub use rig_provider::RigProvider;
