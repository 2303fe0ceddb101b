#![deny(unused_must_use)]
//! Domain layer for the support-agent backend.
//!
//! This crate has no I/O of its own. It holds the entities every other
//! crate shares (`domain`), the capability traits that isolate the core
//! from concrete LLM/vector/kv/relational drivers (`ports`), and the pure
//! functions whose behavior is pinned bit-for-bit: the tokenizer
//! wrapper, the structural chunker, Reciprocal Rank Fusion, and the
//! retrieval confidence formula.

pub mod cache_keys;
pub mod chunker;
pub mod config;
pub mod confidence;
pub mod domain;
pub mod error;
pub mod ports;
pub mod rrf;
pub mod tokenizer;

pub use error::{Error, ErrorKind, Result};
