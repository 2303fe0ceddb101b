#![deny(unused_must_use)]
//! Agent turn orchestration: the three-branch state machine
//! (CONVERSATIONAL / DOMAIN_QUERY / OUT_OF_SCOPE), windowed conversation
//! memory, the combined classify-and-respond call, and message
//! persistence, wired together into a single `handle_turn` entrypoint.

pub mod classifier;
pub mod memory;
pub mod middleware;
pub mod parsing;
pub mod prompts;
pub mod turn;

pub use classifier::IntentClassifier;
pub use memory::{ConversationMemory, MemoryEntry};
pub use middleware::{LanguageMiddleware, NoopMiddleware};
pub use parsing::ClassifyRespond;
pub use turn::{AgentTurnController, TurnOutput};
