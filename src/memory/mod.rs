//! Per-user conversation log and its decayed context window.

pub mod decay;
pub mod store;
pub mod types;

pub use decay::build_context;
pub use types::{ContextTurn, DecayPolicy, Freshness, MemoryEntry};
