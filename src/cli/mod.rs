//! Operator commands run outside the HTTP server.

pub mod export;
pub mod import;
pub mod inspect;
pub mod reset;
pub mod stats;
