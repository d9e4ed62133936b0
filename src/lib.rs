//! Companion chat server with decaying conversational memory and gamified
//! progression.
//!
//! Every chat turn is stored per user and replayed to the completion provider
//! as a context window that fades with age: turns older than three days carry
//! a `[from N days ago]` marker and turns a week old drop out entirely.
//! Activity earns points and XP, multiplied by a daily streak, which level the
//! user up, unlock badges and can be spent in a small shop. A daily oracle
//! (one per UTC day, shared by everyone) and a per-user daily question round
//! things out.
//!
//! # Architecture
//!
//! - **Storage**: SQLite via a single shared connection; each mutating
//!   operation runs in one transaction so partial updates are never visible
//! - **Providers**: OpenAI-compatible chat completions and optional web search,
//!   both behind traits and bounded by timeouts
//! - **Transport**: JSON over HTTP (axum)
//!
//! # Modules
//!
//! - [`config`]: configuration from TOML files and environment variables
//! - [`db`]: database setup, schema, migrations, snapshots and stats
//! - [`memory`]: conversation log and the decayed context window
//! - [`progression`]: points, XP, levels, streaks and badges
//! - [`leaderboard`]: top-10 ranking by points
//! - [`economy`]: shop catalog and purchases
//! - [`daily`]: daily oracle and daily question
//! - [`mood`]: mood journal
//! - [`service`]: the [`service::Kindred`] facade every surface calls
//! - [`api`]: HTTP routes

pub mod api;
pub mod cli;
pub mod clock;
pub mod config;
pub mod daily;
pub mod db;
pub mod economy;
pub mod error;
pub mod leaderboard;
pub mod memory;
pub mod mood;
pub mod progression;
pub mod prompt;
pub mod providers;
pub mod server;
pub mod service;

pub use error::{KindredError, Result};
pub use service::Kindred;
