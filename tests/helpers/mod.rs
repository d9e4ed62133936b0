#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use kindred::clock::FixedClock;
use kindred::config::KindredConfig;
use kindred::db;
use kindred::error::{KindredError, Result};
use kindred::providers::{ChatCompletionProvider, ChatTurn};
use kindred::Kindred;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ADMIN_SECRET: &str = "let-me-in";

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_in_memory().unwrap()
}

/// 10:00 UTC on the given day of June 2026.
pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, d, 10, 0, 0).unwrap()
}

pub fn test_config() -> KindredConfig {
    let mut config = KindredConfig::default();
    config.server.admin_token = Some(ADMIN_SECRET.to_string());
    config.completion.timeout_secs = 1;
    config
}

/// Build a service over an in-memory store with a controllable clock.
pub fn service(provider: Arc<dyn ChatCompletionProvider>, clock: Arc<FixedClock>) -> Kindred {
    Kindred::new(
        db::shared(test_db()),
        provider,
        None,
        Arc::new(test_config()),
    )
    .with_clock(clock)
}

/// Always replies with the same text and records every conversation it sees.
pub struct ScriptedProvider {
    reply: String,
    pub seen: Mutex<Vec<Vec<ChatTurn>>>,
}

impl ScriptedProvider {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn last_turns(&self) -> Vec<ChatTurn> {
        self.seen.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatCompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _system_prompt: &str, turns: &[ChatTurn]) -> Result<String> {
        self.seen.lock().unwrap().push(turns.to_vec());
        Ok(self.reply.clone())
    }
}

/// Fails every call.
pub struct FailingProvider;

#[async_trait]
impl ChatCompletionProvider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _system_prompt: &str, _turns: &[ChatTurn]) -> Result<String> {
        Err(KindredError::Upstream("provider returned 503".into()))
    }
}

/// Never answers within any reasonable deadline.
pub struct HangingProvider;

#[async_trait]
impl ChatCompletionProvider for HangingProvider {
    fn name(&self) -> &str {
        "hanging"
    }

    async fn complete(&self, _system_prompt: &str, _turns: &[ChatTurn]) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok("too late".into())
    }
}

/// Replies after a fixed delay, counting calls.
pub struct SlowProvider {
    reply: String,
    delay: Duration,
    pub calls: Mutex<usize>,
}

impl SlowProvider {
    pub fn new(reply: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            delay,
            calls: Mutex::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ChatCompletionProvider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn complete(&self, _system_prompt: &str, _turns: &[ChatTurn]) -> Result<String> {
        *self.calls.lock().unwrap() += 1;
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.clone())
    }
}
