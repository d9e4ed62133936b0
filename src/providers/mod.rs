//! External collaborators: chat completion and web search.
//!
//! Both sit behind traits so the engine can run against the OpenAI-compatible
//! client, the echo fallback, or test doubles. Every call made by the service
//! goes through [`bounded`], so a provider that hangs resolves to
//! [`KindredError::Upstream`] instead of blocking the request.

pub mod echo;
pub mod openai;
pub mod search;

use async_trait::async_trait;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{CompletionConfig, SearchConfig};
use crate::error::{KindredError, Result};
use crate::memory::ContextTurn;

pub use echo::EchoProvider;
pub use openai::OpenAiClient;
pub use search::HttpSearchProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in the conversation sent upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Flatten a decayed context window plus the new message into chat turns.
pub fn turns_from_context(context: &[ContextTurn], message: &str) -> Vec<ChatTurn> {
    let mut turns = Vec::with_capacity(context.len() * 2 + 1);
    for turn in context {
        turns.push(ChatTurn::user(turn.user_text.clone()));
        turns.push(ChatTurn::assistant(turn.bot_text.clone()));
    }
    turns.push(ChatTurn::user(message));
    turns
}

#[async_trait]
pub trait ChatCompletionProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Whether replies are real generated content. Providers that only
    /// mirror their input return `false` so daily content uses fixed pools.
    fn generates_content(&self) -> bool {
        true
    }

    /// Produce the assistant reply. Fails with `Upstream` on any non-success.
    async fn complete(&self, system_prompt: &str, turns: &[ChatTurn]) -> Result<String>;
}

#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    /// Best-effort lookup. Returns an empty string on any failure.
    async fn search(&self, query: &str) -> String;
}

/// Run a provider future under a hard deadline.
pub async fn bounded<T, F>(limit: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(call = %what, limit_ms = limit.as_millis() as u64, "provider call timed out");
            Err(KindredError::Upstream(format!("{what} timed out")))
        }
    }
}

/// Create the completion provider from config: the OpenAI-compatible client
/// when an API key is configured, the echo provider otherwise.
pub fn create_completion_provider(config: &CompletionConfig) -> Result<Arc<dyn ChatCompletionProvider>> {
    match config.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => Ok(Arc::new(OpenAiClient::new(config, key)?)),
        _ => {
            tracing::warn!("no completion API key configured, using echo provider");
            Ok(Arc::new(EchoProvider))
        }
    }
}

/// Create the search provider, or `None` when search is disabled.
pub fn create_search_provider(config: &SearchConfig) -> Result<Option<Arc<dyn WebSearchProvider>>> {
    if !config.enabled {
        return Ok(None);
    }
    Ok(Some(Arc::new(HttpSearchProvider::new(config)?)))
}
