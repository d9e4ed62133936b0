use async_trait::async_trait;

use super::{ChatCompletionProvider, ChatRole, ChatTurn};
use crate::error::Result;

/// Offline stand-in used when no completion API key is configured. Keeps the
/// chat surface usable by echoing the latest user message.
pub struct EchoProvider;

#[async_trait]
impl ChatCompletionProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    fn generates_content(&self) -> bool {
        false
    }

    async fn complete(&self, _system_prompt: &str, turns: &[ChatTurn]) -> Result<String> {
        let message = turns
            .iter()
            .rev()
            .find(|t| t.role == ChatRole::User)
            .map(|t| t.content.as_str())
            .unwrap_or_default();
        Ok(format!("AI (mock): I heard: \"{message}\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_latest_user_turn() {
        let turns = vec![
            ChatTurn::user("first"),
            ChatTurn::assistant("reply"),
            ChatTurn::user("second"),
        ];
        let reply = EchoProvider.complete("sys", &turns).await.unwrap();
        assert_eq!(reply, "AI (mock): I heard: \"second\"");
    }
}
