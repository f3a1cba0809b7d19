//! # Assistant
//!
//! Routes each inbound message: commands go to the registry, text inside a
//! flow goes to the conversation engine, anything else to the AI
//! collaborator.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use log::{debug, error};
use std::sync::Arc;

use crate::commands::{default_registry, parse_command, CommandContext, CommandRegistry};
use crate::features::conversation::Input;
use crate::gateway::InboundEvent;

pub const UNKNOWN_COMMAND: &str = "❓ I don't know that command. Send /help to see what I can do.";
const HANDLER_FAILED: &str = "❌ Something went wrong, please try again.";

#[derive(Clone)]
pub struct Assistant {
    ctx: Arc<CommandContext>,
    registry: CommandRegistry,
}

impl Assistant {
    pub fn new(ctx: CommandContext) -> Self {
        Self::with_registry(Arc::new(ctx), default_registry())
    }

    pub fn with_registry(ctx: Arc<CommandContext>, registry: CommandRegistry) -> Self {
        Self { ctx, registry }
    }

    pub fn context(&self) -> &Arc<CommandContext> {
        &self.ctx
    }

    /// Replies to send back to the owner, in order
    pub async fn handle(&self, event: &InboundEvent) -> Vec<String> {
        let owner_id = event.owner_id.as_str();

        if let Some(command) = parse_command(&event.text) {
            debug!("Owner {owner_id} sent /{}", command.name);
            return match self
                .registry
                .dispatch(Arc::clone(&self.ctx), owner_id, &command)
                .await
            {
                Some(Ok(replies)) => replies,
                Some(Err(e)) => {
                    error!("Command /{} for owner {owner_id} failed: {e:#}", command.name);
                    vec![HANDLER_FAILED.to_string()]
                }
                None => vec![UNKNOWN_COMMAND.to_string()],
            };
        }

        let text = event.text.trim();
        if self.ctx.conversations.is_active(owner_id) {
            return self.ctx.advance(owner_id, Input::Text(text.to_string())).await;
        }

        if text.is_empty() {
            return Vec::new();
        }
        vec![self.ctx.ai_reply(owner_id, text).await]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::testing::fixture;
    use crate::commands::context::AI_DISABLED_HINT;
    use crate::features::conversation::prompts;
    use std::time::Duration;

    async fn say(assistant: &Assistant, owner: &str, text: &str) -> Vec<String> {
        assistant.handle(&InboundEvent::new(owner, text)).await
    }

    fn assistant(f: &crate::commands::context::testing::Fixture) -> Assistant {
        Assistant::with_registry(f.ctx.clone(), default_registry())
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_command_and_free_text() {
        let f = fixture();
        let a = assistant(&f);
        assert_eq!(say(&a, "42", "/calc 2+2").await, vec![UNKNOWN_COMMAND.to_string()]);
        assert_eq!(say(&a, "42", "hello").await, vec![AI_DISABLED_HINT.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_daily_flow_end_to_end() {
        let f = fixture();
        let a = assistant(&f);

        assert_eq!(say(&a, "42", "/remind").await, vec![prompts::ASK_TIME.to_string()]);
        assert_eq!(say(&a, "42", "nine").await, vec![prompts::RETRY_TIME.to_string()]);
        assert_eq!(
            say(&a, "42", "09:00 Asia/Baku").await,
            vec![prompts::ASK_TEXT.to_string()]
        );
        let done = say(&a, "42", "stand-up").await;
        assert_eq!(done.len(), 1);
        assert!(done[0].contains("every day at 09:00 (Asia/Baku), next in 2 hours"));
        assert!(!f.ctx.conversations.is_active("42"));

        tokio::time::sleep(Duration::from_secs(2 * 3600 + 5)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(f.notifier.sent_to("42"), vec!["stand-up".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_replaces_flow() {
        let f = fixture();
        let a = assistant(&f);

        say(&a, "42", "/schedule").await;
        assert_eq!(say(&a, "42", "/in").await, vec![prompts::ASK_DELAY.to_string()]);
        say(&a, "42", "10m").await;
        let done = say(&a, "42", "tea").await;
        assert!(done[0].contains("in 10 minutes"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_owners_are_independent() {
        let f = fixture();
        let a = assistant(&f);

        say(&a, "1", "/note").await;
        assert_eq!(say(&a, "2", "hello").await, vec![AI_DISABLED_HINT.to_string()]);
        say(&a, "1", "remember the keys").await;
        assert_eq!(f.ctx.notes.list("1").len(), 1);
        assert!(f.ctx.notes.list("2").is_empty());
    }
}
