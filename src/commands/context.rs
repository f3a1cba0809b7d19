//! Shared context for command handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: Reminder service, conversations, notes, export and AI collaborators
//! - 1.0.0: Initial implementation with core shared state

use log::{info, warn};
use std::sync::Arc;

use crate::core::response::preview;
use crate::features::conversation::{
    CompletedRequest, ConversationEngine, DeletionChoice, Flow, Input,
};
use crate::features::export::CloudStorage;
use crate::features::notes::NoteBook;
use crate::features::rate_limiting::RateLimiter;
use crate::features::reminders::{describe_schedule, ReminderService, ReminderSpec};
use crate::gateway::CompletionClient;

pub const AI_DISABLED_HINT: &str =
    "🤖 I only understand commands right now. Send /help to see what I can do.";

/// Shared context for all command handlers
///
/// Contains the services most handlers need:
/// - ReminderService for creating, listing and cancelling reminders
/// - ConversationEngine for multi-step input flows
/// - NoteBook for notes
/// - Optional cloud storage for exports and AI completion for free text
pub struct CommandContext {
    pub service: ReminderService,
    pub conversations: ConversationEngine,
    pub notes: NoteBook,
    pub rate_limiter: RateLimiter,
    pub storage: Option<Arc<dyn CloudStorage>>,
    pub completion: Option<Arc<dyn CompletionClient>>,
}

impl CommandContext {
    pub fn new(service: ReminderService, notes: NoteBook, rate_limiter: RateLimiter) -> Self {
        Self {
            service,
            conversations: ConversationEngine::new(),
            notes,
            rate_limiter,
            storage: None,
            completion: None,
        }
    }

    pub fn with_storage(mut self, storage: Arc<dyn CloudStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_completion(mut self, completion: Arc<dyn CompletionClient>) -> Self {
        self.completion = Some(completion);
        self
    }

    /// Feed one input to the owner's conversation and carry out whatever it completes
    pub async fn advance(&self, owner_id: &str, input: Input) -> Vec<String> {
        let transition = self.conversations.advance(owner_id, input);
        let mut replies = Vec::new();
        if let Some(request) = transition.request {
            replies.push(self.carry_out(owner_id, request).await);
        }
        if let Some(prompt) = transition.prompt {
            replies.push(prompt);
        }
        replies
    }

    /// Execute a completed request and describe the outcome
    pub async fn carry_out(&self, owner_id: &str, request: CompletedRequest) -> String {
        match request {
            CompletedRequest::CreateReminder(spec) => self.create_reminder(owner_id, spec).await,
            CompletedRequest::CancelReminder { id } => {
                match self.service.cancel(owner_id, &id).await {
                    Ok(record) => format!("🗑️ Deleted reminder: {}", preview(&record.text)),
                    Err(e) => e.user_message(),
                }
            }
            CompletedRequest::SaveNote { text } => {
                match self.notes.add(owner_id, &text, self.service.now()) {
                    Ok(count) => format!("🗒️ Note saved. You have {count} note(s)."),
                    Err(e) => {
                        warn!("Failed to save note for owner {owner_id}: {e:#}");
                        "❌ Could not save the note, please try again.".to_string()
                    }
                }
            }
        }
    }

    async fn create_reminder(&self, owner_id: &str, spec: ReminderSpec) -> String {
        let text = preview(spec.text());
        let id = match self.service.create(owner_id, spec).await {
            Ok(id) => id,
            Err(e) => return e.user_message(),
        };

        let now = self.service.now();
        let schedule = self
            .service
            .list(owner_id)
            .await
            .into_iter()
            .find(|entry| entry.reminder.id == id)
            .map(|entry| describe_schedule(&entry, self.service.default_zone(), now));

        match schedule {
            Some(schedule) => format!("✅ Reminder set: {schedule}\n📝 {text}\n🆔 `{id}`"),
            // A reminder due right away may already have fired
            None => format!("✅ Reminder set: {text}\n🆔 `{id}`"),
        }
    }

    /// Numbered deletion menu entries for the owner's reminders
    pub async fn deletion_choices(&self, owner_id: &str) -> Vec<DeletionChoice> {
        let now = self.service.now();
        let zone = self.service.default_zone();
        self.service
            .list(owner_id)
            .await
            .into_iter()
            .map(|entry| DeletionChoice {
                label: format!(
                    "{} ({})",
                    preview(&entry.reminder.payload),
                    describe_schedule(&entry, zone, now)
                ),
                id: entry.reminder.id,
            })
            .collect()
    }

    pub async fn begin_deletion(&self, owner_id: &str) -> Vec<String> {
        let choices = self.deletion_choices(owner_id).await;
        self.advance(owner_id, Input::Begin(Flow::Deletion { choices }))
            .await
    }

    /// Free-form reply from the AI collaborator, rate limited per owner
    pub async fn ai_reply(&self, owner_id: &str, text: &str) -> String {
        let Some(completion) = &self.completion else {
            return AI_DISABLED_HINT.to_string();
        };

        if !self.rate_limiter.check(owner_id) {
            let wait = self
                .rate_limiter
                .retry_after(owner_id)
                .map(|d| d.as_secs().max(1))
                .unwrap_or(1);
            info!("AI request from owner {owner_id} rate limited for {wait}s");
            return format!("⏳ Slow down a little, try again in {wait} s.");
        }

        match completion.complete(owner_id, text).await {
            Ok(reply) if !reply.is_empty() => reply,
            Ok(_) => "🤖 I have nothing to say to that.".to_string(),
            Err(e) => {
                warn!("AI completion for owner {owner_id} failed: {e:#}");
                "❌ The assistant is unavailable right now, please try again later.".to_string()
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;

    struct EchoCompletion;

    #[async_trait]
    impl CompletionClient for EchoCompletion {
        async fn complete(&self, _owner_id: &str, prompt: &str) -> Result<String> {
            Ok(format!("echo: {prompt}"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_carry_out_create_describes_schedule() {
        let f = fixture();
        let reply = f
            .ctx
            .carry_out("42", CompletedRequest::CreateReminder(ReminderSpec::daily("09:00", "water")))
            .await;
        assert!(reply.starts_with("✅ Reminder set: every day at 09:00 (UTC), next in 6 hours"));
        assert!(reply.contains("📝 water"));
        assert!(reply.contains("🆔 `daily_42_0900_"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_carry_out_reports_validation() {
        let f = fixture();
        let reply = f
            .ctx
            .carry_out("42", CompletedRequest::CreateReminder(ReminderSpec::daily("25:00", "x")))
            .await;
        assert!(reply.starts_with("❌"));
        assert!(f.ctx.service.list("42").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_carry_out_unknown_cancel() {
        let f = fixture();
        let reply = f
            .ctx
            .carry_out("42", CompletedRequest::CancelReminder { id: "nope".to_string() })
            .await;
        assert_eq!(reply, "❌ Reminder `nope` not found.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_deletion_menu_lists_reminders() {
        let f = fixture();
        f.ctx
            .service
            .create("42", ReminderSpec::daily("09:00", "water"))
            .await
            .unwrap();
        let replies = f.ctx.begin_deletion("42").await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("**1.** water (every day at 09:00 (UTC)"));

        let replies = f.ctx.advance("42", Input::Text("1".to_string())).await;
        assert_eq!(replies, vec!["🗑️ Deleted reminder: water".to_string()]);
        assert!(f.ctx.service.list("42").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ai_reply_disabled() {
        let f = fixture();
        assert_eq!(f.ctx.ai_reply("42", "hi").await, AI_DISABLED_HINT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ai_reply_rate_limited() {
        let f = fixture_with(chrono_tz::Tz::UTC, |ctx| {
            ctx.with_completion(Arc::new(EchoCompletion))
        });
        assert_eq!(f.ctx.ai_reply("42", "one").await, "echo: one");
        assert_eq!(f.ctx.ai_reply("42", "two").await, "echo: two");
        assert!(f.ctx.ai_reply("42", "three").await.starts_with("⏳"));
        assert_eq!(f.ctx.ai_reply("7", "other").await, "echo: other");
    }
}
