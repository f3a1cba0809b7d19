//! Reminder command handlers
//!
//! Handles: remind, schedule, in, reminders, forget, cancel
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: Daily, dated and delayed reminders with step-by-step flows
//! - 1.0.0: Extracted from command_handler.rs

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::CommandHandler;
use crate::commands::parser::{split_first, ParsedCommand};
use crate::core::response::preview;
use crate::features::conversation::{CompletedRequest, Flow, Input};
use crate::features::reminders::{describe_schedule, parse_duration, OnceTarget, ReminderSpec};

pub const REMIND_USAGE: &str =
    "❌ Usage: `/remind HH:MM text`, e.g. `/remind 09:00 stand-up` or `/remind 09:00@Asia/Baku stand-up`.";
pub const SCHEDULE_USAGE: &str =
    "❌ Usage: `/schedule YYYY-MM-DD HH:MM text`, e.g. `/schedule 2025-07-25 15:30 call mom`.";
pub const IN_USAGE: &str = "❌ Usage: `/in <delay> text`, e.g. `/in 1h30m take the cake out`.";
pub const NO_REMINDERS: &str = "📋 You don't have any reminders. Create one with /remind, /schedule or /in.";

/// Handler for reminder-related commands
pub struct RemindHandler;

#[async_trait]
impl CommandHandler for RemindHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["remind", "schedule", "in", "reminders", "forget", "cancel"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        owner_id: &str,
        command: &ParsedCommand,
    ) -> Result<Vec<String>> {
        debug!("Reminder command /{} from owner {owner_id}", command.name);
        let replies = match command.name.as_str() {
            "remind" => self.handle_remind(&ctx, owner_id, command).await,
            "schedule" => self.handle_schedule(&ctx, owner_id, command).await,
            "in" => self.handle_in(&ctx, owner_id, command).await,
            "reminders" => self.handle_reminders(&ctx, owner_id).await,
            "forget" => self.handle_forget(&ctx, owner_id, command).await,
            "cancel" => ctx.advance(owner_id, Input::Cancel).await,
            _ => Vec::new(),
        };
        Ok(replies)
    }
}

impl RemindHandler {
    /// Handle /remind - daily reminder
    async fn handle_remind(
        &self,
        ctx: &CommandContext,
        owner_id: &str,
        command: &ParsedCommand,
    ) -> Vec<String> {
        if !command.has_args() {
            return ctx.advance(owner_id, Input::Begin(Flow::DailyReminder)).await;
        }
        match Self::parse_remind_args(&command.args) {
            Some(spec) => vec![ctx.carry_out(owner_id, CompletedRequest::CreateReminder(spec)).await],
            None => vec![REMIND_USAGE.to_string()],
        }
    }

    /// `HH:MM text` or `HH:MM@Zone/Name text`
    ///
    /// The time and zone are validated by the reminder service.
    fn parse_remind_args(args: &str) -> Option<ReminderSpec> {
        let (when, text) = split_first(args)?;
        if text.is_empty() {
            return None;
        }
        let spec = match when.split_once('@') {
            Some((time, zone)) => ReminderSpec::daily_in(time, zone, text),
            None => ReminderSpec::daily(when, text),
        };
        Some(spec)
    }

    /// Handle /schedule - one-shot at a local date and time
    async fn handle_schedule(
        &self,
        ctx: &CommandContext,
        owner_id: &str,
        command: &ParsedCommand,
    ) -> Vec<String> {
        if !command.has_args() {
            return ctx.advance(owner_id, Input::Begin(Flow::OnceReminder)).await;
        }
        match Self::parse_schedule_args(&command.args) {
            Some(spec) => vec![ctx.carry_out(owner_id, CompletedRequest::CreateReminder(spec)).await],
            None => vec![SCHEDULE_USAGE.to_string()],
        }
    }

    fn parse_schedule_args(args: &str) -> Option<ReminderSpec> {
        let (date, rest) = split_first(args)?;
        let (time, text) = split_first(rest)?;
        if text.is_empty() {
            return None;
        }
        Some(ReminderSpec::Once {
            target: OnceTarget::Local(format!("{date} {time}")),
            text: text.to_string(),
        })
    }

    /// Handle /in - one-shot after a delay
    async fn handle_in(&self, ctx: &CommandContext, owner_id: &str, command: &ParsedCommand) -> Vec<String> {
        if !command.has_args() {
            return ctx.advance(owner_id, Input::Begin(Flow::DelayedReminder)).await;
        }
        let spec = command.split_first().and_then(|(delay, text)| {
            let seconds = parse_duration(delay)?;
            (!text.is_empty()).then(|| ReminderSpec::after_seconds(seconds, text))
        });
        match spec {
            Some(spec) => vec![ctx.carry_out(owner_id, CompletedRequest::CreateReminder(spec)).await],
            None => vec![IN_USAGE.to_string()],
        }
    }

    /// Handle /reminders - list active reminders, soonest first
    async fn handle_reminders(&self, ctx: &CommandContext, owner_id: &str) -> Vec<String> {
        let entries = ctx.service.list(owner_id).await;
        if entries.is_empty() {
            return vec![NO_REMINDERS.to_string()];
        }

        let now = ctx.service.now();
        let zone = ctx.service.default_zone();
        let mut response = format!("⏰ **Your Reminders** ({}):\n", entries.len());
        for (n, entry) in entries.iter().enumerate() {
            response.push_str(&format!(
                "\n**{}.** {}\n   {}\n   🆔 `{}`",
                n + 1,
                preview(&entry.reminder.payload),
                describe_schedule(entry, zone, now),
                entry.reminder.id
            ));
        }
        response.push_str("\n\nDelete one with `/forget <id>` or just `/forget`.");
        vec![response]
    }

    /// Handle /forget - cancel by id, or pick from a numbered list
    async fn handle_forget(
        &self,
        ctx: &CommandContext,
        owner_id: &str,
        command: &ParsedCommand,
    ) -> Vec<String> {
        match command.split_first() {
            Some((id, _)) => {
                let id = id.trim_matches('`').to_string();
                vec![ctx.carry_out(owner_id, CompletedRequest::CancelReminder { id }).await]
            }
            None => ctx.begin_deletion(owner_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::testing::{fixture, fixture_with};
    use crate::commands::parser::parse_command;
    use crate::features::conversation::{prompts, ConversationState};
    use std::time::Duration;

    async fn run(ctx: &Arc<CommandContext>, text: &str) -> Vec<String> {
        RemindHandler
            .handle(ctx.clone(), "42", &parse_command(text).unwrap())
            .await
            .unwrap()
    }

    #[test]
    fn test_remind_handler_commands() {
        let handler = RemindHandler;
        let names = handler.command_names();
        for name in ["remind", "schedule", "in", "reminders", "forget", "cancel"] {
            assert!(names.contains(&name));
        }
    }

    #[test]
    fn test_parse_remind_args() {
        assert_eq!(
            RemindHandler::parse_remind_args("09:00 stand-up meeting"),
            Some(ReminderSpec::daily("09:00", "stand-up meeting"))
        );
        assert_eq!(
            RemindHandler::parse_remind_args("09:00@Asia/Baku stand-up"),
            Some(ReminderSpec::daily_in("09:00", "Asia/Baku", "stand-up"))
        );
        assert_eq!(RemindHandler::parse_remind_args("09:00"), None);
    }

    #[test]
    fn test_parse_schedule_args() {
        assert_eq!(
            RemindHandler::parse_schedule_args("2025-06-04 15:30 call mom"),
            Some(ReminderSpec::Once {
                target: OnceTarget::Local("2025-06-04 15:30".to_string()),
                text: "call mom".to_string(),
            })
        );
        assert_eq!(RemindHandler::parse_schedule_args("2025-06-04 15:30"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remind_with_zone() {
        let f = fixture();
        let replies = run(&f.ctx, "/remind 09:00@Asia/Baku stand-up").await;
        assert!(replies[0].contains("every day at 09:00 (Asia/Baku), next in 2 hours"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remind_bad_time_is_rejected() {
        let f = fixture();
        let replies = run(&f.ctx, "/remind 9am stand-up").await;
        assert!(replies[0].starts_with("❌"));
        assert!(f.ctx.service.list("42").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remind_without_args_starts_flow() {
        let f = fixture();
        let replies = run(&f.ctx, "/remind").await;
        assert_eq!(replies, vec![prompts::ASK_TIME.to_string()]);
        assert_eq!(
            f.ctx.conversations.state("42"),
            ConversationState::AwaitingReminderTime
        );

        let replies = run(&f.ctx, "/cancel").await;
        assert_eq!(replies, vec![prompts::CANCELLED.to_string()]);
        assert!(!f.ctx.conversations.is_active("42"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_in_default_zone() {
        let f = fixture_with(chrono_tz::Asia::Baku, |ctx| ctx);
        let replies = run(&f.ctx, "/schedule 2025-06-04 15:30 dentist").await;
        assert!(replies[0].contains("once on 2025-06-04 15:30 (Asia/Baku)"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_in_the_past_is_rejected() {
        let f = fixture();
        let replies = run(&f.ctx, "/schedule 2025-05-01 10:00 too late").await;
        assert!(replies[0].starts_with("❌"));
        assert!(f.ctx.service.list("42").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_fires_after_delay() {
        let f = fixture();
        let replies = run(&f.ctx, "/in 30m stretch").await;
        assert!(replies[0].contains("in 30 minutes"));
        assert_eq!(run(&f.ctx, "/in soon stretch").await, vec![IN_USAGE.to_string()]);

        tokio::time::sleep(Duration::from_secs(30 * 60 + 1)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(f.notifier.sent_to("42"), vec!["stretch".to_string()]);
        assert!(f.ctx.service.list("42").await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_and_forget_by_id() {
        let f = fixture();
        assert_eq!(run(&f.ctx, "/reminders").await, vec![NO_REMINDERS.to_string()]);

        run(&f.ctx, "/in 2h later").await;
        run(&f.ctx, "/in 1h sooner").await;
        let listing = run(&f.ctx, "/reminders").await.remove(0);
        let sooner = listing.find("sooner").unwrap();
        let later = listing.find("later").unwrap();
        assert!(sooner < later);

        let id = f.ctx.service.list("42").await[0].reminder.id.clone();
        let replies = run(&f.ctx, &format!("/forget `{id}`")).await;
        assert_eq!(replies, vec!["🗑️ Deleted reminder: sooner".to_string()]);
        assert_eq!(f.ctx.service.list("42").await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forget_without_reminders() {
        let f = fixture();
        assert_eq!(
            run(&f.ctx, "/forget").await,
            vec![prompts::NOTHING_TO_DELETE.to_string()]
        );
    }
}
