//! Utility command handlers
//!
//! Handles: start, help
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: Greeting and usage text for the reminder assistant
//! - 1.0.0: Extracted from command_handler.rs

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::CommandHandler;
use crate::commands::parser::ParsedCommand;

pub const GREETING: &str = "👋 Hi! I'm your reminder assistant. I can remind you every day at a fixed time, once at a given moment, or after a delay. Send /help to see how.";

pub const HELP_TEXT: &str = r#"**Available Commands:**
`/remind HH:MM text` - Remind me every day (add `@Zone/Name` to the time for another time zone, e.g. `09:00@Asia/Baku`)
`/schedule YYYY-MM-DD HH:MM text` - Remind me once at that date and time
`/in 1h30m text` - Remind me once after a delay (`s`, `m`, `h`, `d`, `w`)
`/reminders` - List my reminders
`/forget [id]` - Delete a reminder (without an id you get a numbered list)
`/note [text]` - Save a note
`/notes` - List my notes (`/notes clear` deletes them)
`/export` - Export my reminders to cloud storage
`/cancel` - Abort the current step
`/help` - Show this help message

Commands without arguments ask for the missing details step by step."#;

/// Handler for utility commands: start, help
pub struct UtilityHandler;

#[async_trait]
impl CommandHandler for UtilityHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["start", "help"]
    }

    async fn handle(
        &self,
        _ctx: Arc<CommandContext>,
        owner_id: &str,
        command: &ParsedCommand,
    ) -> Result<Vec<String>> {
        let reply = match command.name.as_str() {
            "start" => {
                info!("Owner {owner_id} started a session");
                GREETING
            }
            _ => HELP_TEXT,
        };
        Ok(vec![reply.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::testing::fixture;
    use crate::commands::parser::parse_command;

    #[test]
    fn test_utility_handler_commands() {
        let handler = UtilityHandler;
        assert_eq!(handler.command_names(), &["start", "help"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_help_mentions_every_command() {
        let f = fixture();
        let replies = UtilityHandler
            .handle(f.ctx.clone(), "42", &parse_command("/help").unwrap())
            .await
            .unwrap();
        for cmd in ["/remind", "/schedule", "/in", "/reminders", "/forget", "/note", "/notes", "/export", "/cancel"] {
            assert!(replies[0].contains(cmd), "help is missing {cmd}");
        }
    }
}
