//! Note command handlers
//!
//! Handles: note, notes
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0

use anyhow::Result;
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::CommandHandler;
use crate::commands::parser::ParsedCommand;
use crate::features::conversation::{CompletedRequest, Flow, Input};

pub const NO_NOTES: &str = "🗒️ You don't have any notes yet. Save one with /note.";

pub struct NotesHandler;

#[async_trait]
impl CommandHandler for NotesHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["note", "notes"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        owner_id: &str,
        command: &ParsedCommand,
    ) -> Result<Vec<String>> {
        let replies = match command.name.as_str() {
            "note" if command.has_args() => {
                let request = CompletedRequest::SaveNote {
                    text: command.args.clone(),
                };
                vec![ctx.carry_out(owner_id, request).await]
            }
            "note" => ctx.advance(owner_id, Input::Begin(Flow::Note)).await,
            "notes" if command.args.eq_ignore_ascii_case("clear") => {
                vec![Self::clear(&ctx, owner_id)]
            }
            _ => vec![Self::list(&ctx, owner_id)],
        };
        Ok(replies)
    }
}

impl NotesHandler {
    fn list(ctx: &CommandContext, owner_id: &str) -> String {
        let notes = ctx.notes.list(owner_id);
        if notes.is_empty() {
            return NO_NOTES.to_string();
        }
        let zone = ctx.service.default_zone();
        let mut response = format!("🗒️ **Your Notes** ({}):\n", notes.len());
        for (n, note) in notes.iter().enumerate() {
            response.push_str(&format!(
                "\n**{}.** {} _({})_",
                n + 1,
                note.text,
                note.created_at.with_timezone(&zone).format("%Y-%m-%d %H:%M")
            ));
        }
        response
    }

    fn clear(ctx: &CommandContext, owner_id: &str) -> String {
        match ctx.notes.clear(owner_id) {
            Ok(0) => NO_NOTES.to_string(),
            Ok(n) => format!("🧹 Deleted {n} note(s)."),
            Err(e) => {
                warn!("Failed to clear notes of owner {owner_id}: {e:#}");
                "❌ Could not delete your notes, please try again.".to_string()
            }
        }
    }
}
