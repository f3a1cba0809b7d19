//! Export command handler
//!
//! Handles: export
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::CommandHandler;
use crate::commands::parser::ParsedCommand;
use crate::core::file_utils::format_file_size;
use crate::features::export::export_reminders;

pub const EXPORT_DISABLED: &str = "☁️ Export is not configured on this assistant.";

pub struct ExportHandler;

#[async_trait]
impl CommandHandler for ExportHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["export"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        owner_id: &str,
        _command: &ParsedCommand,
    ) -> Result<Vec<String>> {
        let Some(storage) = &ctx.storage else {
            return Ok(vec![EXPORT_DISABLED.to_string()]);
        };

        let reply = match export_reminders(storage.as_ref(), &ctx.service, owner_id).await {
            Ok(receipt) => format!(
                "📤 Exported {} reminder(s) ({}) to {}",
                receipt.reminders,
                format_file_size(receipt.bytes as u64),
                receipt.location
            ),
            Err(_) => "❌ Export failed, your reminders are unchanged. Please try again later."
                .to_string(),
        };
        Ok(vec![reply])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::testing::{fixture, fixture_with};
    use crate::commands::parser::parse_command;
    use crate::features::export::LocalDirectoryStorage;
    use crate::features::reminders::ReminderSpec;

    #[tokio::test(start_paused = true)]
    async fn test_export_disabled() {
        let f = fixture();
        let replies = ExportHandler
            .handle(f.ctx.clone(), "42", &parse_command("/export").unwrap())
            .await
            .unwrap();
        assert_eq!(replies, vec![EXPORT_DISABLED.to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_to_directory() {
        let out = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalDirectoryStorage::new(out.path()));
        let f = fixture_with(chrono_tz::Tz::UTC, |ctx| ctx.with_storage(storage));
        f.ctx
            .service
            .create("42", ReminderSpec::daily("09:00", "water"))
            .await
            .unwrap();

        let replies = ExportHandler
            .handle(f.ctx.clone(), "42", &parse_command("/export").unwrap())
            .await
            .unwrap();
        assert!(replies[0].starts_with("📤 Exported 1 reminder(s)"));

        let exported = std::fs::read_dir(out.path()).unwrap().count();
        assert_eq!(exported, 1);
        assert_eq!(f.ctx.service.list("42").await.len(), 1);
    }
}
