use anyhow::Result;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use remindbot::assistant::Assistant;
use remindbot::commands::CommandContext;
use remindbot::core::{Config, SystemClock};
use remindbot::features::export::{CloudStorage, HttpUploadStorage, LocalDirectoryStorage};
use remindbot::features::notes::NoteBook;
use remindbot::features::rate_limiting::RateLimiter;
use remindbot::features::reminders::{ReminderService, ReminderStore};
use remindbot::gateway::console::parse_line;
use remindbot::gateway::{ConsoleGateway, OpenAiCompletion};

fn cloud_storage(config: &Config) -> Result<Option<Arc<dyn CloudStorage>>> {
    if let Some(url) = &config.export_upload_url {
        info!("☁️ Exports upload to {url}");
        return Ok(Some(Arc::new(HttpUploadStorage::new(url.clone())?)));
    }
    if let Some(dir) = &config.export_dir {
        info!("☁️ Exports are written to {}", dir.display());
        return Ok(Some(Arc::new(LocalDirectoryStorage::new(dir.clone()))));
    }
    Ok(None)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    info!("Starting reminder assistant (default zone {})...", config.default_timezone);

    let gateway = Arc::new(ConsoleGateway::new());
    let store = ReminderStore::open(&config.reminders_path)?;
    let service = ReminderService::new(
        store,
        Arc::new(SystemClock),
        gateway.clone(),
        config.default_timezone,
    );

    let report = service.recover().await;
    if !report.invalid.is_empty() {
        warn!("Skipped {} unreadable reminder(s): {:?}", report.invalid.len(), report.invalid);
    }

    let notes = NoteBook::open(&config.notes_path)?;
    let mut ctx = CommandContext::new(
        service.clone(),
        notes,
        RateLimiter::new(config.ai_rate_limit, config.ai_rate_window),
    );

    if let Some(key) = &config.openai_api_key {
        // The openai crate reads its credentials from the environment
        std::env::set_var("OPENAI_API_KEY", key);
        std::env::set_var("OPENAI_KEY", key);
        ctx = ctx.with_completion(Arc::new(OpenAiCompletion::new(config.openai_model.clone())));
        info!("🤖 AI replies enabled ({})", config.openai_model);
    } else {
        info!("AI replies disabled (no OPENAI_API_KEY)");
    }

    if let Some(storage) = cloud_storage(&config)? {
        ctx = ctx.with_storage(storage);
    }

    let assistant = Assistant::new(ctx);
    info!("✅ Ready. Send lines as `<owner>: <text>`");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("Input closed");
                        break;
                    }
                    Err(e) => {
                        error!("Failed to read input: {e}");
                        break;
                    }
                };

                let Some(event) = parse_line(&line) else {
                    if !line.trim().is_empty() {
                        warn!("Ignoring line without `<owner>:` prefix");
                    }
                    continue;
                };

                // Handled in arrival order so an owner's flow steps never race
                for reply in assistant.handle(&event).await {
                    if let Err(e) = gateway.print(&event.owner_id, &reply) {
                        error!("Failed to deliver reply to {}: {e:#}", event.owner_id);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    service.shutdown();
    info!("Shut down, reminders stay in {}", config.reminders_path.display());
    Ok(())
}
