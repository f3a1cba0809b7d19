//! Environment-driven configuration
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Add export targets and AI rate limit settings
//! - 1.0.0: Initial release

use anyhow::{Context, Result};
use chrono_tz::Tz;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Reminder store file
    pub reminders_path: PathBuf,
    /// Note book file
    pub notes_path: PathBuf,
    /// Zone for daily reminders created without an explicit zone
    pub default_timezone: Tz,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub export_dir: Option<PathBuf>,
    pub export_upload_url: Option<String>,
    pub ai_rate_limit: usize,
    pub ai_rate_window: Duration,
}

impl Config {
    /// Load `.env` (if present) and read settings from the environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let default_timezone = match non_empty("DEFAULT_TIMEZONE") {
            Some(name) => parse_timezone(&name)?,
            None => Tz::UTC,
        };

        let ai_rate_limit = match non_empty("AI_RATE_LIMIT") {
            Some(v) => v
                .trim()
                .parse::<usize>()
                .with_context(|| format!("AI_RATE_LIMIT must be a number, got {v:?}"))?,
            None => 10,
        };

        let ai_rate_window_secs = match non_empty("AI_RATE_WINDOW_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("AI_RATE_WINDOW_SECS must be a number, got {v:?}"))?,
            None => 60,
        };

        Ok(Config {
            reminders_path: non_empty("REMINDERS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("reminders.json")),
            notes_path: non_empty("NOTES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("notes.json")),
            default_timezone,
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_model: non_empty("OPENAI_MODEL").unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
            export_dir: non_empty("EXPORT_DIR").map(PathBuf::from),
            export_upload_url: non_empty("EXPORT_UPLOAD_URL"),
            ai_rate_limit,
            ai_rate_window: Duration::from_secs(ai_rate_window_secs),
        })
    }
}

/// Parse an IANA zone name such as `Asia/Baku`
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("Unknown time zone {name:?}: {e}"))
}
