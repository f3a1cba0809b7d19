//! # Export Feature
//!
//! Renders an owner's reminders as a plain-text document and hands it to a
//! cloud-storage backend. Exporting never changes any reminder.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0
//! - **Toggleable**: true

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

use crate::core::file_utils::sanitize_filename;
use crate::features::reminders::{describe_schedule, ReminderService, ScheduledReminder};

/// Where exported files end up
#[async_trait]
pub trait CloudStorage: Send + Sync {
    fn name(&self) -> &str;

    /// Store `contents` under `file_name`; returns a location for the owner
    async fn upload(&self, file_name: &str, contents: Vec<u8>) -> Result<String>;
}

/// Writes exports into a local (possibly synced) directory
pub struct LocalDirectoryStorage {
    dir: PathBuf,
}

impl LocalDirectoryStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl CloudStorage for LocalDirectoryStorage {
    fn name(&self) -> &str {
        "local directory"
    }

    async fn upload(&self, file_name: &str, contents: Vec<u8>) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, contents)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path.display().to_string())
    }
}

/// Uploads exports with an HTTP PUT to `<base_url>/<file name>`
pub struct HttpUploadStorage {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUploadStorage {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn target_url(&self, file_name: &str) -> String {
        format!("{}/{}", self.base_url, file_name)
    }
}

#[async_trait]
impl CloudStorage for HttpUploadStorage {
    fn name(&self) -> &str {
        "HTTP upload"
    }

    async fn upload(&self, file_name: &str, contents: Vec<u8>) -> Result<String> {
        let url = self.target_url(file_name);
        let response = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(contents)
            .send()
            .await
            .with_context(|| format!("Upload to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("Upload to {url} returned {status}"));
        }

        // Storage services often answer with a shareable link
        let link = match response.json::<serde_json::Value>().await {
            Ok(json) => ["webViewLink", "url", "link"]
                .iter()
                .find_map(|key| json.get(key).and_then(|v| v.as_str()).map(str::to_string)),
            Err(_) => None,
        };
        Ok(link.unwrap_or(url))
    }
}

/// Result of an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    pub location: String,
    pub reminders: usize,
    pub bytes: usize,
}

/// Plain-text listing of `entries`
pub fn render_reminder_list(
    owner_id: &str,
    entries: &[ScheduledReminder],
    default_zone: Tz,
    now: DateTime<Utc>,
) -> String {
    let mut out = format!(
        "Reminders for {owner_id}\nExported {} UTC\n\n",
        now.format("%Y-%m-%d %H:%M")
    );
    if entries.is_empty() {
        out.push_str("(no active reminders)\n");
        return out;
    }
    for (n, entry) in entries.iter().enumerate() {
        out.push_str(&format!(
            "{}. {}\n   {}\n   id: {}\n",
            n + 1,
            entry.reminder.payload,
            describe_schedule(entry, default_zone, now),
            entry.reminder.id
        ));
    }
    out
}

pub fn export_file_name(owner_id: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}.txt",
        sanitize_filename(&format!("reminders-{owner_id}-{}", now.format("%Y%m%d-%H%M%S")))
    )
}

/// Render the owner's reminders and upload them
pub async fn export_reminders(
    storage: &dyn CloudStorage,
    service: &ReminderService,
    owner_id: &str,
) -> Result<ExportReceipt> {
    let now = service.now();
    let entries = service.list(owner_id).await;
    let document = render_reminder_list(owner_id, &entries, service.default_zone(), now);
    let bytes = document.len();
    let file_name = export_file_name(owner_id, now);

    match storage.upload(&file_name, document.into_bytes()).await {
        Ok(location) => {
            info!(
                "📤 Exported {} reminder(s) for owner {owner_id} to {} ({location})",
                entries.len(),
                storage.name()
            );
            Ok(ExportReceipt {
                location,
                reminders: entries.len(),
                bytes,
            })
        }
        Err(e) => {
            warn!("Export for owner {owner_id} via {} failed: {e:#}", storage.name());
            Err(e)
        }
    }
}
