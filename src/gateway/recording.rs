//! In-memory notifier that keeps every delivery

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

use super::Notifier;

/// Collects `(owner, text)` pairs instead of sending them anywhere
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    pub fn sent_to(&self, owner_id: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(owner, _)| owner == owner_id)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, owner_id: &str, text: &str) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("recording notifier lock poisoned"))?
            .push((owner_id.to_string(), text.to_string()));
        Ok(())
    }
}
