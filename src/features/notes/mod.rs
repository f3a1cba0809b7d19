//! # Notes Feature
//!
//! Per-owner note book persisted as one JSON document, written with the same
//! staged write and rename as the reminder store.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0
//! - **Toggleable**: false

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::core::file_utils::{ensure_parent_dir, read_json_or_default, write_json_atomic};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
    pub created_at: DateTime<Utc>,
}

type NoteMap = BTreeMap<String, Vec<Note>>;

pub struct NoteBook {
    path: PathBuf,
    notes: Mutex<NoteMap>,
}

impl NoteBook {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_parent_dir(&path)?;
        let notes: NoteMap = read_json_or_default(&path)?;
        info!("📂 Loaded notes for {} owner(s) from {}", notes.len(), path.display());
        Ok(Self {
            path,
            notes: Mutex::new(notes),
        })
    }

    /// Append a note. Returns how many notes the owner now has.
    pub fn add(&self, owner_id: &str, text: &str, at: DateTime<Utc>) -> Result<usize> {
        let text = text.trim();
        if text.is_empty() {
            return Err(anyhow::anyhow!("Note text cannot be empty"));
        }

        let mut notes = self
            .notes
            .lock()
            .map_err(|_| anyhow::anyhow!("Note book lock poisoned"))?;
        let mut next = notes.clone();
        let entries = next.entry(owner_id.to_string()).or_default();
        entries.push(Note {
            text: text.to_string(),
            created_at: at,
        });
        let count = entries.len();

        write_json_atomic(&self.path, &next)?;
        *notes = next;
        Ok(count)
    }

    pub fn list(&self, owner_id: &str) -> Vec<Note> {
        self.notes
            .lock()
            .ok()
            .and_then(|notes| notes.get(owner_id).cloned())
            .unwrap_or_default()
    }

    /// Delete every note of the owner. Returns how many were removed.
    pub fn clear(&self, owner_id: &str) -> Result<usize> {
        let mut notes = self
            .notes
            .lock()
            .map_err(|_| anyhow::anyhow!("Note book lock poisoned"))?;
        let Some(existing) = notes.get(owner_id) else {
            return Ok(0);
        };
        let removed = existing.len();

        let mut next = notes.clone();
        next.remove(owner_id);
        write_json_atomic(&self.path, &next)?;
        *notes = next;
        Ok(removed)
    }
}
