//! # Reminder Store
//!
//! Durable record of every pending reminder, keyed by owner. The whole map is
//! written as one JSON document through a staged write and rename, so a crash
//! mid-write leaves the previous document intact.
//!
//! Writes are serialized by a single lock around the in-memory copy; the copy
//! is only replaced after the file write succeeded.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::Result;
use log::{debug, info};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::model::{OwnerId, StoredReminder};
use crate::core::file_utils::{ensure_parent_dir, read_json_or_default, write_json_atomic};

/// Persisted layout: owner id -> reminder records
pub type ReminderMap = BTreeMap<OwnerId, Vec<StoredReminder>>;

pub struct ReminderStore {
    path: PathBuf,
    state: Mutex<ReminderMap>,
}

impl ReminderStore {
    /// Open the store at `path`, loading any existing records
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_parent_dir(&path)?;
        let state: ReminderMap = read_json_or_default(&path)?;

        let total: usize = state.values().map(Vec::len).sum();
        info!(
            "📂 Loaded {total} reminder(s) for {} owner(s) from {}",
            state.len(),
            path.display()
        );

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, ReminderMap> {
        // A panic while holding the lock cannot leave a half-applied map:
        // the map is only swapped after a successful write.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read the document from disk
    pub fn load(&self) -> Result<ReminderMap> {
        let _guard = self.lock();
        read_json_or_default(&self.path)
    }

    /// Replace the whole document
    pub fn save(&self, map: ReminderMap) -> Result<()> {
        let mut state = self.lock();
        write_json_atomic(&self.path, &map)?;
        *state = map;
        Ok(())
    }

    /// Current contents, as last successfully written
    pub fn snapshot(&self) -> ReminderMap {
        self.lock().clone()
    }

    pub fn records_for(&self, owner_id: &str) -> Vec<StoredReminder> {
        self.lock().get(owner_id).cloned().unwrap_or_default()
    }

    pub fn contains(&self, owner_id: &str, name: &str) -> bool {
        self.lock()
            .get(owner_id)
            .is_some_and(|records| records.iter().any(|r| r.name == name))
    }

    /// Add a record for `owner_id`.
    ///
    /// Returns `Ok(false)` without writing if a record with the same name
    /// already exists for that owner.
    pub fn insert(&self, owner_id: &str, record: StoredReminder) -> Result<bool> {
        self.mutate(|map| {
            let records = map.entry(owner_id.to_string()).or_default();
            if records.iter().any(|r| r.name == record.name) {
                return false;
            }
            records.push(record);
            true
        })
    }

    /// Remove the record `name` of `owner_id`. Returns whether it existed.
    pub fn remove(&self, owner_id: &str, name: &str) -> Result<bool> {
        self.mutate(|map| {
            let Some(records) = map.get_mut(owner_id) else {
                return false;
            };
            let before = records.len();
            records.retain(|r| r.name != name);
            let removed = records.len() != before;
            if records.is_empty() {
                map.remove(owner_id);
            }
            removed
        })
    }

    /// Apply `change` to a copy of the map and write it if anything changed
    fn mutate<F>(&self, change: F) -> Result<bool>
    where
        F: FnOnce(&mut ReminderMap) -> bool,
    {
        let mut state = self.lock();
        let mut next = state.clone();
        if !change(&mut next) {
            return Ok(false);
        }
        write_json_atomic(&self.path, &next)?;
        *state = next;
        debug!("Reminder store now holds {} owner(s)", state.len());
        Ok(true)
    }
}
