//! # Reminder Service
//!
//! Keeps the store and the scheduler in step. Records are written before
//! their timer is armed, and a cancelled timer is only let go once its record
//! has been removed from disk. Operations for one owner are serialized by a
//! per-owner async lock; different owners proceed in parallel.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Daily and once reminders with durable store and startup recovery
//! - 1.0.0: Initial one-shot reminders

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use dashmap::DashMap;
use log::{error, info, warn};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::model::{
    OnceTarget, OwnerId, Reminder, ReminderKind, ReminderSpec, StoredReminder, Trigger,
};
use super::scheduler::{FireHandler, JobHandle, Scheduler};
use super::store::ReminderStore;
use super::timing::{parse_local_datetime, TimeOfDay};
use crate::core::clock::Clock;
use crate::core::error::{ReminderError, ReminderResult};
use crate::core::response::MESSAGE_LIMIT;
use crate::gateway::Notifier;

/// Longest delay or lead time accepted for a one-shot reminder
const MAX_LEAD_DAYS: i64 = 3660;

/// Delay before retrying a fired reminder whose record could not be removed
const FIRE_RETRY_SECS: i64 = 30;

/// A reminder together with its next due instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledReminder {
    pub reminder: Reminder,
    pub next_fire: DateTime<Utc>,
}

/// Outcome of re-arming persisted reminders at startup
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    pub daily: usize,
    pub once: usize,
    /// Once reminders whose instant passed while the process was down
    pub overdue: usize,
    /// Records that could not be interpreted and were left untouched
    pub invalid: Vec<String>,
}

struct OwnerGuard<'a> {
    locks: &'a DashMap<OwnerId, Arc<Mutex<()>>>,
    owner_id: OwnerId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own handle left: no holder, no waiter
        self.locks
            .remove_if(&self.owner_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

struct Inner {
    store: ReminderStore,
    scheduler: Scheduler,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    default_zone: Tz,
    owner_locks: DashMap<OwnerId, Arc<Mutex<()>>>,
    last_stamp: AtomicI64,
}

#[derive(Clone)]
pub struct ReminderService {
    inner: Arc<Inner>,
}

impl ReminderService {
    pub fn new(
        store: ReminderStore,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        default_zone: Tz,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let handler: Weak<dyn FireHandler> = weak.clone();
            Inner {
                store,
                scheduler: Scheduler::new(Arc::clone(&clock), handler),
                clock,
                notifier,
                default_zone,
                owner_locks: DashMap::new(),
                last_stamp: AtomicI64::new(0),
            }
        });
        Self { inner }
    }

    pub fn default_zone(&self) -> Tz {
        self.inner.default_zone
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.inner.clock.now()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    pub fn store(&self) -> &ReminderStore {
        &self.inner.store
    }

    /// Re-arm every persisted reminder. Call once at startup.
    pub async fn recover(&self) -> RecoveryReport {
        let inner = &self.inner;
        let now = inner.clock.now();
        let mut report = RecoveryReport::default();

        for (owner_id, records) in inner.store.snapshot() {
            let _guard = inner.lock_owner(&owner_id).await;

            for record in records {
                inner.observe_stamp(&record.name);

                let reminder = match Reminder::from_stored(&owner_id, &record, inner.default_zone) {
                    Ok(reminder) => reminder,
                    Err(e) => {
                        error!("❌ Cannot restore reminder {} of owner {owner_id}: {e:#}", record.name);
                        report.invalid.push(record.name.clone());
                        continue;
                    }
                };

                if inner.scheduler.is_armed(&reminder.id) {
                    continue;
                }

                match reminder.trigger {
                    Trigger::Daily { .. } => report.daily += 1,
                    Trigger::Once { at } => {
                        report.once += 1;
                        if at <= now {
                            warn!("Reminder {} was due at {at} while offline, firing now", reminder.id);
                            report.overdue += 1;
                        }
                    }
                }

                if let Err(e) = inner.scheduler.schedule(reminder) {
                    error!("❌ Cannot re-arm reminder {}: {e}", record.name);
                    report.invalid.push(record.name.clone());
                }
            }
        }

        info!(
            "⏰ Recovered {} daily and {} once reminder(s) ({} overdue, {} invalid)",
            report.daily,
            report.once,
            report.overdue,
            report.invalid.len()
        );
        report
    }

    /// Validate, persist and arm a new reminder. Returns its id.
    pub async fn create(&self, owner_id: &str, spec: ReminderSpec) -> ReminderResult<String> {
        let inner = &self.inner;
        let _guard = inner.lock_owner(owner_id).await;

        let reminder = inner.build(owner_id, spec)?;
        let id = reminder.id.clone();

        if inner.scheduler.is_armed(&id) || inner.store.contains(owner_id, &id) {
            error!("Reminder id {id} already exists");
            return Err(ReminderError::SchedulingConflict { id });
        }

        match inner.store.insert(owner_id, reminder.to_stored()) {
            Ok(true) => {}
            Ok(false) => return Err(ReminderError::SchedulingConflict { id }),
            Err(e) => {
                error!("❌ Failed to persist reminder {id} for owner {owner_id}: {e:#}");
                return Err(ReminderError::Persistence(e));
            }
        }

        if let Err(e) = inner.scheduler.schedule(reminder.clone()) {
            // Keep store and scheduler in agreement
            if let Err(rollback) = inner.store.remove(owner_id, &id) {
                error!("❌ Failed to roll back reminder {id}: {rollback:#}");
            }
            return Err(e);
        }

        info!(
            "Created {} reminder {id} for owner {owner_id}, next at {}",
            reminder.kind(),
            reminder.next_fire(inner.clock.now())
        );
        Ok(id)
    }

    /// Active reminders of `owner_id`, soonest first
    pub async fn list(&self, owner_id: &str) -> Vec<ScheduledReminder> {
        let inner = &self.inner;
        let _guard = inner.lock_owner(owner_id).await;

        let now = inner.clock.now();
        let mut entries: Vec<ScheduledReminder> = inner
            .store
            .records_for(owner_id)
            .iter()
            .filter_map(|record| {
                Reminder::from_stored(owner_id, record, inner.default_zone)
                    .map_err(|e| warn!("Skipping unreadable reminder {}: {e:#}", record.name))
                    .ok()
            })
            .map(|reminder| ScheduledReminder {
                next_fire: reminder.next_fire(now),
                reminder,
            })
            .collect();

        entries.sort_by(|a, b| {
            a.next_fire
                .cmp(&b.next_fire)
                .then_with(|| a.reminder.id.cmp(&b.reminder.id))
        });
        entries
    }

    /// Disarm and delete a reminder. Returns the removed record.
    ///
    /// Records that cannot be interpreted were never armed; they are simply
    /// deleted.
    pub async fn cancel(&self, owner_id: &str, id: &str) -> ReminderResult<StoredReminder> {
        let inner = &self.inner;
        let _guard = inner.lock_owner(owner_id).await;

        let record = inner
            .store
            .records_for(owner_id)
            .into_iter()
            .find(|r| r.name == id)
            .ok_or_else(|| ReminderError::not_found(id))?;
        let readable = match Reminder::from_stored(owner_id, &record, inner.default_zone) {
            Ok(_) => true,
            Err(e) => {
                warn!("Reminder {id} of owner {owner_id} is unreadable ({e:#}), deleting it");
                false
            }
        };

        let disarmed = inner.scheduler.cancel(&JobHandle::new(id));
        if readable && disarmed.is_none() && record.kind == ReminderKind::Once {
            // Claimed by a firing in progress; its fire handler removes the record
            info!("Reminder {id} of owner {owner_id} is firing, too late to cancel");
            return Err(ReminderError::not_found(id));
        }

        if let Err(e) = inner.store.remove(owner_id, id) {
            error!("❌ Failed to delete reminder {id} for owner {owner_id}: {e:#}");
            if let Some(reminder) = disarmed {
                if let Err(rearm) = inner.scheduler.schedule(reminder) {
                    error!("❌ Failed to re-arm reminder {id}: {rearm}");
                }
            }
            return Err(ReminderError::Persistence(e));
        }

        if readable && disarmed.is_none() {
            warn!("Reminder {id} was persisted but not armed");
        }
        info!("Cancelled reminder {id} for owner {owner_id}");
        Ok(record)
    }

    /// Disarm every timer, leaving the store as is
    pub fn shutdown(&self) {
        self.inner.scheduler.shutdown();
    }
}

impl Inner {
    /// Serialize operations of one owner. The lock entry is dropped again
    /// once nobody holds or waits for it.
    async fn lock_owner(&self, owner_id: &str) -> OwnerGuard<'_> {
        let lock = self
            .owner_locks
            .entry(owner_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        OwnerGuard {
            locks: &self.owner_locks,
            owner_id: owner_id.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Strictly increasing millisecond stamp for ids
    fn next_stamp(&self) -> i64 {
        let now = self.clock.now().timestamp_millis();
        let mut previous = self.last_stamp.load(Ordering::SeqCst);
        loop {
            let next = now.max(previous + 1);
            match self.last_stamp.compare_exchange(
                previous,
                next,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return next,
                Err(actual) => previous = actual,
            }
        }
    }

    /// Make sure new ids sort after any stamp found in a stored id
    fn observe_stamp(&self, id: &str) {
        if let Some(stamp) = id.rsplit('_').next().and_then(|s| s.parse::<i64>().ok()) {
            self.last_stamp.fetch_max(stamp, Ordering::SeqCst);
        }
    }

    fn build(&self, owner_id: &str, spec: ReminderSpec) -> ReminderResult<Reminder> {
        let text = spec.text().trim().to_string();
        if text.is_empty() {
            return Err(ReminderError::validation("Reminder text cannot be empty."));
        }
        if text.len() > MESSAGE_LIMIT {
            return Err(ReminderError::validation(format!(
                "Reminder text is too long (max {MESSAGE_LIMIT} bytes)."
            )));
        }

        let now = self.clock.now();
        let trigger = match spec {
            ReminderSpec::Daily { time, zone, .. } => {
                let time = TimeOfDay::parse(&time).ok_or_else(|| {
                    ReminderError::validation(format!("`{time}` is not a valid time, use HH:MM."))
                })?;
                let zone = match zone {
                    Some(name) => name.trim().parse::<Tz>().map_err(|_| {
                        ReminderError::validation(format!("Unknown time zone `{name}`."))
                    })?,
                    None => self.default_zone,
                };
                Trigger::Daily { time, zone }
            }
            ReminderSpec::Once { target, .. } => {
                let at = match target {
                    OnceTarget::Delay { seconds } => {
                        if seconds <= 0 {
                            return Err(ReminderError::validation("The delay must be positive."));
                        }
                        Duration::try_seconds(seconds)
                            .and_then(|delay| now.checked_add_signed(delay))
                            .ok_or_else(|| ReminderError::validation("The delay is too long."))?
                    }
                    OnceTarget::At(at) => at,
                    OnceTarget::Local(raw) => parse_local_datetime(&raw, self.default_zone)
                        .ok_or_else(|| {
                            ReminderError::validation(format!(
                                "`{raw}` is not a valid date, use YYYY-MM-DD HH:MM."
                            ))
                        })?,
                };
                if at <= now {
                    return Err(ReminderError::validation("That time is already in the past."));
                }
                if at - now > Duration::days(MAX_LEAD_DAYS) {
                    return Err(ReminderError::validation("That time is too far in the future."));
                }
                Trigger::Once { at }
            }
        };

        let stamp = self.next_stamp();
        let id = match trigger {
            Trigger::Daily { time, .. } => format!("daily_{owner_id}_{}_{stamp}", time.compact()),
            Trigger::Once { at } => format!("once_{owner_id}_{}_{stamp}", at.timestamp()),
        };

        Ok(Reminder {
            id,
            owner_id: owner_id.to_string(),
            trigger,
            payload: text,
        })
    }
}

#[async_trait]
impl FireHandler for Inner {
    async fn on_fire(&self, reminder: Reminder, due: DateTime<Utc>) {
        if reminder.kind() == ReminderKind::Once {
            let _guard = self.lock_owner(&reminder.owner_id).await;

            if let Err(e) = self.store.remove(&reminder.owner_id, &reminder.id) {
                // Not delivered yet: keep it armed so store and scheduler agree
                error!(
                    "❌ Failed to consume reminder {} (due {due}), retrying: {e:#}",
                    reminder.id
                );
                let retry = Reminder {
                    trigger: Trigger::Once {
                        at: self.clock.now() + Duration::seconds(FIRE_RETRY_SECS),
                    },
                    ..reminder
                };
                if let Err(e) = self.scheduler.schedule(retry) {
                    error!("❌ Failed to re-arm reminder: {e}");
                }
                return;
            }
        }

        if let Err(e) = self
            .notifier
            .notify(&reminder.owner_id, &reminder.payload)
            .await
        {
            warn!(
                "Delivery of reminder {} to owner {} failed: {e:#}",
                reminder.id, reminder.owner_id
            );
        }
    }
}
