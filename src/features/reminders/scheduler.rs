//! # Reminder Scheduler
//!
//! In-memory timer engine. Every armed reminder owns one tokio task that
//! sleeps until the next due instant and then hands the reminder to the
//! [`FireHandler`]. The set of armed jobs lives in a `DashMap`; a task must
//! claim its entry before firing, so a cancel racing a fire resolves to
//! exactly one winner.
//!
//! - Daily jobs recompute their next occurrence from the zone rules after
//!   every firing and stay armed until cancelled.
//! - Once jobs are removed from the armed set at the moment they fire. A once
//!   job whose instant is already past fires immediately; rejecting such
//!   requests is up to the caller.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: One task per job with claim-before-fire; daily jobs follow zone rules
//! - 1.0.0: Initial polling scheduler

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, info, warn};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::oneshot;

use super::model::{Reminder, Trigger};
use super::timing::next_daily_occurrence;
use crate::core::clock::Clock;
use crate::core::error::{ReminderError, ReminderResult};

/// Longest single sleep; wall-clock jumps are noticed within this interval
const MAX_NAP: Duration = Duration::from_secs(60);

/// Receives reminders as they come due
#[async_trait]
pub trait FireHandler: Send + Sync {
    async fn on_fire(&self, reminder: Reminder, due: DateTime<Utc>);
}

/// Identifies an armed job
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        JobHandle(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct ArmedJob {
    reminder: Reminder,
    generation: u64,
    cancel: oneshot::Sender<()>,
}

struct Shared {
    jobs: DashMap<String, ArmedJob>,
    clock: Arc<dyn Clock>,
    handler: Weak<dyn FireHandler>,
    generations: AtomicU64,
}

impl Shared {
    fn is_current(&self, id: &str, generation: u64) -> bool {
        self.jobs
            .get(id)
            .is_some_and(|job| job.generation == generation)
    }

    /// Take a once job out of the armed set. Only the first caller wins.
    fn claim(&self, id: &str, generation: u64) -> bool {
        self.jobs
            .remove_if(id, |_, job| job.generation == generation)
            .is_some()
    }

    async fn dispatch(&self, reminder: Reminder, due: DateTime<Utc>) {
        match self.handler.upgrade() {
            Some(handler) => handler.on_fire(reminder, due).await,
            None => warn!("Reminder {} came due but its handler is gone", reminder.id),
        }
    }
}

/// Owner of every armed timer
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    pub fn new(clock: Arc<dyn Clock>, handler: Weak<dyn FireHandler>) -> Self {
        Self {
            shared: Arc::new(Shared {
                jobs: DashMap::new(),
                clock,
                handler,
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// Arm `reminder`. Fails if a job with the same id is already armed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, reminder: Reminder) -> ReminderResult<JobHandle> {
        let id = reminder.id.clone();
        let generation = self.shared.generations.fetch_add(1, Ordering::Relaxed);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        match self.shared.jobs.entry(id.clone()) {
            Entry::Occupied(_) => return Err(ReminderError::SchedulingConflict { id }),
            Entry::Vacant(slot) => {
                slot.insert(ArmedJob {
                    reminder: reminder.clone(),
                    generation,
                    cancel: cancel_tx,
                });
            }
        }

        debug!(
            "Armed {} reminder {} for owner {}",
            reminder.kind(),
            id,
            reminder.owner_id
        );
        tokio::spawn(run_job(
            Arc::clone(&self.shared),
            reminder,
            generation,
            cancel_rx,
        ));
        Ok(JobHandle(id))
    }

    /// Disarm a job. Returns the reminder if it was still armed.
    ///
    /// Takes effect immediately for jobs not yet due. A daily job that is in
    /// the middle of firing finishes that delivery and is not re-armed. A once
    /// job that already fired is unknown and yields `None`.
    pub fn cancel(&self, handle: &JobHandle) -> Option<Reminder> {
        let (_, job) = self.shared.jobs.remove(handle.id())?;
        // The task may already be gone; nothing to wake then
        let _ = job.cancel.send(());
        debug!("Disarmed reminder {handle}");
        Some(job.reminder)
    }

    pub fn is_armed(&self, id: &str) -> bool {
        self.shared.jobs.contains_key(id)
    }

    pub fn armed(&self, id: &str) -> Option<Reminder> {
        self.shared.jobs.get(id).map(|job| job.reminder.clone())
    }

    /// Ids of every armed job, sorted
    pub fn armed_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.shared.jobs.iter().map(|j| j.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.shared.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.jobs.is_empty()
    }

    /// Disarm everything
    pub fn shutdown(&self) {
        let ids: Vec<String> = self.shared.jobs.iter().map(|j| j.key().clone()).collect();
        let count = ids.len();
        for id in ids {
            self.cancel(&JobHandle(id));
        }
        info!("⏹️ Scheduler stopped, {count} job(s) disarmed");
    }
}

async fn run_job(
    shared: Arc<Shared>,
    reminder: Reminder,
    generation: u64,
    mut cancelled: oneshot::Receiver<()>,
) {
    let mut after = shared.clock.now();

    loop {
        let due = match reminder.trigger {
            Trigger::Daily { time, zone } => next_daily_occurrence(after, time, zone),
            Trigger::Once { at } => at,
        };

        if !wait_until(shared.clock.as_ref(), due, &mut cancelled).await {
            debug!("Reminder {} cancelled before {due}", reminder.id);
            return;
        }

        match reminder.trigger {
            Trigger::Once { .. } => {
                if shared.claim(&reminder.id, generation) {
                    info!("🔔 Firing once reminder {} for owner {}", reminder.id, reminder.owner_id);
                    shared.dispatch(reminder, due).await;
                }
                return;
            }
            Trigger::Daily { .. } => {
                if !shared.is_current(&reminder.id, generation) {
                    return;
                }
                info!("🔔 Firing daily reminder {} for owner {}", reminder.id, reminder.owner_id);
                shared.dispatch(reminder.clone(), due).await;
                after = due;
            }
        }
    }
}

/// Sleep until the clock reaches `due`. Returns false if cancelled first.
async fn wait_until(
    clock: &dyn Clock,
    due: DateTime<Utc>,
    cancelled: &mut oneshot::Receiver<()>,
) -> bool {
    loop {
        let now = clock.now();
        if now >= due {
            return true;
        }
        let remaining = (due - now).to_std().unwrap_or(Duration::ZERO);
        tokio::select! {
            _ = tokio::time::sleep(remaining.min(MAX_NAP)) => {}
            _ = &mut *cancelled => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::TokioClock;
    use crate::features::reminders::timing::TimeOfDay;
    use chrono::TimeZone;
    use tokio::sync::mpsc;

    struct Recorder {
        tx: mpsc::UnboundedSender<(String, DateTime<Utc>)>,
    }

    #[async_trait]
    impl FireHandler for Recorder {
        async fn on_fire(&self, reminder: Reminder, due: DateTime<Utc>) {
            let _ = self.tx.send((reminder.id, due));
        }
    }

    fn origin() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 3, 0, 0).unwrap()
    }

    fn setup() -> (
        Scheduler,
        Arc<Recorder>,
        mpsc::UnboundedReceiver<(String, DateTime<Utc>)>,
    ) {
        setup_at(origin())
    }

    fn setup_at(
        start: DateTime<Utc>,
    ) -> (
        Scheduler,
        Arc<Recorder>,
        mpsc::UnboundedReceiver<(String, DateTime<Utc>)>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let recorder = Arc::new(Recorder { tx });
        let handler: Arc<dyn FireHandler> = recorder.clone();
        let clock: Arc<dyn Clock> = Arc::new(TokioClock::starting_at(start));
        (Scheduler::new(clock, Arc::downgrade(&handler)), recorder, rx)
    }

    fn once(id: &str, at: DateTime<Utc>) -> Reminder {
        Reminder {
            id: id.to_string(),
            owner_id: "7".to_string(),
            trigger: Trigger::Once { at },
            payload: "ping".to_string(),
        }
    }

    fn daily(id: &str, hour: u32) -> Reminder {
        Reminder {
            id: id.to_string(),
            owner_id: "42".to_string(),
            trigger: Trigger::Daily {
                time: TimeOfDay::new(hour, 0).unwrap(),
                zone: chrono_tz::Asia::Baku,
            },
            payload: "stand-up".to_string(),
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_once_fires_once_and_disarms() {
        let (scheduler, _recorder, mut rx) = setup();
        let at = origin() + chrono::Duration::seconds(5);
        scheduler.schedule(once("a", at)).unwrap();
        assert!(scheduler.is_armed("a"));

        tokio::time::sleep(Duration::from_secs(4)).await;
        settle().await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(rx.try_recv().unwrap(), ("a".to_string(), at));
        assert!(!scheduler.is_armed("a"));
        assert!(scheduler.cancel(&JobHandle::new("a")).is_none());

        tokio::time::sleep(Duration::from_secs(3600)).await;
        settle().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_due() {
        let (scheduler, _recorder, mut rx) = setup();
        let handle = scheduler
            .schedule(once("a", origin() + chrono::Duration::seconds(5)))
            .unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        let cancelled = scheduler.cancel(&handle).unwrap();
        assert_eq!(cancelled.id, "a");
        assert!(scheduler.is_empty());

        tokio::time::sleep(Duration::from_secs(10)).await;
        settle().await;
        assert!(rx.try_recv().is_err());
        assert!(scheduler.cancel(&handle).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_past_once_fires_immediately() {
        let (scheduler, _recorder, mut rx) = setup();
        scheduler
            .schedule(once("late", origin() - chrono::Duration::hours(1)))
            .unwrap();
        settle().await;
        assert_eq!(rx.try_recv().unwrap().0, "late");
        assert!(scheduler.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_id_is_conflict() {
        let (scheduler, _recorder, _rx) = setup();
        scheduler.schedule(daily("d", 9)).unwrap();
        let err = scheduler.schedule(daily("d", 10)).unwrap_err();
        assert!(matches!(err, ReminderError::SchedulingConflict { ref id } if id == "d"));
        // the original job is untouched
        assert_eq!(scheduler.armed("d").unwrap(), daily("d", 9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_daily_rearms_every_day() {
        let (scheduler, _recorder, mut rx) = setup();
        scheduler.schedule(daily("d", 9)).unwrap();

        // 03:00 UTC is 07:00 in Baku; 09:00 Baku is 05:00 UTC
        tokio::time::sleep(Duration::from_secs(2 * 3600 + 1)).await;
        settle().await;
        let (_, first) = rx.try_recv().unwrap();
        assert_eq!(first, Utc.with_ymd_and_hms(2025, 6, 1, 5, 0, 0).unwrap());
        assert!(scheduler.is_armed("d"));

        tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
        settle().await;
        let (_, second) = rx.try_recv().unwrap();
        assert_eq!(second, Utc.with_ymd_and_hms(2025, 6, 2, 5, 0, 0).unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_daily_follows_dst_start() {
        // 07:00 EST on the day before New York springs forward
        let (scheduler, _recorder, mut rx) =
            setup_at(Utc.with_ymd_and_hms(2025, 3, 8, 12, 0, 0).unwrap());
        scheduler
            .schedule(Reminder {
                id: "ny".to_string(),
                owner_id: "42".to_string(),
                trigger: Trigger::Daily {
                    time: TimeOfDay::new(9, 0).unwrap(),
                    zone: chrono_tz::America::New_York,
                },
                payload: "coffee".to_string(),
            })
            .unwrap();

        tokio::time::sleep(Duration::from_secs(2 * 3600 + 1)).await;
        settle().await;
        let (_, before) = rx.try_recv().unwrap();
        assert_eq!(before, Utc.with_ymd_and_hms(2025, 3, 8, 14, 0, 0).unwrap());

        tokio::time::sleep(Duration::from_secs(23 * 3600)).await;
        settle().await;
        let (_, after) = rx.try_recv().unwrap();
        assert_eq!(after, Utc.with_ymd_and_hms(2025, 3, 9, 13, 0, 0).unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_daily_is_not_rearmed() {
        let (scheduler, _recorder, mut rx) = setup();
        let handle = scheduler.schedule(daily("d", 9)).unwrap();

        tokio::time::sleep(Duration::from_secs(2 * 3600 + 1)).await;
        settle().await;
        assert!(rx.try_recv().is_ok());

        scheduler.cancel(&handle).unwrap();
        tokio::time::sleep(Duration::from_secs(3 * 24 * 3600)).await;
        settle().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_racing_fire_delivers_at_most_once() {
        for round in 0..20u64 {
            let (scheduler, _recorder, mut rx) = setup();
            let handle = scheduler
                .schedule(once("race", origin() + chrono::Duration::seconds(1)))
                .unwrap();

            tokio::time::advance(Duration::from_secs(1)).await;
            // interleave the cancel with the firing task at varying points
            for _ in 0..(round % 4) {
                tokio::task::yield_now().await;
            }
            let cancelled = scheduler.cancel(&handle).is_some();
            settle().await;

            let deliveries = std::iter::from_fn(|| rx.try_recv().ok()).count();
            assert_eq!(deliveries + usize::from(cancelled), 1, "round {round}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_disarms_everything() {
        let (scheduler, _recorder, mut rx) = setup();
        scheduler.schedule(daily("d", 9)).unwrap();
        scheduler
            .schedule(once("o", origin() + chrono::Duration::seconds(30)))
            .unwrap();
        assert_eq!(scheduler.armed_ids(), vec!["d".to_string(), "o".to_string()]);

        scheduler.shutdown();
        assert!(scheduler.is_empty());
        tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
        settle().await;
        assert!(rx.try_recv().is_err());
    }
}
