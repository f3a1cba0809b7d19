//! # Reminders Feature
//!
//! Daily and one-shot reminders with crash-consistent persistence and
//! restart recovery.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Split into model, timing, store, scheduler and service
//! - 1.0.0: Initial polling scheduler

pub mod display;
pub mod model;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod timing;

pub use display::describe_schedule;
pub use model::{OnceTarget, OwnerId, Reminder, ReminderKind, ReminderSpec, StoredReminder, Trigger};
pub use scheduler::{FireHandler, JobHandle, Scheduler};
pub use service::{RecoveryReport, ReminderService, ScheduledReminder};
pub use store::{ReminderMap, ReminderStore};
pub use timing::{format_duration, next_daily_occurrence, parse_duration, TimeOfDay};
