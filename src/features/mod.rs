//! # Features
//!
//! Each feature is self-contained; the command layer wires them together.

pub mod conversation;
pub mod export;
pub mod notes;
pub mod rate_limiting;
pub mod reminders;

pub use conversation::{CompletedRequest, ConversationEngine, ConversationState, Flow, Input};
pub use export::{export_reminders, CloudStorage, ExportReceipt, HttpUploadStorage, LocalDirectoryStorage};
pub use notes::{Note, NoteBook};
pub use rate_limiting::RateLimiter;
pub use reminders::{RecoveryReport, ReminderService, ReminderSpec, ReminderStore};
