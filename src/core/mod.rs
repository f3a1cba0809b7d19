//! # Core Module
//!
//! Shared building blocks: configuration, clocks, typed errors, file
//! persistence helpers and outbound message splitting.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.7.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Add clock, error and file_utils modules for the reminder engine
//! - 1.1.0: Add response module with message chunking utilities
//! - 1.0.0: Initial creation with config module

pub mod clock;
pub mod config;
pub mod error;
pub mod file_utils;
pub mod response;

// Re-export commonly used items
pub use clock::{Clock, SystemClock, TokioClock};
pub use config::Config;
pub use error::{ReminderError, ReminderResult};
pub use response::{chunk_for_message, chunk_text, preview, truncate, MESSAGE_LIMIT};
