// Core layer - shared types and configuration
pub mod core;

// Features layer - reminders, conversations, notes, export, rate limiting
pub mod features;

// Gateway layer - chat transport and AI collaborators
pub mod gateway;

// Application layer
pub mod assistant;
pub mod commands;

pub use assistant::Assistant;
pub use core::{Config, ReminderError};
pub use features::reminders::{ReminderService, ReminderSpec, ReminderStore};
