//! Per-command handler implementations
//!
//! - **Version**: 3.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 3.0.0: Reminder assistant command set (utility, remind, notes, export)
//! - 1.0.0: Initial extraction from monolithic command_handler.rs

pub mod export;
pub mod notes;
pub mod remind;
pub mod utility;

use std::sync::Arc;

use super::handler::CommandHandler;

/// Create all registered command handlers
///
/// Returns a vector of handlers ready to be registered with CommandRegistry.
pub fn create_all_handlers() -> Vec<Arc<dyn CommandHandler>> {
    vec![
        Arc::new(utility::UtilityHandler),
        Arc::new(remind::RemindHandler),
        Arc::new(notes::NotesHandler),
        Arc::new(export::ExportHandler),
    ]
}
