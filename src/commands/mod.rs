//! # Command System
//!
//! Slash command (/) handling for the reminder assistant.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Transport-neutral commands parsed from plain text
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 1.0.0: Initial reorganization with modular command structure

pub mod context;
pub mod handler;
pub mod handlers;
pub mod parser;
pub mod registry;

// Re-export handler infrastructure
pub use context::CommandContext;
pub use handler::CommandHandler;
pub use parser::{parse_command, ParsedCommand};
pub use registry::CommandRegistry;

/// Registry with every built-in handler
pub fn default_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for handler in handlers::create_all_handlers() {
        registry.register(handler);
    }
    registry
}
