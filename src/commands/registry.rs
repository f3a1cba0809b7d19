//! Command handler registry
//!
//! - **Version**: 1.1.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 1.1.0: Dispatch parsed commands, sorted name listing
//! - 1.0.0: Initial implementation for handler dispatch

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use super::context::CommandContext;
use super::handler::CommandHandler;
use super::parser::ParsedCommand;

/// Registry mapping command names to handlers
///
/// The registry allows handlers to be registered and looked up by command name.
/// Multiple command names can map to the same handler if they share logic.
///
/// # Example
///
/// ```ignore
/// let mut registry = CommandRegistry::new();
/// registry.register(Arc::new(PingHandler));
/// registry.register(Arc::new(HelpHandler));
///
/// let replies = registry.dispatch(ctx, "42", &command).await?;
/// ```
#[derive(Clone)]
pub struct CommandRegistry {
    handlers: HashMap<&'static str, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for its declared command names
    ///
    /// The handler is registered for all names returned by `command_names()`.
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) {
        for name in handler.command_names() {
            self.handlers.insert(name, Arc::clone(&handler));
        }
    }

    /// Get handler for a command name
    ///
    /// Returns None if no handler is registered for the given name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Check if a command is registered
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Number of registered command names
    ///
    /// Note: This counts command names, not unique handlers.
    /// A handler registered for multiple names will be counted multiple times.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// All registered command names, sorted
    pub fn command_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Run the handler for `command`; `None` if the command is unknown
    pub async fn dispatch(
        &self,
        ctx: Arc<CommandContext>,
        owner_id: &str,
        command: &ParsedCommand,
    ) -> Option<Result<Vec<String>>> {
        let handler = self.get(&command.name)?;
        Some(handler.handle(ctx, owner_id, command).await)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
