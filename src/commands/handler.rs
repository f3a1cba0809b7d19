//! Command handler trait
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: Transport-neutral handlers returning reply texts
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::context::CommandContext;
use super::parser::ParsedCommand;

/// Trait for command handlers
///
/// Each handler processes one or more commands and returns the replies to
/// send back to the owner, in order.
///
/// # Example
///
/// ```ignore
/// pub struct PingHandler;
///
/// #[async_trait]
/// impl CommandHandler for PingHandler {
///     fn command_names(&self) -> &'static [&'static str] {
///         &["ping"]
///     }
///
///     async fn handle(
///         &self,
///         ctx: Arc<CommandContext>,
///         owner_id: &str,
///         command: &ParsedCommand,
///     ) -> Result<Vec<String>> {
///         Ok(vec!["Pong!".to_string()])
///     }
/// }
/// ```
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name(s) this handler processes
    fn command_names(&self) -> &'static [&'static str];

    /// Handle the command for `owner_id`
    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        owner_id: &str,
        command: &ParsedCommand,
    ) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that the trait is object-safe (can be used with dyn)
    fn _assert_object_safe(_: &dyn CommandHandler) {}
}
