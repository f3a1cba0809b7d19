//! # Gateway Collaborators
//!
//! Boundaries between the assistant and the outside world: the chat
//! transport that delivers inbound text and outbound notifications, and the
//! AI completion service used for free-form replies.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

pub mod completion;
pub mod console;
pub mod recording;

use anyhow::Result;
use async_trait::async_trait;

pub use completion::OpenAiCompletion;
pub use console::ConsoleGateway;
pub use recording::RecordingNotifier;

/// Text arriving from an owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub owner_id: String,
    pub text: String,
}

impl InboundEvent {
    pub fn new(owner_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            text: text.into(),
        }
    }
}

/// Delivers text to an owner
///
/// A failed delivery is reported but does not undo whatever produced the text.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, owner_id: &str, text: &str) -> Result<()>;
}

/// Produces a free-form reply to a prompt
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, owner_id: &str, prompt: &str) -> Result<String>;
}
