//! # Conversation Feature
//!
//! Multi-turn input collection. Each owner has at most one flow in progress;
//! a flow walks through its steps and ends with a [`CompletedRequest`] for
//! the caller to carry out. The engine never touches reminders itself.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod engine;
pub mod state;

pub use engine::{prompts, transition, ConversationEngine};
pub use state::{
    CompletedRequest, Conversation, ConversationState, DeletionChoice, Flow, Input, Transition,
};
