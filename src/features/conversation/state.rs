//! Conversation states, inputs and completed requests

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::features::reminders::ReminderSpec;

/// Step of a multi-turn input flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingReminderTime,
    AwaitingReminderText,
    AwaitingOnceInstant,
    AwaitingOnceText,
    AwaitingDelay,
    AwaitingDelayText,
    AwaitingNote,
    AwaitingDeletionChoice,
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConversationState::Idle => "idle",
            ConversationState::AwaitingReminderTime => "awaiting_reminder_time",
            ConversationState::AwaitingReminderText => "awaiting_reminder_text",
            ConversationState::AwaitingOnceInstant => "awaiting_once_instant",
            ConversationState::AwaitingOnceText => "awaiting_once_text",
            ConversationState::AwaitingDelay => "awaiting_delay",
            ConversationState::AwaitingDelayText => "awaiting_delay_text",
            ConversationState::AwaitingNote => "awaiting_note",
            ConversationState::AwaitingDeletionChoice => "awaiting_deletion_choice",
        };
        f.write_str(name)
    }
}

/// Per-owner conversation: current step plus fields collected so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    pub state: ConversationState,
    pub scratch: BTreeMap<String, String>,
}

impl Conversation {
    pub fn at(state: ConversationState) -> Self {
        Self {
            state,
            scratch: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.scratch.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.scratch.get(key).map(String::as_str)
    }

    pub fn is_idle(&self) -> bool {
        self.state == ConversationState::Idle
    }
}

/// A reminder offered for deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionChoice {
    pub id: String,
    pub label: String,
}

/// Entry points of the input flows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    DailyReminder,
    OnceReminder,
    DelayedReminder,
    Note,
    Deletion { choices: Vec<DeletionChoice> },
}

/// Shape of an inbound message as seen by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Start a flow, replacing any flow in progress
    Begin(Flow),
    /// Abandon whatever is in progress
    Cancel,
    /// Plain text
    Text(String),
}

/// Result of a finished flow, to be carried out by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletedRequest {
    CreateReminder(ReminderSpec),
    CancelReminder { id: String },
    SaveNote { text: String },
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: ConversationState,
    pub request: Option<CompletedRequest>,
    pub prompt: Option<String>,
}

impl Transition {
    /// Plain text outside of any flow; the engine has nothing to say about it
    pub fn is_unhandled(&self) -> bool {
        self.state == ConversationState::Idle && self.request.is_none() && self.prompt.is_none()
    }
}
