//! Conversation transition table and per-owner engine

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use dashmap::DashMap;
use log::debug;

use super::state::{
    CompletedRequest, Conversation, ConversationState, DeletionChoice, Flow, Input, Transition,
};
use crate::features::reminders::{parse_duration, OnceTarget, ReminderSpec, TimeOfDay};

const TIME_KEY: &str = "time";
const ZONE_KEY: &str = "zone";
const WHEN_KEY: &str = "when";
const DELAY_KEY: &str = "delay";
const CHOICE_COUNT_KEY: &str = "choices";

fn choice_key(n: usize) -> String {
    format!("choice.{n}")
}

pub mod prompts {
    pub const ASK_TIME: &str = "⏰ At what time every day? Send HH:MM, optionally followed by a time zone (e.g. `09:00` or `09:00 Asia/Baku`).";
    pub const RETRY_TIME: &str = "❌ I need a time like `09:00` (and optionally a zone like `Europe/Berlin`). Try again or send /cancel.";
    pub const ASK_INSTANT: &str = "📅 When? Send a date and time as YYYY-MM-DD HH:MM.";
    pub const RETRY_INSTANT: &str = "❌ I need a date like `2025-07-25 15:30`. Try again or send /cancel.";
    pub const ASK_DELAY: &str = "⏳ In how long? e.g. `30m`, `2h`, `1h30m`.";
    pub const RETRY_DELAY: &str = "❌ I need a delay like `45s`, `30m` or `1h30m`. Try again or send /cancel.";
    pub const ASK_TEXT: &str = "📝 What should I remind you about?";
    pub const RETRY_TEXT: &str = "❌ The reminder text cannot be empty. What should I remind you about?";
    pub const ASK_NOTE: &str = "🗒️ Send the note text.";
    pub const RETRY_NOTE: &str = "❌ The note cannot be empty. Send the note text or /cancel.";
    pub const NOTHING_TO_DELETE: &str = "📋 You don't have any reminders to delete.";
    pub const RETRY_CHOICE: &str = "❌ Send the number of the reminder to delete, or /cancel.";
    pub const CANCELLED: &str = "👌 Cancelled.";
    pub const NOTHING_TO_CANCEL: &str = "Nothing to cancel.";
}

/// Apply one input to a conversation.
///
/// Pure: returns the next conversation, a completed request when a flow
/// finishes, and the text to send back. Plain text while idle yields no
/// request and no prompt.
pub fn transition(
    current: &Conversation,
    input: Input,
) -> (Conversation, Option<CompletedRequest>, Option<String>) {
    use ConversationState::*;

    let text = match input {
        Input::Cancel => {
            let prompt = if current.is_idle() {
                prompts::NOTHING_TO_CANCEL
            } else {
                prompts::CANCELLED
            };
            return (Conversation::default(), None, Some(prompt.to_string()));
        }
        Input::Begin(flow) => return begin(flow),
        Input::Text(text) => text,
    };
    let text = text.trim();

    let stay = |prompt: &str| (current.clone(), None, Some(prompt.to_string()));
    let finish = |request: CompletedRequest| (Conversation::default(), Some(request), None);

    match current.state {
        Idle => (Conversation::default(), None, None),

        AwaitingReminderTime => match parse_time_and_zone(text) {
            Some((time, zone)) => {
                let mut next = Conversation::at(AwaitingReminderText).with(TIME_KEY, time.to_string());
                if let Some(zone) = zone {
                    next = next.with(ZONE_KEY, zone.name());
                }
                (next, None, Some(prompts::ASK_TEXT.to_string()))
            }
            None => stay(prompts::RETRY_TIME),
        },

        AwaitingReminderText => match (current.get(TIME_KEY), text.is_empty()) {
            (Some(time), false) => finish(CompletedRequest::CreateReminder(ReminderSpec::Daily {
                time: time.to_string(),
                zone: current.get(ZONE_KEY).map(str::to_string),
                text: text.to_string(),
            })),
            (None, _) => restart(AwaitingReminderTime, prompts::ASK_TIME),
            (_, true) => stay(prompts::RETRY_TEXT),
        },

        AwaitingOnceInstant => {
            let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M").is_ok() {
                (
                    Conversation::at(AwaitingOnceText).with(WHEN_KEY, normalized),
                    None,
                    Some(prompts::ASK_TEXT.to_string()),
                )
            } else {
                stay(prompts::RETRY_INSTANT)
            }
        }

        AwaitingOnceText => match (current.get(WHEN_KEY), text.is_empty()) {
            (Some(when), false) => finish(CompletedRequest::CreateReminder(ReminderSpec::Once {
                target: OnceTarget::Local(when.to_string()),
                text: text.to_string(),
            })),
            (None, _) => restart(AwaitingOnceInstant, prompts::ASK_INSTANT),
            (_, true) => stay(prompts::RETRY_TEXT),
        },

        AwaitingDelay => match parse_duration(text) {
            Some(seconds) => (
                Conversation::at(AwaitingDelayText).with(DELAY_KEY, seconds.to_string()),
                None,
                Some(prompts::ASK_TEXT.to_string()),
            ),
            None => stay(prompts::RETRY_DELAY),
        },

        AwaitingDelayText => {
            let seconds = current.get(DELAY_KEY).and_then(|s| s.parse::<i64>().ok());
            match (seconds, text.is_empty()) {
                (Some(seconds), false) => finish(CompletedRequest::CreateReminder(
                    ReminderSpec::after_seconds(seconds, text),
                )),
                (None, _) => restart(AwaitingDelay, prompts::ASK_DELAY),
                (_, true) => stay(prompts::RETRY_TEXT),
            }
        }

        AwaitingNote => {
            if text.is_empty() {
                stay(prompts::RETRY_NOTE)
            } else {
                finish(CompletedRequest::SaveNote {
                    text: text.to_string(),
                })
            }
        }

        AwaitingDeletionChoice => match pick_choice(current, text) {
            Some(id) => finish(CompletedRequest::CancelReminder { id }),
            None => stay(prompts::RETRY_CHOICE),
        },
    }
}

fn restart(
    state: ConversationState,
    prompt: &str,
) -> (Conversation, Option<CompletedRequest>, Option<String>) {
    (Conversation::at(state), None, Some(prompt.to_string()))
}

fn begin(flow: Flow) -> (Conversation, Option<CompletedRequest>, Option<String>) {
    use ConversationState::*;

    match flow {
        Flow::DailyReminder => restart(AwaitingReminderTime, prompts::ASK_TIME),
        Flow::OnceReminder => restart(AwaitingOnceInstant, prompts::ASK_INSTANT),
        Flow::DelayedReminder => restart(AwaitingDelay, prompts::ASK_DELAY),
        Flow::Note => restart(AwaitingNote, prompts::ASK_NOTE),
        Flow::Deletion { choices } if choices.is_empty() => (
            Conversation::default(),
            None,
            Some(prompts::NOTHING_TO_DELETE.to_string()),
        ),
        Flow::Deletion { choices } => {
            let mut next =
                Conversation::at(AwaitingDeletionChoice).with(CHOICE_COUNT_KEY, choices.len().to_string());
            for (n, choice) in choices.iter().enumerate() {
                next = next.with(&choice_key(n + 1), choice.id.clone());
            }
            (next, None, Some(deletion_menu(&choices)))
        }
    }
}

fn deletion_menu(choices: &[DeletionChoice]) -> String {
    let mut menu = String::from("🗑️ Which reminder should I delete? Send its number:\n");
    for (n, choice) in choices.iter().enumerate() {
        menu.push_str(&format!("\n**{}.** {}", n + 1, choice.label));
    }
    menu
}

/// Accept `09:00` or `09:00 Asia/Baku`
fn parse_time_and_zone(text: &str) -> Option<(TimeOfDay, Option<Tz>)> {
    let mut parts = text.split_whitespace();
    let time = TimeOfDay::parse(parts.next()?)?;
    let zone = match parts.next() {
        Some(name) => Some(name.parse::<Tz>().ok()?),
        None => None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((time, zone))
}

fn pick_choice(current: &Conversation, text: &str) -> Option<String> {
    let count: usize = current.get(CHOICE_COUNT_KEY)?.parse().ok()?;
    let text = text.trim_start_matches('#');

    if let Ok(n) = text.parse::<usize>() {
        if (1..=count).contains(&n) {
            return current.get(&choice_key(n)).map(str::to_string);
        }
        return None;
    }

    (1..=count)
        .filter_map(|n| current.get(&choice_key(n)))
        .find(|id| *id == text)
        .map(str::to_string)
}

/// Holds one conversation per owner.
///
/// Each step runs while holding the owner's map entry, so two inputs from
/// the same owner never interleave. Idle conversations are not stored.
#[derive(Debug, Default)]
pub struct ConversationEngine {
    conversations: DashMap<String, Conversation>,
}

impl ConversationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, owner_id: &str, input: Input) -> Transition {
        let mut entry = self.conversations.entry(owner_id.to_string()).or_default();
        let before = entry.state;
        let (next, request, prompt) = transition(&entry, input);
        let state = next.state;
        *entry = next;
        drop(entry);

        self.conversations
            .remove_if(owner_id, |_, conversation| conversation.is_idle());

        if before != state {
            debug!("Conversation of {owner_id}: {before} -> {state}");
        }

        Transition {
            state,
            request,
            prompt,
        }
    }

    pub fn state(&self, owner_id: &str) -> ConversationState {
        self.conversations
            .get(owner_id)
            .map(|c| c.state)
            .unwrap_or_default()
    }

    pub fn conversation(&self, owner_id: &str) -> Conversation {
        self.conversations
            .get(owner_id)
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    pub fn is_active(&self, owner_id: &str) -> bool {
        self.state(owner_id) != ConversationState::Idle
    }

    /// Number of owners currently in a flow
    pub fn active_count(&self) -> usize {
        self.conversations.len()
    }
}
