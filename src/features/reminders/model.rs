//! Reminder records, requests and the persisted layout
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Persist the zone of daily reminders (`tz`)
//! - 1.0.0: Initial release

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::timing::{next_daily_occurrence, TimeOfDay};

/// Addressee of a reminder (one chat or session)
pub type OwnerId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    Daily,
    Once,
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReminderKind::Daily => write!(f, "daily"),
            ReminderKind::Once => write!(f, "once"),
        }
    }
}

/// When a reminder fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Every day at a local time in `zone`
    Daily { time: TimeOfDay, zone: Tz },
    /// Once, at an absolute instant
    Once { at: DateTime<Utc> },
}

/// An active reminder, as held by both the scheduler and the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: String,
    pub owner_id: OwnerId,
    pub trigger: Trigger,
    pub payload: String,
}

impl Reminder {
    pub fn kind(&self) -> ReminderKind {
        match self.trigger {
            Trigger::Daily { .. } => ReminderKind::Daily,
            Trigger::Once { .. } => ReminderKind::Once,
        }
    }

    /// Next instant this reminder is due, as seen from `now`.
    ///
    /// Daily reminders are computed live from the zone rules. A one-shot
    /// reminder always reports its stored instant, even if already past.
    pub fn next_fire(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.trigger {
            Trigger::Daily { time, zone } => next_daily_occurrence(now, time, zone),
            Trigger::Once { at } => at,
        }
    }

    pub fn to_stored(&self) -> StoredReminder {
        match self.trigger {
            Trigger::Daily { time, zone } => StoredReminder {
                name: self.id.clone(),
                kind: ReminderKind::Daily,
                time: Some(time.to_string()),
                when: None,
                tz: Some(zone.name().to_string()),
                text: self.payload.clone(),
            },
            Trigger::Once { at } => StoredReminder {
                name: self.id.clone(),
                kind: ReminderKind::Once,
                time: None,
                when: Some(at.timestamp()),
                tz: None,
                text: self.payload.clone(),
            },
        }
    }

    /// Rebuild a reminder from its persisted form.
    ///
    /// `default_zone` applies to daily records written without a `tz` field.
    pub fn from_stored(
        owner_id: &str,
        stored: &StoredReminder,
        default_zone: Tz,
    ) -> anyhow::Result<Self> {
        let trigger = match stored.kind {
            ReminderKind::Daily => {
                let raw = stored
                    .time
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("daily record {} has no time", stored.name))?;
                let time = TimeOfDay::parse(raw).ok_or_else(|| {
                    anyhow::anyhow!("daily record {} has invalid time {raw:?}", stored.name)
                })?;
                let zone = match stored.tz.as_deref() {
                    Some(name) => name.parse::<Tz>().map_err(|e| {
                        anyhow::anyhow!("daily record {} has unknown zone {name:?}: {e}", stored.name)
                    })?,
                    None => default_zone,
                };
                Trigger::Daily { time, zone }
            }
            ReminderKind::Once => {
                let epoch = stored
                    .when
                    .ok_or_else(|| anyhow::anyhow!("once record {} has no instant", stored.name))?;
                let at = Utc.timestamp_opt(epoch, 0).single().ok_or_else(|| {
                    anyhow::anyhow!("once record {} has invalid instant {epoch}", stored.name)
                })?;
                Trigger::Once { at }
            }
        };

        Ok(Reminder {
            id: stored.name.clone(),
            owner_id: owner_id.to_string(),
            trigger,
            payload: stored.text.clone(),
        })
    }
}

/// One entry of the persisted store: `{name, type, time|when, text}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReminder {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ReminderKind,
    /// `HH:MM`, daily only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Epoch seconds, once only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tz: Option<String>,
    pub text: String,
}

/// Target of a one-shot request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnceTarget {
    /// Relative delay, resolved against the clock at creation
    Delay { seconds: i64 },
    /// Absolute instant
    At(DateTime<Utc>),
    /// `YYYY-MM-DD HH:MM` in the service's default zone
    Local(String),
}

/// A fully collected but not yet validated creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderSpec {
    Daily {
        time: String,
        zone: Option<String>,
        text: String,
    },
    Once {
        target: OnceTarget,
        text: String,
    },
}

impl ReminderSpec {
    pub fn daily(time: impl Into<String>, text: impl Into<String>) -> Self {
        ReminderSpec::Daily {
            time: time.into(),
            zone: None,
            text: text.into(),
        }
    }

    pub fn daily_in(time: impl Into<String>, zone: impl Into<String>, text: impl Into<String>) -> Self {
        ReminderSpec::Daily {
            time: time.into(),
            zone: Some(zone.into()),
            text: text.into(),
        }
    }

    pub fn after_seconds(seconds: i64, text: impl Into<String>) -> Self {
        ReminderSpec::Once {
            target: OnceTarget::Delay { seconds },
            text: text.into(),
        }
    }

    pub fn at(when: DateTime<Utc>, text: impl Into<String>) -> Self {
        ReminderSpec::Once {
            target: OnceTarget::At(when),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            ReminderSpec::Daily { text, .. } | ReminderSpec::Once { text, .. } => text,
        }
    }
}
