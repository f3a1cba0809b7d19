//! Typed errors returned at the reminder service boundary
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use thiserror::Error;

/// Failure modes of reminder operations
///
/// All variants are recovered at the service boundary and reported to the
/// caller; none of them stop the process.
#[derive(Debug, Error)]
pub enum ReminderError {
    /// Malformed time, delay, instant or payload. Nothing was changed.
    #[error("invalid reminder: {0}")]
    Validation(String),

    /// No active reminder with this id for this owner.
    #[error("reminder {id} not found")]
    NotFound { id: String },

    /// The store could not be read or written. Nothing was committed.
    #[error("persistence failure: {0}")]
    Persistence(#[source] anyhow::Error),

    /// An id was about to be reused. Ids are unique by construction, so this
    /// is an internal invariant violation affecting only this operation.
    #[error("reminder id {id} is already in use")]
    SchedulingConflict { id: String },
}

impl ReminderError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ReminderError::Validation(msg.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        ReminderError::NotFound { id: id.into() }
    }

    /// Short user-facing explanation
    pub fn user_message(&self) -> String {
        match self {
            ReminderError::Validation(msg) => format!("❌ {msg}"),
            ReminderError::NotFound { id } => format!("❌ Reminder `{id}` not found."),
            ReminderError::Persistence(_) => {
                "❌ Could not save your reminders right now. Nothing was changed, please try again."
                    .to_string()
            }
            ReminderError::SchedulingConflict { .. } => {
                "❌ Could not create that reminder, please try again.".to_string()
            }
        }
    }
}

pub type ReminderResult<T> = std::result::Result<T, ReminderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ReminderError::validation("empty text").to_string(),
            "invalid reminder: empty text"
        );
        assert_eq!(
            ReminderError::not_found("once_7_1").to_string(),
            "reminder once_7_1 not found"
        );
    }

    #[test]
    fn test_persistence_keeps_source() {
        let err = ReminderError::Persistence(anyhow::anyhow!("disk full"));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("disk full"));
    }

    #[test]
    fn test_converts_into_anyhow() {
        fn fails() -> anyhow::Result<()> {
            Err(ReminderError::not_found("x"))?;
            Ok(())
        }
        assert!(fails().is_err());
    }
}
