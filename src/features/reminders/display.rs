//! Human-readable schedule descriptions

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::model::Trigger;
use super::service::ScheduledReminder;
use super::timing::format_duration;

/// e.g. `every day at 09:00 (Asia/Baku), next in 2 hours`
pub fn describe_schedule(entry: &ScheduledReminder, default_zone: Tz, now: DateTime<Utc>) -> String {
    let countdown = {
        let seconds = (entry.next_fire - now).num_seconds();
        if seconds > 0 {
            format!("in {}", format_duration(seconds))
        } else {
            "any moment now".to_string()
        }
    };

    match entry.reminder.trigger {
        Trigger::Daily { time, zone } => {
            format!("every day at {time} ({}), next {countdown}", zone.name())
        }
        Trigger::Once { at } => {
            let local = at.with_timezone(&default_zone);
            format!(
                "once on {} ({}), {countdown}",
                local.format("%Y-%m-%d %H:%M"),
                default_zone.name()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reminders::model::Reminder;
    use crate::features::reminders::timing::TimeOfDay;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 3, 0, 0).unwrap()
    }

    #[test]
    fn test_describe_daily() {
        let entry = ScheduledReminder {
            reminder: Reminder {
                id: "d".to_string(),
                owner_id: "42".to_string(),
                trigger: Trigger::Daily {
                    time: TimeOfDay::new(9, 0).unwrap(),
                    zone: chrono_tz::Asia::Baku,
                },
                payload: "stand-up".to_string(),
            },
            next_fire: Utc.with_ymd_and_hms(2025, 6, 1, 5, 0, 0).unwrap(),
        };
        assert_eq!(
            describe_schedule(&entry, Tz::UTC, now()),
            "every day at 09:00 (Asia/Baku), next in 2 hours"
        );
    }

    #[test]
    fn test_describe_once_in_default_zone() {
        let at = Utc.with_ymd_and_hms(2025, 6, 4, 11, 30, 0).unwrap();
        let entry = ScheduledReminder {
            reminder: Reminder {
                id: "o".to_string(),
                owner_id: "7".to_string(),
                trigger: Trigger::Once { at },
                payload: "ping".to_string(),
            },
            next_fire: at,
        };
        assert_eq!(
            describe_schedule(&entry, chrono_tz::Asia::Baku, now()),
            "once on 2025-06-04 15:30 (Asia/Baku), in 3 days 8 hours"
        );
        assert!(describe_schedule(&entry, Tz::UTC, at).ends_with("any moment now"));
    }
}
