//! Time-of-day, delay and next-occurrence arithmetic
//!
//! Daily reminders are anchored to a local wall-clock time in an IANA zone.
//! The UTC offset is looked up from the zone rules for every occurrence, so
//! days that cross a daylight-saving change still fire at the same local time.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// A local wall-clock time with minute precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Parse `H:MM` or `HH:MM`
    pub fn parse(input: &str) -> Option<Self> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| {
            Regex::new(r"^([01]?\d|2[0-3]):([0-5]\d)$").expect("time-of-day pattern is valid")
        });
        let caps = re.captures(input.trim())?;
        let hour = caps[1].parse().ok()?;
        let minute = caps[2].parse().ok()?;
        Self::new(hour, minute)
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Compact form used inside reminder ids
    pub fn compact(&self) -> String {
        format!("{:02}{:02}", self.hour, self.minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Earliest instant strictly after `after` whose local time in `zone` is `time`.
///
/// A local time that falls in a spring-forward gap is moved forward by the
/// length of the gap. A local time that occurs twice on a fall-back day fires
/// at the earlier of the two instants only.
pub fn next_daily_occurrence(after: DateTime<Utc>, time: TimeOfDay, zone: Tz) -> DateTime<Utc> {
    let today = after.with_timezone(&zone).date_naive();

    for offset in -1..=2 {
        let date = today + Duration::days(offset);
        if let Some(candidate) = local_occurrence(date, time, zone) {
            if candidate > after {
                return candidate;
            }
        }
    }

    // Unreachable for real zone data; keep a sane answer rather than panic.
    after + Duration::days(1)
}

fn local_occurrence(date: NaiveDate, time: TimeOfDay, zone: Tz) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(time.hour, time.minute, 0)?;
    resolve_local(naive, zone)
}

/// Map a local date-time to UTC, applying the gap and overlap rules above
pub fn resolve_local(naive: NaiveDateTime, zone: Tz) -> Option<DateTime<Utc>> {
    if let Some(dt) = zone.from_local_datetime(&naive).earliest() {
        return Some(dt.with_timezone(&Utc));
    }

    // Inside a gap: interpret the wall time with the offset in force just
    // before the transition.
    for hours_back in 1..=24 {
        let probe = naive - Duration::hours(hours_back);
        if let Some(before) = zone.from_local_datetime(&probe).latest() {
            let offset = before.offset().fix().local_minus_utc();
            let utc = naive - Duration::seconds(i64::from(offset));
            return Some(Utc.from_utc_datetime(&utc));
        }
    }
    None
}

/// Parse `YYYY-MM-DD HH:MM` as a local time in `zone`
pub fn parse_local_datetime(input: &str, zone: Tz) -> Option<DateTime<Utc>> {
    let normalized = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let naive = NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M").ok()?;
    resolve_local(naive, zone)
}

/// Parse a delay like `30s`, `5m`, `2h`, `1d`, `1w` or `1h30m` into seconds
pub fn parse_duration(input: &str) -> Option<i64> {
    let input = input.trim().to_lowercase();
    let mut total: i64 = 0;
    let mut digits = String::new();

    for c in input.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if c.is_whitespace() && digits.is_empty() {
            continue;
        }
        if digits.is_empty() {
            return None;
        }

        let value: i64 = digits.parse().ok()?;
        digits.clear();

        let unit = match c {
            's' => 1,
            'm' => 60,
            'h' => 60 * 60,
            'd' => 60 * 60 * 24,
            'w' => 60 * 60 * 24 * 7,
            _ => return None,
        };
        total = total.checked_add(value.checked_mul(unit)?)?;
    }

    if !digits.is_empty() || total <= 0 {
        return None;
    }
    Some(total)
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// Human readable duration, two most significant units at most
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    if seconds < 60 {
        plural(seconds, "second")
    } else if seconds < 3600 {
        plural(seconds / 60, "minute")
    } else if seconds < 86400 {
        let (hours, mins) = (seconds / 3600, (seconds % 3600) / 60);
        if mins > 0 {
            format!("{} {}", plural(hours, "hour"), plural(mins, "minute"))
        } else {
            plural(hours, "hour")
        }
    } else {
        let (days, hours) = (seconds / 86400, (seconds % 86400) / 3600);
        if hours > 0 {
            format!("{} {}", plural(days, "day"), plural(hours, "hour"))
        } else {
            plural(days, "day")
        }
    }
}
