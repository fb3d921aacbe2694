//! Weekly schedule model and next-slot resolution
//!
//! A user's recurring availability is a set of (weekday, time-of-day) slots.
//! `next_slot` turns that set plus "now" into the single next absolute
//! timestamp a new post should be scheduled for.

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Day of the week with the canonical Monday-first ordering used for
/// "days until" arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Position in the canonical order, Monday = 0
    pub fn index(&self) -> u32 {
        match self {
            Weekday::Mon => 0,
            Weekday::Tue => 1,
            Weekday::Wed => 2,
            Weekday::Thu => 3,
            Weekday::Fri => 4,
            Weekday::Sat => 5,
            Weekday::Sun => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Mon => "mon",
            Weekday::Tue => "tue",
            Weekday::Wed => "wed",
            Weekday::Thu => "thu",
            Weekday::Fri => "fri",
            Weekday::Sat => "sat",
            Weekday::Sun => "sun",
        }
    }

    pub fn from_chrono(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Mon,
            chrono::Weekday::Tue => Weekday::Tue,
            chrono::Weekday::Wed => Weekday::Wed,
            chrono::Weekday::Thu => Weekday::Thu,
            chrono::Weekday::Fri => Weekday::Fri,
            chrono::Weekday::Sat => Weekday::Sat,
            chrono::Weekday::Sun => Weekday::Sun,
        }
    }
}

impl std::str::FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mon" | "monday" => Ok(Weekday::Mon),
            "tue" | "tuesday" => Ok(Weekday::Tue),
            "wed" | "wednesday" => Ok(Weekday::Wed),
            "thu" | "thursday" => Ok(Weekday::Thu),
            "fri" | "friday" => Ok(Weekday::Fri),
            "sat" | "saturday" => Ok(Weekday::Sat),
            "sun" | "sunday" => Ok(Weekday::Sun),
            _ => Err(format!(
                "Unknown weekday: '{}'. Valid options: mon, tue, wed, thu, fri, sat, sun",
                s
            )),
        }
    }
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cyclic distance in days from `from` to the next occurrence of `to`.
/// Same day yields 0.
pub fn days_until(from: Weekday, to: Weekday) -> i64 {
    ((7 + to.index() - from.index()) % 7) as i64
}

/// A recurring (weekday, time-of-day) availability window.
///
/// Duplicates are harmless; the resolver treats each slot independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySlot {
    pub id: Option<i64>,
    pub user_id: String,
    pub day: Weekday,
    /// Minute granularity; seconds are ignored
    pub time: NaiveTime,
}

impl WeeklySlot {
    pub fn new(user_id: impl Into<String>, day: Weekday, time: NaiveTime) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            day,
            time,
        }
    }
}

/// Resolve the next publication timestamp for a user given "now" and their
/// weekly slots.
///
/// Today's remaining slots (time strictly after `now`) are considered with
/// distance 0; a slot on today's weekday whose time has already passed wraps
/// to next week (distance 7); every other day uses the cyclic distance from
/// the canonical ordering. The winner is the candidate with the smallest
/// `(days_until, time_of_day)`, composed at minute precision with seconds
/// zeroed. Returns `None` when the user has no slots; callers surface that as
/// "no available schedule" rather than defaulting to now.
pub fn next_slot(now: NaiveDateTime, slots: &[WeeklySlot]) -> Option<NaiveDateTime> {
    let today = Weekday::from_chrono(now.weekday());
    let now_time = now.time();

    let mut best: Option<(i64, NaiveTime)> = None;
    for slot in slots {
        let mut days = days_until(today, slot.day);
        if days == 0 && slot.time <= now_time {
            // Already passed today: next occurrence is a full week out
            days = 7;
        }

        let candidate = (days, slot.time);
        if best.map_or(true, |current| candidate < current) {
            best = Some(candidate);
        }
    }

    let (days, time) = best?;
    let time = time.with_second(0)?.with_nanosecond(0)?;
    let mut at = now.date().and_time(time) + Duration::days(days);
    // Guards the midnight boundary: the composed timestamp must be strictly
    // after now
    if at <= now {
        at += Duration::days(7);
    }
    Some(at)
}

/// Interpret a naive local timestamp as seconds since the epoch.
///
/// All timestamps in the store are produced and compared through this pair of
/// helpers, so consistency with the server clock is all that matters.
pub fn to_epoch(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp()
}

pub fn from_epoch(ts: i64) -> NaiveDateTime {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}
