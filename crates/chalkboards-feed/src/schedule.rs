//! Temporal evaluation of flash and recurring specials against "now".
//!
//! Recurring windows are compared in minutes since local midnight. There is
//! no timezone model: on a daylight-saving transition day the minute
//! arithmetic is off by the shift, which is accepted.

use chalkboards_core::specials::MINUTES_PER_DAY;
use chalkboards_core::{FlashSpecial, RecurringSpecial, Weekday};
use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc};
use serde::Serialize;

/// Everything the evaluator needs to know about "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalClock {
    pub now: DateTime<Utc>,
    pub today: Weekday,
    pub yesterday: Weekday,
    /// Minutes since local midnight, `0..1440`.
    pub minutes: u32,
}

impl EvalClock {
    /// Derive weekday and minute-of-day from the wall clock of `now`'s zone.
    #[must_use]
    pub fn from_datetime<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let today = Weekday::from(now.weekday());
        Self {
            now: now.with_timezone(&Utc),
            today,
            yesterday: today.previous(),
            minutes: now.hour() * 60 + now.minute(),
        }
    }

    #[must_use]
    pub fn local_now() -> Self {
        Self::from_datetime(&Local::now())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlashStatus {
    pub active: bool,
}

/// A flash special is active on the closed interval `[created_at, expires_at]`.
#[must_use]
pub fn flash_status(special: &FlashSpecial, now: DateTime<Utc>) -> FlashStatus {
    FlashStatus {
        active: special.created_at <= now && now <= special.expires_at,
    }
}

/// Whole minutes until expiry, rounded up and never negative.
#[must_use]
pub fn expires_in_minutes(special: &FlashSpecial, now: DateTime<Utc>) -> i64 {
    let remaining_ms = (special.expires_at - now).num_milliseconds();
    if remaining_ms <= 0 {
        return 0;
    }
    (remaining_ms + 59_999) / 60_000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RecurringStatus {
    Active,
    Later { starts_in_minutes: u32 },
    Inactive,
}

impl RecurringStatus {
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, RecurringStatus::Active)
    }
}

/// Evaluate a recurring special at `now_minutes` past midnight on `today`.
///
/// Same-day specials are active inside `[start, end]`, where an end at or
/// before the start is pushed into the next day, and "later" before the
/// start. Yesterday's specials whose window crosses midnight stay active
/// until their end time this morning.
#[must_use]
pub fn recurring_status(
    special: &RecurringSpecial,
    today: Weekday,
    yesterday: Weekday,
    now_minutes: u32,
) -> RecurringStatus {
    let start = special.start.minutes();
    let end = special.end.minutes();
    let crosses = special.crosses_midnight();

    if special.weekday == today {
        let effective_end = if crosses { end + MINUTES_PER_DAY } else { end };
        if (start..=effective_end).contains(&now_minutes) {
            return RecurringStatus::Active;
        }
        if now_minutes < start {
            return RecurringStatus::Later {
                starts_in_minutes: start - now_minutes,
            };
        }
        return RecurringStatus::Inactive;
    }

    if crosses && special.weekday == yesterday {
        let shifted_now = now_minutes + MINUTES_PER_DAY;
        if (start..=end + MINUTES_PER_DAY).contains(&shifted_now) {
            return RecurringStatus::Active;
        }
    }

    RecurringStatus::Inactive
}

/// [`recurring_status`] using the fields of an [`EvalClock`].
#[must_use]
pub fn recurring_status_at(special: &RecurringSpecial, clock: &EvalClock) -> RecurringStatus {
    recurring_status(special, clock.today, clock.yesterday, clock.minutes)
}
