//! Validated special types produced by the row classifier.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::geo::Coordinates;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    /// Canonical English name, e.g. `"Tuesday"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Weekday::Sunday => "Sunday",
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }

    /// Parse a weekday name or common abbreviation, ignoring case and
    /// surrounding whitespace (`"mon"`, `"Tues"`, `"THURS"`, `"saturday"`).
    #[must_use]
    pub fn parse_lenient(input: &str) -> Option<Self> {
        let day = match input.trim().to_lowercase().as_str() {
            "sun" | "sunday" => Weekday::Sunday,
            "mon" | "monday" => Weekday::Monday,
            "tue" | "tues" | "tuesday" => Weekday::Tuesday,
            "wed" | "weds" | "wednesday" => Weekday::Wednesday,
            "thu" | "thur" | "thurs" | "thursday" => Weekday::Thursday,
            "fri" | "friday" => Weekday::Friday,
            "sat" | "saturday" => Weekday::Saturday,
            _ => return None,
        };
        Some(day)
    }

    #[must_use]
    pub fn previous(self) -> Self {
        match self {
            Weekday::Sunday => Weekday::Saturday,
            Weekday::Monday => Weekday::Sunday,
            Weekday::Tuesday => Weekday::Monday,
            Weekday::Wednesday => Weekday::Tuesday,
            Weekday::Thursday => Weekday::Wednesday,
            Weekday::Friday => Weekday::Thursday,
            Weekday::Saturday => Weekday::Friday,
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Sun => Weekday::Sunday,
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Weekday::parse_lenient(s).ok_or_else(|| format!("unknown weekday '{s}'"))
    }
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A time of day in 24-hour form, stored as minutes since midnight (0..1440).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    /// Build from hour and minute; `None` outside `00:00..=23:59`.
    #[must_use]
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        u16::try_from(hour * 60 + minute).ok().map(Self)
    }

    /// Parse `"HH:MM"` (a single-digit hour is accepted).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let (h, m) = input.trim().split_once(':')?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return None;
        }
        if !h.bytes().all(|b| b.is_ascii_digit()) || !m.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Self::from_hm(h.parse().ok()?, m.parse().ok()?)
    }

    #[must_use]
    pub fn minutes(self) -> u32 {
        u32::from(self.0)
    }

    #[must_use]
    pub fn hour(self) -> u32 {
        self.minutes() / 60
    }

    #[must_use]
    pub fn minute(self) -> u32 {
        self.minutes() % 60
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TimeOfDay::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time of day '{raw}'")))
    }
}

/// Display components of a free-text `"street, city, state zip"` address.
///
/// Best effort only: missing segments are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressParts {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// A time-boxed promotion, visible between `created_at` and `expires_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashSpecial {
    pub id: String,
    pub business_name: String,
    pub address: String,
    pub address_parts: AddressParts,
    pub coordinates: Coordinates,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A weekly promotion on one weekday between two times of day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringSpecial {
    pub id: String,
    pub business_name: String,
    pub address: String,
    pub address_parts: AddressParts,
    pub coordinates: Coordinates,
    pub description: String,
    pub weekday: Weekday,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub created_at: DateTime<Utc>,
}

impl RecurringSpecial {
    /// A window whose end is at or before its start runs past midnight into
    /// the next calendar day. Equal start and end therefore means 24 hours.
    #[must_use]
    pub fn crosses_midnight(&self) -> bool {
        self.end <= self.start
    }
}
