//! Row classifier: turns loosely-typed store rows into validated specials.
//!
//! Every row goes through [`classify_row`], which yields exactly one of
//! [`ClassifiedRow::Flash`], [`ClassifiedRow::Recurring`] or
//! [`ClassifiedRow::Invalid`]. Bad rows never abort a batch.

use std::fmt;

use chalkboards_core::{Coordinates, FlashSpecial, RawRow, RecurringSpecial, TimeOfDay, Weekday};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::address::split_address;

const APPROVED_STATUSES: &[&str] = &["approved", "approve", "live", "published"];
const FLASH_KINDS: &[&str] = &["flash", "f", "flash_special"];
const RECURRING_KINDS: &[&str] = &["weekly", "w", "weekly_special", "recurring"];

/// Why a row was left out of the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    NotApproved,
    UnknownKind,
    MissingId,
    MissingBusinessName,
    MissingAddress,
    MissingDescription,
    MissingCoordinates,
    InvalidCreatedAt,
    InvalidExpiresAt,
    InvalidWeeklyMeta,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RejectReason::NotApproved => "not approved",
            RejectReason::UnknownKind => "unknown kind",
            RejectReason::MissingId => "missing id",
            RejectReason::MissingBusinessName => "missing business name",
            RejectReason::MissingAddress => "missing address",
            RejectReason::MissingDescription => "missing description",
            RejectReason::MissingCoordinates => "missing or non-finite coordinates",
            RejectReason::InvalidCreatedAt => "unparsable created_at",
            RejectReason::InvalidExpiresAt => "missing or unparsable expires_at",
            RejectReason::InvalidWeeklyMeta => "unparsable weekly metadata",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedRow {
    Flash(FlashSpecial),
    Recurring(RecurringSpecial),
    Invalid(RejectReason),
}

/// The two valid outputs of a classification batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classified {
    pub flash: Vec<FlashSpecial>,
    pub recurring: Vec<RecurringSpecial>,
}

/// Weekday and window decoded from a row's `extra` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyWindow {
    pub weekday: Weekday,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// Classify a whole batch, keeping input order within each output list.
#[must_use]
pub fn classify(rows: &[RawRow]) -> Classified {
    let mut out = Classified::default();
    let mut rejected = 0usize;

    for row in rows {
        match classify_row(row) {
            ClassifiedRow::Flash(f) => out.flash.push(f),
            ClassifiedRow::Recurring(r) => out.recurring.push(r),
            ClassifiedRow::Invalid(reason) => {
                rejected += 1;
                tracing::debug!(id = row.id.as_deref(), %reason, "skipping special row");
            }
        }
    }

    tracing::debug!(
        flash = out.flash.len(),
        recurring = out.recurring.len(),
        rejected,
        "classified special rows"
    );
    out
}

/// Validate a single row into a flash or recurring special.
#[must_use]
pub fn classify_row(row: &RawRow) -> ClassifiedRow {
    match try_classify(row) {
        Ok(classified) => classified,
        Err(reason) => ClassifiedRow::Invalid(reason),
    }
}

enum Kind {
    Flash,
    Recurring,
}

fn try_classify(row: &RawRow) -> Result<ClassifiedRow, RejectReason> {
    if !is_approved(row.status.as_deref()) {
        return Err(RejectReason::NotApproved);
    }
    let kind = match_kind(row.kind.as_deref()).ok_or(RejectReason::UnknownKind)?;

    let id = non_empty(row.id.as_deref()).ok_or(RejectReason::MissingId)?;
    let address = non_empty(row.address.as_deref()).ok_or(RejectReason::MissingAddress)?;
    let business_name =
        non_empty(row.business_name.as_deref()).ok_or(RejectReason::MissingBusinessName)?;
    let description = non_empty(row.deal.as_deref()).ok_or(RejectReason::MissingDescription)?;
    let coordinates = row
        .lat
        .zip(row.lng)
        .and_then(|(lat, lng)| Coordinates::new(lat, lng))
        .ok_or(RejectReason::MissingCoordinates)?;

    let address_parts = split_address(address);

    match kind {
        Kind::Flash => {
            let expires_at = row
                .expires_at
                .as_deref()
                .and_then(parse_instant)
                .ok_or(RejectReason::InvalidExpiresAt)?;
            let created_at = row
                .created_at
                .as_deref()
                .and_then(parse_instant)
                .ok_or(RejectReason::InvalidCreatedAt)?;
            Ok(ClassifiedRow::Flash(FlashSpecial {
                id: id.to_string(),
                business_name: business_name.to_string(),
                address: address.to_string(),
                address_parts,
                coordinates,
                description: description.to_string(),
                created_at,
                expires_at,
            }))
        }
        Kind::Recurring => {
            let window = row
                .extra
                .as_ref()
                .and_then(parse_weekly_meta)
                .ok_or(RejectReason::InvalidWeeklyMeta)?;
            let created_at = row
                .created_at
                .as_deref()
                .and_then(parse_instant)
                .ok_or(RejectReason::InvalidCreatedAt)?;
            Ok(ClassifiedRow::Recurring(RecurringSpecial {
                id: id.to_string(),
                business_name: business_name.to_string(),
                address: address.to_string(),
                address_parts,
                coordinates,
                description: description.to_string(),
                weekday: window.weekday,
                start: window.start,
                end: window.end,
                created_at,
            }))
        }
    }
}

/// Absent status counts as approved (legacy rows predate moderation).
fn is_approved(status: Option<&str>) -> bool {
    match status {
        None => true,
        Some(s) => {
            let s = s.trim().to_lowercase();
            APPROVED_STATUSES.contains(&s.as_str())
        }
    }
}

fn match_kind(kind: Option<&str>) -> Option<Kind> {
    let k = kind?.trim().to_lowercase();
    if FLASH_KINDS.contains(&k.as_str()) {
        Some(Kind::Flash)
    } else if RECURRING_KINDS.contains(&k.as_str()) {
        Some(Kind::Recurring)
    } else {
        None
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// Parse a store timestamp. Accepts RFC 3339 and the space-separated
/// Postgres form; timestamps without an offset are read as UTC.
#[must_use]
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

#[derive(Deserialize)]
struct RawWeeklyMeta {
    day: Option<serde_json::Value>,
    start: Option<serde_json::Value>,
    end: Option<serde_json::Value>,
}

/// Decode weekly metadata from either a JSON object or a JSON-encoded string.
#[must_use]
pub fn parse_weekly_meta(extra: &serde_json::Value) -> Option<WeeklyWindow> {
    let meta: RawWeeklyMeta = match extra {
        serde_json::Value::Object(_) => serde_json::from_value(extra.clone()).ok()?,
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            serde_json::from_str(trimmed).ok()?
        }
        _ => return None,
    };

    let weekday = Weekday::parse_lenient(&value_text(meta.day.as_ref())?)?;
    let start = TimeOfDay::parse(&value_text(meta.start.as_ref())?)?;
    let end = TimeOfDay::parse(&value_text(meta.end.as_ref())?)?;
    Some(WeeklyWindow {
        weekday,
        start,
        end,
    })
}

fn value_text(value: Option<&serde_json::Value>) -> Option<String> {
    let text = match value? {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod tests;
