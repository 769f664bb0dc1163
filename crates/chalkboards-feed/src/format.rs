//! Display text for cards and map popups.

use chalkboards_core::TimeOfDay;
use serde::Serialize;

use crate::group::RestaurantGroup;
use crate::rank::EntryStatus;

pub const ICON_NOW: &str = "🔥";
pub const ICON_UPCOMING: &str = "🕒";
pub const ICON_FLASH: &str = "⚡";

/// Lines a collapsed card shows before "show more".
pub const COLLAPSED_CARD_LINES: usize = 6;

/// `17:00` becomes `5:00 PM`; midnight is `12:00 AM`.
#[must_use]
pub fn format_time_12h(time: TimeOfDay) -> String {
    let hour = time.hour();
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let hour12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{hour12}:{:02} {suffix}", time.minute())
}

/// `5:00 PM – 7:00 PM`, or `All day` for a window from midnight to the end
/// of the day.
#[must_use]
pub fn pretty_window(start: TimeOfDay, end: TimeOfDay) -> String {
    let all_day = start.minutes() == 0 && (end.minutes() == 0 || end.minutes() == 23 * 60 + 59);
    if all_day {
        return "All day".to_string();
    }
    format!("{} – {}", format_time_12h(start), format_time_12h(end))
}

#[must_use]
pub fn distance_text(miles: f64) -> String {
    format!("{miles:.1} mi")
}

#[must_use]
pub fn expires_text(minutes: i64) -> String {
    format!("expires in {minutes} min")
}

#[must_use]
pub fn status_icon(status: EntryStatus) -> &'static str {
    match status {
        EntryStatus::Active => ICON_NOW,
        EntryStatus::Later { .. } => ICON_UPCOMING,
    }
}

/// One row on a card: the headline and the grey sub-line under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardLine {
    pub line: String,
    pub sub: String,
}

/// Card rows for a group, flash entries first.
#[must_use]
pub fn card_lines(group: &RestaurantGroup) -> Vec<CardLine> {
    let flash = group.flash.iter().map(|f| CardLine {
        line: format!("{ICON_FLASH} {}", f.description),
        sub: expires_text(f.expires_in_minutes),
    });
    let recurring = group.recurring.iter().map(|r| CardLine {
        line: format!("{} {}", status_icon(r.status), r.description),
        sub: pretty_window(r.start, r.end),
    });
    flash.chain(recurring).collect()
}
