//! Merge ranked specials into one card per physical restaurant.

use std::collections::{HashMap, HashSet};

use chalkboards_core::{AddressParts, Coordinates, SpecialKind, TimeOfDay};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::address::normalize_address;
use crate::rank::{EntryStatus, NearbySpecial, Special};
use crate::schedule::expires_in_minutes;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashEntry {
    pub id: String,
    pub description: String,
    pub expires_at: DateTime<Utc>,
    pub expires_in_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecurringEntry {
    pub id: String,
    pub description: String,
    #[serde(flatten)]
    pub status: EntryStatus,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// Everything shown on one restaurant card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestaurantGroup {
    /// Normalized address shared by every member.
    pub key: String,
    pub business_name: String,
    pub address: String,
    pub address_parts: AddressParts,
    pub coordinates: Coordinates,
    /// Distance of the nearest member.
    pub distance_miles: f64,
    pub has_active: bool,
    pub flash: Vec<FlashEntry>,
    pub recurring: Vec<RecurringEntry>,
}

/// Title shown for a card whose business name is blank.
pub const FALLBACK_BUSINESS_NAME: &str = "Business";

impl RestaurantGroup {
    /// Business name for display, or [`FALLBACK_BUSINESS_NAME`] when blank.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.business_name.trim().is_empty() {
            FALLBACK_BUSINESS_NAME
        } else {
            self.business_name.as_str()
        }
    }

    /// Kind used for issue reports: flash if the card has any flash entry.
    #[must_use]
    pub fn report_kind(&self) -> SpecialKind {
        if self.flash.is_empty() {
            SpecialKind::Weekly
        } else {
            SpecialKind::Flash
        }
    }

    /// First description on the card, flash entries first.
    #[must_use]
    pub fn lead_description(&self) -> Option<&str> {
        self.flash
            .first()
            .map(|f| f.description.as_str())
            .or_else(|| self.recurring.first().map(|r| r.description.as_str()))
    }
}

/// Group specials by normalized address.
///
/// Recurring members are visited before flash members, so a group takes its
/// display name and pin from its first recurring special when it has one.
/// Identical entries collapse, entries are sorted inside each card, and
/// cards are sorted active first, then nearest, then by name.
#[must_use]
pub fn group_specials(items: &[NearbySpecial], now: DateTime<Utc>) -> Vec<RestaurantGroup> {
    let mut order: Vec<RestaurantGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut seen: HashSet<(usize, String)> = HashSet::new();

    let is_recurring = |n: &&NearbySpecial| matches!(n.special, Special::Recurring(_));
    let recurring_first = items
        .iter()
        .filter(is_recurring)
        .chain(items.iter().filter(|n| !is_recurring(n)));

    for item in recurring_first {
        let key = normalize_address(item.special.address());
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            order.push(RestaurantGroup {
                key,
                business_name: item.special.business_name().to_string(),
                address: item.special.address().to_string(),
                address_parts: item.special.address_parts().clone(),
                coordinates: item.special.coordinates(),
                distance_miles: item.distance_miles,
                has_active: false,
                flash: Vec::new(),
                recurring: Vec::new(),
            });
            order.len() - 1
        });
        let group = &mut order[slot];
        group.distance_miles = group.distance_miles.min(item.distance_miles);

        match &item.special {
            Special::Flash(f) => {
                group.has_active = true;
                if seen.insert((slot, format!("flash|{}", f.description))) {
                    group.flash.push(FlashEntry {
                        id: f.id.clone(),
                        description: f.description.clone(),
                        expires_at: f.expires_at,
                        expires_in_minutes: expires_in_minutes(f, now),
                    });
                }
            }
            Special::Recurring(r) => {
                if item.status.is_active() {
                    group.has_active = true;
                }
                let dedup = format!(
                    "weekly|{}|{}|{}|{}",
                    r.description,
                    r.start,
                    r.end,
                    status_label(item.status)
                );
                if seen.insert((slot, dedup)) {
                    group.recurring.push(RecurringEntry {
                        id: r.id.clone(),
                        description: r.description.clone(),
                        status: item.status,
                        start: r.start,
                        end: r.end,
                    });
                }
            }
        }
    }

    for group in &mut order {
        group.flash.sort_by_key(|e| (e.expires_at, e.id.clone()));
        group.recurring.sort_by(|a, b| {
            b.status
                .is_active()
                .cmp(&a.status.is_active())
                .then_with(|| a.start.cmp(&b.start))
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    order.sort_by(|a, b| {
        b.has_active
            .cmp(&a.has_active)
            .then_with(|| a.distance_miles.total_cmp(&b.distance_miles))
            .then_with(|| {
                a.business_name
                    .to_lowercase()
                    .cmp(&b.business_name.to_lowercase())
            })
            .then_with(|| a.key.cmp(&b.key))
    });
    order
}

fn status_label(status: EntryStatus) -> &'static str {
    match status {
        EntryStatus::Active => "active",
        EntryStatus::Later { .. } => "later",
    }
}
