//! Distance filtering and the canonical feed ordering.

use std::cmp::Ordering;

use chalkboards_core::{
    AddressParts, Coordinates, FlashSpecial, Radius, RecurringSpecial, SpecialKind,
};
use serde::Serialize;

use crate::geo::{distance_between, within_radius};

/// Either kind of special, after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Special {
    Flash(FlashSpecial),
    Recurring(RecurringSpecial),
}

impl Special {
    #[must_use]
    pub fn kind(&self) -> SpecialKind {
        match self {
            Special::Flash(_) => SpecialKind::Flash,
            Special::Recurring(_) => SpecialKind::Weekly,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Special::Flash(f) => &f.id,
            Special::Recurring(r) => &r.id,
        }
    }

    #[must_use]
    pub fn business_name(&self) -> &str {
        match self {
            Special::Flash(f) => &f.business_name,
            Special::Recurring(r) => &r.business_name,
        }
    }

    #[must_use]
    pub fn address(&self) -> &str {
        match self {
            Special::Flash(f) => &f.address,
            Special::Recurring(r) => &r.address,
        }
    }

    #[must_use]
    pub fn address_parts(&self) -> &AddressParts {
        match self {
            Special::Flash(f) => &f.address_parts,
            Special::Recurring(r) => &r.address_parts,
        }
    }

    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Special::Flash(f) => &f.description,
            Special::Recurring(r) => &r.description,
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        match self {
            Special::Flash(f) => f.coordinates,
            Special::Recurring(r) => r.coordinates,
        }
    }

    /// Minutes past midnight the window opens; flash specials have none.
    fn start_minutes(&self) -> Option<u32> {
        match self {
            Special::Flash(_) => None,
            Special::Recurring(r) => Some(r.start.minutes()),
        }
    }
}

/// Status of a special that made it into the feed. Inactive specials never
/// get this far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EntryStatus {
    Active,
    Later { starts_in_minutes: u32 },
}

impl EntryStatus {
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, EntryStatus::Active)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatedSpecial {
    pub special: Special,
    pub status: EntryStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NearbySpecial {
    pub special: Special,
    pub status: EntryStatus,
    pub distance_miles: f64,
}

/// Keep the specials inside `radius` of `origin` and order them: active
/// first, then nearest, then flash before recurring, then earliest start.
///
/// The input is left untouched; a new vector is returned.
#[must_use]
pub fn filter_and_rank(
    items: &[EvaluatedSpecial],
    origin: Coordinates,
    radius: Radius,
) -> Vec<NearbySpecial> {
    let mut ranked: Vec<NearbySpecial> = items
        .iter()
        .filter_map(|item| {
            let distance_miles = distance_between(origin, item.special.coordinates());
            within_radius(distance_miles, radius).then(|| NearbySpecial {
                special: item.special.clone(),
                status: item.status,
                distance_miles,
            })
        })
        .collect();
    ranked.sort_by(compare_ranked);
    ranked
}

fn compare_ranked(a: &NearbySpecial, b: &NearbySpecial) -> Ordering {
    b.status
        .is_active()
        .cmp(&a.status.is_active())
        .then_with(|| a.distance_miles.total_cmp(&b.distance_miles))
        .then_with(|| kind_rank(&a.special).cmp(&kind_rank(&b.special)))
        .then_with(|| a.special.start_minutes().cmp(&b.special.start_minutes()))
        .then_with(|| a.special.id().cmp(b.special.id()))
}

fn kind_rank(special: &Special) -> u8 {
    match special {
        Special::Flash(_) => 0,
        Special::Recurring(_) => 1,
    }
}
