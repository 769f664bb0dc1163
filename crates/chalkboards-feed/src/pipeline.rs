//! Rows in, restaurant cards out.

use chalkboards_core::{Category, CategoryTable, RawRow};

use crate::classify::{classify, Classified};
use crate::filter::{matches_search, FeedMode, FeedQuery};
use crate::group::{group_specials, RestaurantGroup};
use crate::rank::{filter_and_rank, EntryStatus, EvaluatedSpecial, Special};
use crate::schedule::{flash_status, recurring_status_at, EvalClock, RecurringStatus};

/// Keep the specials that are showing at `clock`: active flash specials and
/// recurring specials that are active or start later today.
#[must_use]
pub fn evaluate(classified: &Classified, clock: &EvalClock) -> Vec<EvaluatedSpecial> {
    let flash = classified
        .flash
        .iter()
        .filter(|f| flash_status(f, clock.now).active)
        .map(|f| EvaluatedSpecial {
            special: Special::Flash(f.clone()),
            status: EntryStatus::Active,
        });

    let recurring = classified.recurring.iter().filter_map(|r| {
        let status = match recurring_status_at(r, clock) {
            RecurringStatus::Active => EntryStatus::Active,
            RecurringStatus::Later { starts_in_minutes } => {
                EntryStatus::Later { starts_in_minutes }
            }
            RecurringStatus::Inactive => return None,
        };
        Some(EvaluatedSpecial {
            special: Special::Recurring(r.clone()),
            status,
        })
    });

    flash.chain(recurring).collect()
}

/// Mode, search and category filters. Order is preserved.
#[must_use]
pub fn apply_filters(
    items: Vec<EvaluatedSpecial>,
    query: &FeedQuery,
    category: Option<&Category>,
) -> Vec<EvaluatedSpecial> {
    items
        .into_iter()
        .filter(|item| query.mode == FeedMode::Upcoming || item.status.is_active())
        .filter(|item| {
            let s = &item.special;
            matches_search(
                &query.search,
                &[s.business_name(), s.address(), s.description()],
            )
        })
        .filter(|item| {
            let s = &item.special;
            let fields = [s.description(), s.business_name(), s.address()];
            category.is_none_or(|c| c.matches(&fields))
        })
        .collect()
}

/// Run every stage over already classified specials.
#[must_use]
pub fn run_classified(
    classified: &Classified,
    clock: &EvalClock,
    query: &FeedQuery,
    categories: &CategoryTable,
) -> Vec<RestaurantGroup> {
    let category = query.resolve_category(categories);
    let evaluated = evaluate(classified, clock);
    let filtered = apply_filters(evaluated, query, category);
    let ranked = filter_and_rank(&filtered, query.origin, query.radius);
    let groups = group_specials(&ranked, clock.now);
    tracing::debug!(
        showing = filtered.len(),
        in_radius = ranked.len(),
        groups = groups.len(),
        mode = %query.mode,
        "feed computed"
    );
    groups
}

/// Classify `rows` and run the full feed pipeline.
#[must_use]
pub fn run_pipeline(
    rows: &[RawRow],
    clock: &EvalClock,
    query: &FeedQuery,
    categories: &CategoryTable,
) -> Vec<RestaurantGroup> {
    run_classified(&classify(rows), clock, query, categories)
}
