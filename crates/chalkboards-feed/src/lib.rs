//! The specials feed pipeline: classify rows, evaluate them against the
//! clock, filter and rank by distance, then group into restaurant cards.
//!
//! Everything here is synchronous and side-effect free apart from `tracing`.

pub mod address;
pub mod canonical;
pub mod classify;
pub mod filter;
pub mod format;
pub mod geo;
pub mod group;
pub mod markers;
pub mod paging;
pub mod pipeline;
pub mod rank;
pub mod schedule;

pub use address::{compose_address, normalize_address, split_address};
pub use canonical::resolve_canonical_name;
pub use classify::{classify, classify_row, Classified, ClassifiedRow, RejectReason};
pub use filter::{matches_search, FeedMode, FeedQuery};
pub use format::{card_lines, distance_text, format_time_12h, pretty_window, CardLine};
pub use geo::{distance_miles, within_radius};
pub use group::{group_specials, FlashEntry, RecurringEntry, RestaurantGroup};
pub use markers::{build_markers, maps_url, report_mailto, MarkerDescriptor, ReportTarget};
pub use paging::{page, split_top, Page, Pager, TOP_COUNT};
pub use pipeline::{evaluate, run_classified, run_pipeline};
pub use rank::{filter_and_rank, EntryStatus, EvaluatedSpecial, NearbySpecial, Special};
pub use schedule::{
    expires_in_minutes, flash_status, recurring_status, EvalClock, FlashStatus, RecurringStatus,
};
