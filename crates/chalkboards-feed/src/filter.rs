//! Search text, category and feed-mode filters plus the query they travel in.

use std::fmt;
use std::str::FromStr;

use chalkboards_core::categories::ALL_CATEGORIES_KEY;
use chalkboards_core::{Category, CategoryTable, Coordinates, Radius};
use serde::{Deserialize, Serialize};

/// Which recurring entries the feed shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedMode {
    /// Active specials only.
    #[default]
    Now,
    /// Active specials plus recurring specials starting later today.
    Upcoming,
}

impl fmt::Display for FeedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedMode::Now => f.write_str("now"),
            FeedMode::Upcoming => f.write_str("upcoming"),
        }
    }
}

impl FromStr for FeedMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "now" => Ok(FeedMode::Now),
            "upcoming" | "later" => Ok(FeedMode::Upcoming),
            other => Err(format!(
                "unknown feed mode '{other}' (expected now or upcoming)"
            )),
        }
    }
}

/// Inputs to one pipeline run besides the rows and the clock.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedQuery {
    pub origin: Coordinates,
    pub radius: Radius,
    pub search: String,
    /// Category key; `None` or `"all"` disables the category filter.
    pub category: Option<String>,
    pub mode: FeedMode,
}

impl FeedQuery {
    #[must_use]
    pub fn new(origin: Coordinates, radius: Radius) -> Self {
        Self {
            origin,
            radius,
            search: String::new(),
            category: None,
            mode: FeedMode::Now,
        }
    }

    /// The category to filter by, if the key names one in `table`.
    #[must_use]
    pub fn resolve_category<'a>(&self, table: &'a CategoryTable) -> Option<&'a Category> {
        let key = self.category.as_deref()?.trim();
        if key.is_empty() || key.eq_ignore_ascii_case(ALL_CATEGORIES_KEY) {
            return None;
        }
        let found = table.get(key);
        if found.is_none() {
            tracing::debug!(category = key, "unknown category, not filtering");
        }
        found
    }
}

/// Case-insensitive substring match of `query` against the listed fields.
/// A blank query matches everything.
#[must_use]
pub fn matches_search(query: &str, fields: &[&str]) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields.iter().any(|f| f.to_lowercase().contains(&needle))
}
