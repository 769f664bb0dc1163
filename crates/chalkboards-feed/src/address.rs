//! Address normalization (the restaurant grouping key) and display splitting.

use std::sync::LazyLock;

use chalkboards_core::AddressParts;
use regex::{Captures, Regex};

static APOSTROPHES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[’']").expect("valid regex"));
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.,]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static STREET_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = STREET_ABBREVIATIONS
        .iter()
        .map(|&(word, _)| word)
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"\b({alternation})\b");
    Regex::new(&pattern).expect("valid regex")
});

/// Street-type words and the abbreviation each one normalizes to.
const STREET_ABBREVIATIONS: &[(&str, &str)] = &[
    ("avenue", "ave"),
    ("street", "st"),
    ("road", "rd"),
    ("route", "rte"),
    ("drive", "dr"),
    ("lane", "ln"),
    ("highway", "hwy"),
    ("suite", "ste"),
    ("apartment", "apt"),
    ("boulevard", "blvd"),
    ("court", "ct"),
    ("place", "pl"),
    ("parkway", "pkwy"),
    ("terrace", "ter"),
];

fn abbreviate(caps: &Captures<'_>) -> String {
    let word = &caps[1];
    STREET_ABBREVIATIONS
        .iter()
        .find(|&&(long, _)| long == word)
        .map_or(word, |&(_, short)| short)
        .to_string()
}

/// Reduce a free-text address to the key used to merge specials at the same
/// physical location.
///
/// Lower-cases, drops apostrophes, turns periods and commas into spaces,
/// abbreviates common street-type words and collapses whitespace.
#[must_use]
pub fn normalize_address(input: &str) -> String {
    let lower = input.to_lowercase();
    let no_apostrophes = APOSTROPHES.replace_all(&lower, "");
    let separated = SEPARATORS.replace_all(&no_apostrophes, " ");
    let abbreviated = STREET_WORDS.replace_all(&separated, abbreviate);
    WHITESPACE.replace_all(&abbreviated, " ").trim().to_string()
}

/// Split `"street, city, state zip"` into display parts. Missing segments
/// come back empty; this never fails.
#[must_use]
pub fn split_address(full: &str) -> AddressParts {
    let parts: Vec<&str> = full.split(',').map(str::trim).collect();
    let street = parts.first().copied().unwrap_or_default().to_string();
    let city = parts.get(1).copied().unwrap_or_default().to_string();
    let mut state_zip = parts
        .get(2)
        .copied()
        .unwrap_or_default()
        .split_whitespace();
    let state = state_zip.next().unwrap_or_default().to_string();
    let zip = state_zip.next().unwrap_or_default().to_string();
    AddressParts {
        street,
        city,
        state,
        zip,
    }
}

/// Inverse of [`split_address`] for form input.
#[must_use]
pub fn compose_address(street: &str, city: &str, state: &str, zip: &str) -> String {
    format!(
        "{}, {}, {} {}",
        street.trim(),
        city.trim(),
        state.trim(),
        zip.trim()
    )
}
