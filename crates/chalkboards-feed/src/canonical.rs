//! Reuse the business name already on file for an address.

use chalkboards_core::{FlashSpecial, RecurringSpecial};

use crate::address::normalize_address;

/// Pick the business name to store for a new submission at `address`.
///
/// A recurring special already on file at the same normalized address wins,
/// then a flash special, then the name the submitter typed.
#[must_use]
pub fn resolve_canonical_name(
    address: &str,
    typed_name: &str,
    flash: &[FlashSpecial],
    recurring: &[RecurringSpecial],
) -> String {
    let key = normalize_address(address);
    recurring
        .iter()
        .find(|r| normalize_address(&r.address) == key)
        .map(|r| r.business_name.as_str())
        .or_else(|| {
            flash
                .iter()
                .find(|f| normalize_address(&f.address) == key)
                .map(|f| f.business_name.as_str())
        })
        .unwrap_or_else(|| typed_name.trim())
        .to_string()
}
