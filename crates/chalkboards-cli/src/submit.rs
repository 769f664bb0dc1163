//! `submit-flash` and `submit-weekly` command handlers.

use std::fmt::Write as _;

use chalkboards_core::{AppConfig, TimeOfDay, Weekday};
use chalkboards_feed::{classify, Classified};
use chalkboards_store::{
    FlashDraft, Geocoder, Listing, SpecialsStore, SubmissionReceipt, Submitter, WeeklyDraft,
};
use chrono::{Local, Utc};

use crate::ListingArgs;

impl From<ListingArgs> for Listing {
    fn from(args: ListingArgs) -> Self {
        Listing {
            business_name: args.business_name,
            street: args.street,
            city: args.city,
            state: args.state,
            zip: args.zip,
            description: args.description,
        }
    }
}

fn build_submitter(config: &AppConfig) -> anyhow::Result<(SpecialsStore, Submitter)> {
    let store = SpecialsStore::from_config(config)?;
    let geocoder = Geocoder::from_config(config)?;
    Ok((store.clone(), Submitter::new(store, geocoder)))
}

/// Current specials, used to reuse the name already on file for an address.
/// A failed fetch only costs the name lookup, so it is logged and skipped.
async fn existing_specials(store: &SpecialsStore) -> Classified {
    match store.fetch_recent().await {
        Ok(rows) => classify(&rows),
        Err(e) => {
            tracing::warn!(error = %e, "could not load existing specials; using the name as typed");
            Classified::default()
        }
    }
}

pub(crate) fn describe_receipt(receipt: &SubmissionReceipt) -> String {
    let mut out = format!(
        "saved {} special for {}\n  {}\n  status: {}",
        receipt.kind,
        receipt.business_name,
        receipt.address,
        receipt.status.as_str()
    );
    if let Some(expires_at) = receipt.expires_at {
        let local = expires_at.with_timezone(&Local);
        let _ = write!(out, "\n  expires: {}", local.format("%a %l:%M %p"));
    }
    out
}

/// Validate, geocode and save a flash special.
///
/// # Errors
///
/// Returns an error if a field is blank, the address cannot be found, or the
/// store rejects the insert.
pub(crate) async fn run_submit_flash(
    config: &AppConfig,
    listing: ListingArgs,
    duration_minutes: Option<u32>,
) -> anyhow::Result<()> {
    let (store, submitter) = build_submitter(config)?;
    let existing = existing_specials(&store).await;
    let draft = FlashDraft {
        listing: listing.into(),
        duration_minutes,
    };
    let receipt = submitter.submit_flash(&draft, &existing, Utc::now()).await?;
    println!("{}", describe_receipt(&receipt));
    Ok(())
}

/// Validate, geocode and save a weekly special for moderation.
///
/// # Errors
///
/// Returns an error if a field is blank, the window is empty, the address
/// cannot be found, or the store rejects the insert.
pub(crate) async fn run_submit_weekly(
    config: &AppConfig,
    listing: ListingArgs,
    weekday: Weekday,
    start: TimeOfDay,
    end: TimeOfDay,
) -> anyhow::Result<()> {
    let (store, submitter) = build_submitter(config)?;
    let existing = existing_specials(&store).await;
    let draft = WeeklyDraft {
        listing: listing.into(),
        weekday,
        start,
        end,
    };
    let receipt = submitter.submit_weekly(&draft, &existing).await?;
    println!("{}", describe_receipt(&receipt));
    println!("  it will show in the feed once approved");
    Ok(())
}
