//! Validating, geocoding and saving new specials.

use chalkboards_core::{
    Coordinates, ModerationStatus, NewSpecialRow, SpecialKind, TimeOfDay, Weekday, WeeklyMeta,
};
use chalkboards_feed::{compose_address, resolve_canonical_name, Classified};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::client::SpecialsStore;
use crate::error::SubmitError;
use crate::geocode::Geocoder;
use crate::refresh::RefreshTrigger;

/// Flash specials run for two hours unless the submitter picks otherwise.
pub const DEFAULT_FLASH_MINUTES: u32 = 120;

/// Where the special is and what it offers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub business_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub description: String,
}

impl Listing {
    fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("business_name", &self.business_name),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zip", &self.zip),
            ("description", &self.description),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    #[must_use]
    pub fn full_address(&self) -> String {
        compose_address(&self.street, &self.city, &self.state, &self.zip)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashDraft {
    #[serde(flatten)]
    pub listing: Listing,
    /// Minutes until expiry; [`DEFAULT_FLASH_MINUTES`] when absent.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyDraft {
    #[serde(flatten)]
    pub listing: Listing,
    pub weekday: Weekday,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// What was saved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub kind: SpecialKind,
    pub business_name: String,
    pub address: String,
    pub coordinates: Coordinates,
    pub status: ModerationStatus,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Saves drafts through the row store and pokes the refresh task afterwards.
#[derive(Debug, Clone)]
pub struct Submitter {
    store: SpecialsStore,
    geocoder: Geocoder,
    refresh: Option<RefreshTrigger>,
}

impl Submitter {
    #[must_use]
    pub fn new(store: SpecialsStore, geocoder: Geocoder) -> Self {
        Self {
            store,
            geocoder,
            refresh: None,
        }
    }

    #[must_use]
    pub fn with_refresh(mut self, trigger: RefreshTrigger) -> Self {
        self.refresh = Some(trigger);
        self
    }

    /// Save a flash special. It is live immediately.
    ///
    /// `existing` is the current classified feed, used to reuse the business
    /// name already on file for the same address.
    ///
    /// # Errors
    ///
    /// [`SubmitError::MissingFields`], [`SubmitError::InvalidDuration`],
    /// [`SubmitError::AddressNotFound`] or a transport error. Nothing is
    /// saved on error.
    pub async fn submit_flash(
        &self,
        draft: &FlashDraft,
        existing: &Classified,
        now: DateTime<Utc>,
    ) -> Result<SubmissionReceipt, SubmitError> {
        let missing = draft.listing.missing_fields();
        if !missing.is_empty() {
            return Err(SubmitError::MissingFields(missing));
        }
        let minutes = draft.duration_minutes.unwrap_or(DEFAULT_FLASH_MINUTES);
        if minutes == 0 {
            return Err(SubmitError::InvalidDuration);
        }

        let address = draft.listing.full_address();
        let coordinates = self.locate(&address).await?;
        let business_name = resolve_canonical_name(
            &address,
            &draft.listing.business_name,
            &existing.flash,
            &existing.recurring,
        );
        let expires_at = now + Duration::minutes(i64::from(minutes));

        let row = NewSpecialRow {
            kind: SpecialKind::Flash,
            business_name,
            deal: draft.listing.description.trim().to_string(),
            address,
            expires_at: Some(expires_at),
            status: ModerationStatus::for_new(SpecialKind::Flash),
            extra: None,
            lat: coordinates.lat,
            lng: coordinates.lng,
        };
        self.save(row, coordinates).await
    }

    /// Save a weekly special. It waits for moderation before it shows up.
    ///
    /// # Errors
    ///
    /// [`SubmitError::MissingFields`], [`SubmitError::EmptyWindow`],
    /// [`SubmitError::AddressNotFound`] or a transport error. Nothing is
    /// saved on error.
    pub async fn submit_weekly(
        &self,
        draft: &WeeklyDraft,
        existing: &Classified,
    ) -> Result<SubmissionReceipt, SubmitError> {
        let missing = draft.listing.missing_fields();
        if !missing.is_empty() {
            return Err(SubmitError::MissingFields(missing));
        }
        if draft.start == draft.end {
            return Err(SubmitError::EmptyWindow);
        }

        let address = draft.listing.full_address();
        let coordinates = self.locate(&address).await?;
        let business_name = resolve_canonical_name(
            &address,
            &draft.listing.business_name,
            &existing.flash,
            &existing.recurring,
        );

        let row = NewSpecialRow {
            kind: SpecialKind::Weekly,
            business_name,
            deal: draft.listing.description.trim().to_string(),
            address,
            expires_at: None,
            status: ModerationStatus::for_new(SpecialKind::Weekly),
            extra: Some(WeeklyMeta {
                day: draft.weekday.name().to_string(),
                start: draft.start.to_string(),
                end: draft.end.to_string(),
            }),
            lat: coordinates.lat,
            lng: coordinates.lng,
        };
        self.save(row, coordinates).await
    }

    async fn locate(&self, address: &str) -> Result<Coordinates, SubmitError> {
        self.geocoder
            .geocode(address)
            .await?
            .ok_or_else(|| SubmitError::AddressNotFound(address.to_string()))
    }

    async fn save(
        &self,
        row: NewSpecialRow,
        coordinates: Coordinates,
    ) -> Result<SubmissionReceipt, SubmitError> {
        self.store.insert(&row).await?;
        if let Some(trigger) = &self.refresh {
            trigger.request_refresh();
        }
        Ok(SubmissionReceipt {
            kind: row.kind,
            business_name: row.business_name,
            address: row.address,
            coordinates,
            status: row.status,
            expires_at: row.expires_at,
        })
    }
}
