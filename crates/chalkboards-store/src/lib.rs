//! Network side of the specials feed: the hosted row store, the geocoder,
//! the submission workflow and the periodic refresh task.

pub mod client;
pub mod error;
pub mod geocode;
pub mod refresh;
pub(crate) mod retry;
pub mod submit;

pub use client::{RowSource, SpecialsStore};
pub use error::{GeocodeError, StoreError, SubmitError};
pub use geocode::Geocoder;
pub use refresh::{spawn_refresh, FeedSnapshot, RefreshHandle, RefreshTrigger};
pub use submit::{
    FlashDraft, Listing, SubmissionReceipt, Submitter, WeeklyDraft, DEFAULT_FLASH_MINUTES,
};
