use thiserror::Error;

/// Errors returned by the hosted row-store client.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-2xx status.
    #[error("row store returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The response body was not the expected JSON array.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl StoreError {
    /// Network failures, rate limiting and server errors are worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Http(_) => true,
            StoreError::Api { status, .. } => *status == 429 || *status >= 500,
            StoreError::Deserialize { .. } | StoreError::InvalidBaseUrl { .. } => false,
        }
    }
}

/// Errors returned by the geocoding client. "No match" is not an error.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoder returned HTTP {status}")]
    UnexpectedStatus { status: u16 },

    #[error("JSON deserialization error for geocoder response: {0}")]
    Deserialize(#[source] serde_json::Error),

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Why a submission was not saved.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("please fill in: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("start and end time must differ")]
    EmptyWindow,

    #[error("duration must be at least one minute")]
    InvalidDuration,

    #[error("could not find that address, please check it: {0}")]
    AddressNotFound(String),

    #[error("geocoding failed: {0}")]
    Geocode(#[from] GeocodeError),

    #[error("could not save special: {0}")]
    Store(#[from] StoreError),
}
