//! HTTP client for the hosted `specials` table (PostgREST-style REST API).
//!
//! Reads return [`RawRow`]s decoded one element at a time so a single odd
//! row never fails the batch. Inserts send one [`NewSpecialRow`].

use std::future::Future;
use std::time::Duration;

use chalkboards_core::{AppConfig, NewSpecialRow, RawRow};
use reqwest::{Client, Response, Url};

use crate::error::StoreError;
use crate::retry::retry_with_backoff;

const SPECIALS_PATH: &str = "rest/v1/specials";
const SELECT_COLUMNS: &str =
    "id,created_at,type,business_name,deal,address,expires_at,status,extra,lat,lng";
const DEFAULT_USER_AGENT: &str = "chalkboards/0.1 (specials-feed)";
const DEFAULT_FETCH_LIMIT: u32 = 800;

/// Anything that can produce the current set of raw rows.
///
/// The refresh task is generic over this so it can be driven by a fake in
/// tests.
pub trait RowSource: Send + Sync + 'static {
    fn fetch_rows(&self) -> impl Future<Output = Result<Vec<RawRow>, StoreError>> + Send;
}

/// Client for the row store.
///
/// Use [`SpecialsStore::from_config`] in binaries or
/// [`SpecialsStore::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct SpecialsStore {
    client: Client,
    api_key: String,
    base_url: Url,
    fetch_limit: u32,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl SpecialsStore {
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the `reqwest::Client` cannot be built
    /// or [`StoreError::InvalidBaseUrl`] if the configured URL is malformed.
    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        let store = Self::build(
            &config.store_key,
            config.request_timeout_secs,
            &config.store_url,
            &config.user_agent,
        )?;
        Ok(store
            .with_fetch_limit(config.fetch_limit)
            .with_retry(config.fetch_max_retries, config.fetch_backoff_base_secs))
    }

    /// Creates a client against a custom base URL with default limits and no
    /// retries.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the `reqwest::Client` cannot be built
    /// or [`StoreError::InvalidBaseUrl`] if `base_url` is malformed.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, StoreError> {
        Self::build(api_key, timeout_secs, base_url, DEFAULT_USER_AGENT)
    }

    fn build(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
        user_agent: &str,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| StoreError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            max_retries: 0,
            backoff_base_secs: 0,
        })
    }

    #[must_use]
    pub fn with_fetch_limit(mut self, limit: u32) -> Self {
        self.fetch_limit = limit;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_secs: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_secs = backoff_base_secs;
        self
    }

    /// Most recent rows, newest first, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Http`] on network failure after retries.
    /// - [`StoreError::Api`] on a non-2xx status.
    /// - [`StoreError::Deserialize`] if the body is not a JSON array.
    pub async fn fetch_recent(&self) -> Result<Vec<RawRow>, StoreError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            self.fetch_once()
        })
        .await
    }

    async fn fetch_once(&self) -> Result<Vec<RawRow>, StoreError> {
        let url = self.read_url()?;
        let response = self
            .client
            .get(url.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let body = response.text().await?;

        let elements: Vec<serde_json::Value> =
            serde_json::from_str(&body).map_err(|e| StoreError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;
        let total = elements.len();
        let rows: Vec<RawRow> = elements
            .into_iter()
            .filter_map(|v| serde_json::from_value::<RawRow>(v).ok())
            .collect();
        if rows.len() < total {
            tracing::debug!(
                skipped = total - rows.len(),
                "skipped undecodable store rows"
            );
        }
        tracing::debug!(rows = rows.len(), "fetched special rows");
        Ok(rows)
    }

    /// Inserts one row. Not retried: a timeout after the server committed
    /// would otherwise create a duplicate.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Http`] on network failure.
    /// - [`StoreError::Api`] on a non-2xx status.
    pub async fn insert(&self, row: &NewSpecialRow) -> Result<(), StoreError> {
        let url = self.table_url()?;
        let response = self
            .client
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(&[row])
            .send()
            .await?;
        Self::check_status(response).await?;
        tracing::info!(
            kind = row.kind.as_str(),
            business = %row.business_name,
            status = row.status.as_str(),
            "inserted special"
        );
        Ok(())
    }

    fn table_url(&self) -> Result<Url, StoreError> {
        self.base_url
            .join(SPECIALS_PATH)
            .map_err(|e| StoreError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    fn read_url(&self) -> Result<Url, StoreError> {
        let mut url = self.table_url()?;
        url.query_pairs_mut()
            .append_pair("select", SELECT_COLUMNS)
            .append_pair("order", "created_at.desc")
            .append_pair("limit", &self.fetch_limit.to_string());
        Ok(url)
    }

    /// Turns a non-2xx response into [`StoreError::Api`], preferring the
    /// `message` field of a JSON error body.
    async fn check_status(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| {
                v.get("message")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_owned)
            })
            .unwrap_or_else(|| {
                if text.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_owned()
                } else {
                    text
                }
            });
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl RowSource for SpecialsStore {
    fn fetch_rows(&self) -> impl Future<Output = Result<Vec<RawRow>, StoreError>> + Send {
        self.fetch_recent()
    }
}
