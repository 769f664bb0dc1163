//! Address lookup against a Nominatim-compatible `/search` endpoint.
//!
//! Lookups are never retried; a miss is reported to the submitter so they can
//! fix the address.

use std::time::Duration;

use chalkboards_core::{AppConfig, Coordinates};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::GeocodeError;

const DEFAULT_USER_AGENT: &str = "chalkboards/0.1 (specials-feed)";

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    client: Client,
    base_url: Url,
}

impl Geocoder {
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the client cannot be built or
    /// [`GeocodeError::InvalidBaseUrl`] for a malformed URL.
    pub fn from_config(config: &AppConfig) -> Result<Self, GeocodeError> {
        Self::build(
            &config.geocoder_url,
            config.request_timeout_secs,
            &config.user_agent,
        )
    }

    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the client cannot be built or
    /// [`GeocodeError::InvalidBaseUrl`] for a malformed URL.
    pub fn with_base_url(base_url: &str, timeout_secs: u64) -> Result<Self, GeocodeError> {
        Self::build(base_url, timeout_secs, DEFAULT_USER_AGENT)
    }

    fn build(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| GeocodeError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { client, base_url })
    }

    fn search_url(&self, address: &str) -> Result<Url, GeocodeError> {
        let mut url = self
            .base_url
            .join("search")
            .map_err(|e| GeocodeError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("limit", "1")
            .append_pair("q", address);
        Ok(url)
    }

    /// First match for `address`, or `None` when nothing matched.
    ///
    /// # Errors
    ///
    /// - [`GeocodeError::Http`] on network failure.
    /// - [`GeocodeError::UnexpectedStatus`] on a non-2xx status.
    /// - [`GeocodeError::Deserialize`] if the body is not a JSON array.
    pub async fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let url = self.search_url(address)?;
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        let places: Vec<Place> = serde_json::from_str(&body).map_err(GeocodeError::Deserialize)?;

        let found = places.first().and_then(|p| {
            let lat = p.lat.trim().parse::<f64>().ok()?;
            let lng = p.lon.trim().parse::<f64>().ok()?;
            Coordinates::new(lat, lng)
        });
        if found.is_none() {
            tracing::info!(address, "geocoder found no match");
        }
        Ok(found)
    }
}
