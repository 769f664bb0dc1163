use std::net::SocketAddr;
use std::path::PathBuf;

use crate::geo::{Coordinates, Radius};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub store_url: String,
    pub store_key: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub categories_path: Option<PathBuf>,
    pub geocoder_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub fetch_limit: u32,
    pub fetch_max_retries: u32,
    pub fetch_backoff_base_secs: u64,
    pub refresh_interval_secs: u64,
    pub default_origin: Coordinates,
    pub default_radius: Radius,
    pub page_size: usize,
    pub support_email: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("store_url", &self.store_url)
            .field("store_key", &"[redacted]")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("categories_path", &self.categories_path)
            .field("geocoder_url", &self.geocoder_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("fetch_limit", &self.fetch_limit)
            .field("fetch_max_retries", &self.fetch_max_retries)
            .field("fetch_backoff_base_secs", &self.fetch_backoff_base_secs)
            .field("refresh_interval_secs", &self.refresh_interval_secs)
            .field("default_origin", &self.default_origin)
            .field("default_radius", &self.default_radius)
            .field("page_size", &self.page_size)
            .field("support_email", &self.support_email)
            .finish()
    }
}
