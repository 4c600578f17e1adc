//! Backend connection settings.
//!
//! # Environment Variables
//!
//! - `SALES_API_URL`: base URL of the sales backend (default `http://localhost:8000`)
//! - `SALES_API_TIMEOUT_SECS`: per-request timeout in seconds (default 30)

use crate::error::{Error, Result};
use std::env;
use std::time::Duration;

pub const API_URL_VAR: &str = "SALES_API_URL";
pub const TIMEOUT_VAR: &str = "SALES_API_TIMEOUT_SECS";

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL without trailing slash.
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(url) = lookup(API_URL_VAR).filter(|u| !u.trim().is_empty()) {
            config = config.with_api_url(&url);
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be a whole number of seconds, got '{}'", TIMEOUT_VAR, raw))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.trim().trim_end_matches('/').to_string();
        self
    }
}
