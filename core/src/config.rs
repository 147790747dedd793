//! Client configuration.
//!
//! The base URL is fixed once at construction. Token acquisition is out of
//! scope; a token obtained elsewhere can be supplied here and is sent as
//! `wstoken` on every call.

use std::time::Duration;

use crate::error::{ApiError, Result};

/// Path of Moodle's REST endpoint relative to the site root.
pub const REST_PATH: &str = "/webservice/rest/server.php";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Full REST endpoint URL.
    pub base_url: String,
    pub token: Option<String>,
    /// Deadline for one request, connect to last body byte. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: None,
        }
    }

    /// Endpoint URL for a site root such as `https://lms.example.edu`.
    pub fn for_site(site_url: &str) -> Self {
        Self::new(format!("{}{REST_PATH}", site_url.trim_end_matches('/')))
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Read `MOODLE_URL` (site root or full endpoint), `MOODLE_TOKEN` and
    /// `MOODLE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url = lookup("MOODLE_URL")
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ApiError::Config("MOODLE_URL is not set".to_string()))?;
        let mut config = if url.trim_end_matches('/').ends_with(REST_PATH) {
            Self::new(url)
        } else {
            Self::for_site(&url)
        };
        if let Some(token) = lookup("MOODLE_TOKEN").filter(|t| !t.is_empty()) {
            config.token = Some(token);
        }
        if let Some(secs) = lookup("MOODLE_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| ApiError::Config(format!("MOODLE_TIMEOUT_SECS is not a number: {secs}")))?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }
}
