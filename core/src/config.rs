//! Client configuration.
//!
//! The library never reads the environment; callers decide where the API
//! key comes from and hand it over here.

use std::fmt;
use std::time::Duration;

/// Base URL of the public Hevy API.
pub const HEVY_BASE_URL: &str = "https://api.hevyapp.com/v1";

/// Connection settings for `HevyClient`.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    /// Upper bound for a whole call. `None` leaves it to the transport.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: HEVY_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
