//! Configuration for the remote source.

use std::time::Duration;

/// Configuration for the remote recipe API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the API (no trailing slash).
    pub base_url: String,
    /// Opaque credential forwarded on every request.
    pub api_key: String,
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,
    /// Timeout for reading the response.
    pub read_timeout: Duration,
    /// Timeout for writing the request.
    pub write_timeout: Duration,
}

impl ApiConfig {
    /// Creates a configuration with the default timeouts.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(2),
            write_timeout: Duration::from_secs(2),
        }
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the write timeout.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new("https://recipesapi.herokuapp.com", "")
    }
}
