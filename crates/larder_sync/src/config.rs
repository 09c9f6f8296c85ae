//! Configuration for the synchronization engine.

use std::time::Duration;

/// Default staleness threshold for cached detail rows: 30 days.
pub const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::from_secs(60 * 60 * 24 * 30);

/// Configuration for synchronized resources.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// A cached detail row older than this is fetched again. Search
    /// pages are not staleness-checked; they always fetch.
    pub refresh_threshold: Duration,
}

impl SyncConfig {
    /// Creates a configuration with the default threshold.
    pub fn new() -> Self {
        Self {
            refresh_threshold: DEFAULT_REFRESH_THRESHOLD,
        }
    }

    /// Sets the staleness threshold.
    pub fn with_refresh_threshold(mut self, threshold: Duration) -> Self {
        self.refresh_threshold = threshold;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
