//! Scanner configuration

use std::time::Duration;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Configuration for the advertisement scanner
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Default timeout for one-shot address lookups
    pub find_timeout: Duration,
    /// Pending advertisement count above which the dispatch loop logs a warning
    pub backlog_warn_threshold: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            find_timeout: Duration::from_secs(10),
            backlog_warn_threshold: 256,
        }
    }
}

impl ScannerConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default lookup timeout
    pub fn with_find_timeout(mut self, timeout: Duration) -> Self {
        self.find_timeout = timeout;
        self
    }

    /// Set the dispatch backlog warning threshold
    pub fn with_backlog_warn_threshold(mut self, threshold: usize) -> Self {
        self.backlog_warn_threshold = threshold;
        self
    }
}
