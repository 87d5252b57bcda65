//! Feed and search configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the paginated feed and its mock catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Items per page
    pub page_size: u32,
    /// Items in the mock catalog
    pub total_items: u32,
    /// Artificial latency per page, in milliseconds
    pub latency_ms: u64,
}

impl FeedConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With page size
    #[inline]
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// With catalog size
    #[inline]
    #[must_use]
    pub fn with_total_items(mut self, total_items: u32) -> Self {
        self.total_items = total_items;
        self
    }

    /// With latency in milliseconds
    #[inline]
    #[must_use]
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Latency as a duration
    #[inline]
    #[must_use]
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            total_items: 30,
            latency_ms: 500,
        }
    }
}

/// Settings for debounced search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period before a query is searched, in milliseconds
    pub debounce_ms: u64,
    /// Shorter trimmed queries clear results instead of searching
    pub min_query_len: usize,
    /// Artificial latency per search, in milliseconds
    pub latency_ms: u64,
}

impl SearchConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With debounce window in milliseconds
    #[inline]
    #[must_use]
    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    /// With minimum query length
    #[inline]
    #[must_use]
    pub fn with_min_query_len(mut self, min_query_len: usize) -> Self {
        self.min_query_len = min_query_len;
        self
    }

    /// With search latency in milliseconds
    #[inline]
    #[must_use]
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Debounce window as a duration
    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Latency as a duration
    #[inline]
    #[must_use]
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            min_query_len: 2,
            latency_ms: 200,
        }
    }
}
