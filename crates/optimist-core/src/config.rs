//! Backend configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the simulated backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Artificial latency applied to every call, in milliseconds
    pub latency_ms: u64,
    /// Whether failure mode starts switched on
    pub fail_initially: bool,
}

impl BackendConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With latency in milliseconds
    #[inline]
    #[must_use]
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// With failure mode initially on or off
    #[inline]
    #[must_use]
    pub fn with_fail_initially(mut self, fail: bool) -> Self {
        self.fail_initially = fail;
        self
    }

    /// Latency as a duration
    #[inline]
    #[must_use]
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            latency_ms: 300,
            fail_initially: false,
        }
    }
}
