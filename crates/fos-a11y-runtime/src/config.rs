//! Runtime Configuration

use std::time::Duration;

use serde::Deserialize;

use crate::Result;

/// Runtime configuration options
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Delay between clearing the live region and writing the new message (ms)
    pub relay_delay_ms: u64,

    /// Default auto-clear timeout for announcements (ms, 0 = never clear)
    pub clear_timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            relay_delay_ms: 100,
            clear_timeout_ms: 5000,
        }
    }
}

impl RuntimeConfig {
    /// Parse a JSON configuration document; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Immediate relay and clear, for deterministic tests
    pub fn immediate() -> Self {
        Self { relay_delay_ms: 0, ..Self::default() }
    }

    pub fn relay_delay(&self) -> Duration {
        Duration::from_millis(self.relay_delay_ms)
    }

    pub fn clear_timeout(&self) -> Duration {
        Duration::from_millis(self.clear_timeout_ms)
    }
}
