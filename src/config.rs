//! # Configuration
//!
//! Settings the host application passes to view models when they are created.
//! Every field has a default, so an empty JSON object is a valid configuration.

use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

const DEFAULT_SERVICE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_VERIFICATION_BUS_CAPACITY: usize = 32;

/// View model configuration.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// How long a view model waits for a service call (save, vote, end poll)
    /// before giving up on it.
    pub service_timeout_secs: u64,

    /// Number of transaction notifications the verification bus buffers per
    /// subscriber before the slowest subscriber starts missing them.
    pub verification_bus_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_timeout_secs: DEFAULT_SERVICE_TIMEOUT_SECS,
            verification_bus_capacity: DEFAULT_VERIFICATION_BUS_CAPACITY,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON, filling in defaults for missing
    /// fields.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("parsing view model configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration values are usable.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.service_timeout_secs == 0 {
            bail!("service timeout must be at least one second");
        }
        if self.verification_bus_capacity == 0 {
            bail!("verification bus capacity must be greater than zero");
        }
        Ok(())
    }

    /// Service timeout as a [`Duration`].
    pub const fn service_timeout(&self) -> Duration {
        Duration::from_secs(self.service_timeout_secs)
    }
}
