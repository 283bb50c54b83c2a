//! Background reaping of lease-expired watchers
//!
//! ```toml
//! [reaper]
//! enabled = true
//! interval_ms = 1000
//! ```

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// When `enabled = true` a background worker calls
/// [`TransitionDispatcher::reap_all`](crate::TransitionDispatcher::reap_all)
/// every `interval_ms`. When disabled, reaping is left to the embedder.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ReaperConfig {
    /// **Default**: true
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Reap cadence in milliseconds
    ///
    /// Range: 10-3600000 (10ms to 1 hour). Upper bound on how long an
    /// expired watcher stays eligible for matching.
    ///
    /// **Default**: 1000
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_interval_ms() -> u64 {
    1000
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl ReaperConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        if !(10..=3_600_000).contains(&self.interval_ms) {
            return Err(Error::Config(ConfigError::Message(format!(
                "reaper interval_ms must be between 10 and 3600000, got {}",
                self.interval_ms
            ))));
        }

        Ok(())
    }
}
