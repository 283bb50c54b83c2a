use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Matching and registration behaviour of the
/// [`TransitionDispatcher`](crate::TransitionDispatcher).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DispatchConfig {
    /// Template type name that matches entries of every type.
    ///
    /// Templates reporting this type name are placed in the wildcard bucket,
    /// which is consulted for every transition.
    ///
    /// **Default**: `"*"`
    #[serde(default = "default_wildcard_type_name")]
    pub wildcard_type_name: String,

    /// Record prometheus metrics for registrations, matches and reaps
    ///
    /// **Default**: false
    #[serde(default)]
    pub enable_metrics: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            wildcard_type_name: default_wildcard_type_name(),
            enable_metrics: false,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.wildcard_type_name.trim().is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "dispatch.wildcard_type_name must not be empty".into(),
            )));
        }
        Ok(())
    }
}

fn default_wildcard_type_name() -> String {
    "*".to_string()
}
