//! Configuration for the notification core.
//!
//! Sources, lowest priority first:
//! 1. Default values (hardcoded)
//! 2. Config file passed to [`Settings::load`]
//! 3. File named by `SPACE_NOTIFY_CONFIG`
//! 4. Environment variables, e.g. `SPACE_NOTIFY__REAPER__INTERVAL_MS=250`

mod dispatch;
mod reaper;
pub use dispatch::*;
pub use reaper::*;


//---
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

pub const ENV_PREFIX: &str = "SPACE_NOTIFY";
pub const CONFIG_PATH_ENV: &str = "SPACE_NOTIFY_CONFIG";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    /// Matching and registration behaviour
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Background reaping of expired watchers
    #[serde(default)]
    pub reaper: ReaperConfig,
}

impl Settings {
    /// Loads and validates configuration from every source.
    ///
    /// # Arguments
    /// * `config_path` - Optional config file; must exist when given
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Config::builder();

        if let Some(path) = config_path {
            config = config.add_source(File::with_name(path).required(true));
        }

        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            config = config.add_source(File::with_name(&path).required(true));
        }

        config = config.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let settings: Settings = config.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.dispatch.validate()?;
        self.reaper.validate()?;
        Ok(())
    }
}
