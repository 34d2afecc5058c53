// SPDX-License-Identifier: GPL-3.0-only
//! Configuration loaded from `~/.config/brightness-control/config.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::controller::{DEFAULT_LEVEL_COUNT, DEFAULT_TURN_OFF_TIMEOUT};
use crate::error::ConfigError;

pub const CONFIG_DIR: &str = "brightness-control";
pub const CONFIG_FILE: &str = "config.toml";

/// How the screen is powered down
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerOffMethod {
    /// DDC/CI power mode (VCP 0xD6) on every monitor
    #[default]
    Ddc,
    /// Run `power_off_command`
    Command,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    /// Use the DDC/CI hardware channel
    pub hardware: bool,
    /// Backlight device under /sys/class/backlight; first one found if unset
    pub backlight_device: Option<String>,
    /// Number of generated levels when none is requested
    pub level_count: usize,
    /// Bounded wait of the screen-off command, in milliseconds
    pub turn_off_timeout_ms: u64,
    pub power_off: PowerOffMethod,
    pub power_off_command: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hardware: true,
            backlight_device: None,
            level_count: DEFAULT_LEVEL_COUNT,
            turn_off_timeout_ms: DEFAULT_TURN_OFF_TIMEOUT.as_millis() as u64,
            power_off: PowerOffMethod::default(),
            power_off_command: ["xset", "dpms", "force", "off"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`, or the default location when `None`
    ///
    /// A missing file yields the defaults; any other error is logged and
    /// the defaults are used.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::path) else {
            return Self::default();
        };

        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                error!("errors loading config: {}", err);
                Self::default()
            }
        }
    }

    pub fn turn_off_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_off_timeout_ms)
    }
}
