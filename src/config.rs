//! Typed configuration loaded from a TOML file
//!
//! Every section falls back to defaults, so a partial file only needs the keys
//! it changes. The file is only ever read.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::joystick::bus::{MAX_CHANNEL, MAX_RAW};
use crate::joystick::Polarity;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "JOYREACT_CONFIG";

const CONFIG_DIR: &str = ".joyreact";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("deadzone_in ({deadzone_in}) must be larger than deadzone_out ({deadzone_out})")]
    InvalidDeadzone { deadzone_in: u32, deadzone_out: u32 },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// One of trace, debug, info, warn, error
    pub log_level: String,
    pub joystick: JoystickConfig,
    pub leds: LedConfig,
    pub game: GameSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            joystick: JoystickConfig::default(),
            leds: LedConfig::default(),
            game: GameSettings::default(),
        }
    }
}

/// ADC wiring and classifier tuning
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct JoystickConfig {
    /// SPI bus index, `0` is `/dev/spidev0.*`
    pub spi_bus: u8,
    pub chip_select: u8,
    pub clock_hz: u32,

    pub x_channel: u8,
    pub y_channel: u8,

    /// Raw reading at rest
    pub center_x: i32,
    pub center_y: i32,

    /// Radius that has to be crossed to register a direction
    pub deadzone_in: u32,
    /// Radius the stick has to return within to release it
    pub deadzone_out: u32,

    /// Reads per axis averaged into one position
    pub sample_count: usize,
    /// Pause after every sample iteration, in microseconds
    pub settle_us: u64,

    pub x_polarity: Polarity,
    pub y_polarity: Polarity,
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            spi_bus: 0,
            chip_select: 0,
            clock_hz: 1_000_000,
            x_channel: 0,
            y_channel: 1,
            center_x: 2048,
            center_y: 2048,
            deadzone_in: 1200,
            deadzone_out: 900,
            sample_count: 4,
            settle_us: 500,
            x_polarity: Polarity::Normal,
            y_polarity: Polarity::Normal,
        }
    }
}

/// BCM pin numbers of the indicator LEDs
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LedConfig {
    pub green_pin: u8,
    pub red_pin: u8,
}

impl Default for LedConfig {
    fn default() -> Self {
        Self {
            green_pin: 17,
            red_pin: 27,
        }
    }
}

/// Timings of a reaction round, all in milliseconds
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GameSettings {
    /// Green/red alternations while getting ready
    pub ready_cycles: u32,
    pub ready_blink_ms: u64,
    /// Poll interval while waiting for the stick to be released
    pub release_poll_ms: u64,
    pub min_wait_ms: u64,
    pub max_wait_ms: u64,
    pub response_poll_ms: u64,
    pub response_timeout_ms: u64,
    pub flash_count: u32,
    pub flash_total_ms: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            ready_cycles: 4,
            ready_blink_ms: 250,
            release_poll_ms: 50,
            min_wait_ms: 500,
            max_wait_ms: 3000,
            response_poll_ms: 10,
            response_timeout_ms: 5000,
            flash_count: 5,
            flash_total_ms: 1000,
        }
    }
}

impl GameSettings {
    pub fn ready_blink(&self) -> Duration {
        Duration::from_millis(self.ready_blink_ms)
    }

    pub fn release_poll(&self) -> Duration {
        Duration::from_millis(self.release_poll_ms)
    }

    pub fn response_poll(&self) -> Duration {
        Duration::from_millis(self.response_poll_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn flash_total(&self) -> Duration {
        Duration::from_millis(self.flash_total_ms)
    }
}

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults { missing: PathBuf },
}

/// Everything worth telling the operator about a load
///
/// Loading happens before the log subscriber exists, so nothing is logged
/// here; `main` reports it once logging is up.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub source: ConfigSource,
    pub warnings: Vec<String>,
}

impl AppConfig {
    /// Loads from `$JOYREACT_CONFIG` or `~/.joyreact/config.toml`
    ///
    /// A missing file yields the defaults; a broken one is an error.
    pub fn load() -> Result<(Self, LoadReport), ConfigError> {
        let mut warnings = Vec::new();
        let path = config_path(&mut warnings);

        let (config, source) = if path.exists() {
            (Self::load_from(&path)?, ConfigSource::File(path))
        } else {
            (Self::default(), ConfigSource::Defaults { missing: path })
        };

        warnings.extend(config.warnings());
        Ok((config, LoadReport { source, warnings }))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let joystick = &self.joystick;

        if joystick.deadzone_in <= joystick.deadzone_out {
            return Err(ConfigError::InvalidDeadzone {
                deadzone_in: joystick.deadzone_in,
                deadzone_out: joystick.deadzone_out,
            });
        }
        for (name, channel) in [("x_channel", joystick.x_channel), ("y_channel", joystick.y_channel)] {
            if channel > MAX_CHANNEL {
                return Err(ConfigError::Invalid(format!(
                    "{} must be between 0 and {}, got {}",
                    name, MAX_CHANNEL, channel
                )));
            }
        }
        if joystick.sample_count == 0 {
            return Err(ConfigError::Invalid(
                "sample_count must be at least 1".to_string(),
            ));
        }
        for (name, center) in [("center_x", joystick.center_x), ("center_y", joystick.center_y)] {
            if !(0..=i32::from(MAX_RAW)).contains(&center) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be between 0 and {}, got {}",
                    name, MAX_RAW, center
                )));
            }
        }

        let game = &self.game;
        if game.min_wait_ms > game.max_wait_ms {
            return Err(ConfigError::Invalid(format!(
                "min_wait_ms ({}) is larger than max_wait_ms ({})",
                game.min_wait_ms, game.max_wait_ms
            )));
        }
        if game.flash_count == 0 {
            return Err(ConfigError::Invalid(
                "flash_count must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Settings that load fine but are probably a mistake
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.joystick.x_channel == self.joystick.y_channel {
            warnings.push(format!(
                "x_channel and y_channel are both CH{}",
                self.joystick.x_channel
            ));
        }
        if self.log_level.parse::<tracing::Level>().is_err() {
            warnings.push(format!("Unknown log_level {:?}, using info", self.log_level));
        }
        warnings
    }

    pub fn log_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

fn config_path(warnings: &mut Vec<String>) -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    get_home_dir(warnings).join(CONFIG_DIR).join(CONFIG_FILE)
}

fn get_home_dir(warnings: &mut Vec<String>) -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warnings.push("Could not determine home directory, using current directory".to_string());
        PathBuf::from(".")
    })
}
