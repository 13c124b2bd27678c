//! Engine Configuration

use std::path::Path;
use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::core::clock::{BlockClock, Clock, SystemClock};

/// Default length of the commit and reveal windows.
pub const DEFAULT_TIMEOUT_WINDOW: u64 = 5;

/// What one clock tick means.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    /// One tick per committed transaction (block height).
    Blocks,
    /// Wall-clock seconds.
    Seconds,
}

impl std::str::FromStr for TimeUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blocks" | "block" => Ok(TimeUnit::Blocks),
            "seconds" | "second" | "secs" => Ok(TimeUnit::Seconds),
            other => Err(ConfigError::InvalidValue {
                key: "RPS_TIME_UNIT",
                value: other.to_string(),
            }),
        }
    }
}

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Length of the commit window (from game creation) and of the reveal
    /// window (from the second commitment), in ticks of `time_unit`.
    pub timeout_window: u64,
    /// Unit of `timeout_window`.
    pub time_unit: TimeUnit,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_window: DEFAULT_TIMEOUT_WINDOW,
            time_unit: TimeUnit::Blocks,
        }
    }
}

impl EngineConfig {
    /// Config with a custom window in blocks.
    pub fn with_window(timeout_window: u64) -> Self {
        Self { timeout_window, ..Self::default() }
    }

    /// Defaults overridden by `RPS_TIMEOUT_WINDOW` and `RPS_TIME_UNIT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("RPS_TIMEOUT_WINDOW") {
            config.timeout_window = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "RPS_TIMEOUT_WINDOW",
                value: raw.clone(),
            })?;
        }
        if let Ok(raw) = std::env::var("RPS_TIME_UNIT") {
            config.time_unit = raw.parse()?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse from JSON; missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Fresh clock for `time_unit`.
    pub fn clock(&self) -> UnitClock {
        match self.time_unit {
            TimeUnit::Blocks => UnitClock::Blocks(BlockClock::new(0)),
            TimeUnit::Seconds => UnitClock::Seconds(SystemClock),
        }
    }

    /// Reject configurations that would make every window close instantly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_window == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_window",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Clock selected by [`TimeUnit`].
///
/// Clones share the block height, so the caller can keep a handle to mine
/// blocks while the engine owns another.
#[derive(Clone, Debug)]
pub enum UnitClock {
    /// Block height starting at 0.
    Blocks(BlockClock),
    /// Unix seconds.
    Seconds(SystemClock),
}

impl Clock for UnitClock {
    fn now(&self) -> u64 {
        match self {
            UnitClock::Blocks(clock) => clock.now(),
            UnitClock::Seconds(clock) => clock.now(),
        }
    }

    fn on_commit(&self) {
        match self {
            UnitClock::Blocks(clock) => clock.on_commit(),
            UnitClock::Seconds(clock) => clock.on_commit(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting could not be parsed or is out of range.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Setting name.
        key: &'static str,
        /// Offending value.
        value: String,
    },
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// Config file is not valid JSON.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
