//! Runtime configuration and its loaders.
//!
//! Values come from [`RuntimeConfig::default`], optionally a RON file, then
//! environment overrides:
//! - `TURN_DURATION_MS` - thinking time of the active player (default: 30000)
//! - `TRANSITION_DURATION_MS` - pause before a turn starts (default: 3000)
//! - `COMBAT_ROUND_MS` - combat round cadence (default: 5000)
//!
//! Unparseable environment values are ignored.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use game_core::GameConfig;

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub game_config: GameConfig,
    #[serde(rename = "turn_duration_ms", with = "duration_ms")]
    pub turn_duration: Duration,
    #[serde(rename = "transition_duration_ms", with = "duration_ms")]
    pub transition_duration: Duration,
    #[serde(rename = "combat_round_ms", with = "duration_ms")]
    pub combat_round_interval: Duration,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            game_config: GameConfig::default(),
            turn_duration: Self::DEFAULT_TURN_DURATION,
            transition_duration: Self::DEFAULT_TRANSITION_DURATION,
            combat_round_interval: Self::DEFAULT_COMBAT_ROUND_INTERVAL,
            event_buffer_size: 100,
            command_buffer_size: 32,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[source] ron::error::SpannedError),
}

impl RuntimeConfig {
    pub const DEFAULT_TURN_DURATION: Duration = Duration::from_secs(30);
    pub const DEFAULT_TRANSITION_DURATION: Duration = Duration::from_secs(3);
    pub const DEFAULT_COMBAT_ROUND_INTERVAL: Duration = Duration::from_secs(5);

    /// Parses a RON document. Missing fields keep their defaults.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        ron::from_str(source).map_err(ConfigError::Parse)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&content)
    }

    /// Applies the duration overrides found in the process environment.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(ms) = read_env::<u64>("TURN_DURATION_MS") {
            self.turn_duration = Duration::from_millis(ms);
        }
        if let Some(ms) = read_env::<u64>("TRANSITION_DURATION_MS") {
            self.transition_duration = Duration::from_millis(ms);
        }
        if let Some(ms) = read_env::<u64>("COMBAT_ROUND_MS") {
            self.combat_round_interval = Duration::from_millis(ms);
        }
        self
    }

    pub fn with_game_config(mut self, game_config: GameConfig) -> Self {
        self.game_config = game_config;
        self
    }

    pub fn with_turn_duration(mut self, duration: Duration) -> Self {
        self.turn_duration = duration;
        self
    }

    pub fn with_transition_duration(mut self, duration: Duration) -> Self {
        self.transition_duration = duration;
        self
    }

    pub fn with_combat_round_interval(mut self, interval: Duration) -> Self {
        self.combat_round_interval = interval;
        self
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    env::var(key).ok()?.trim().parse().ok()
}

/// Serializes a [`Duration`] as whole milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
