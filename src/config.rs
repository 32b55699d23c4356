use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    GAME_OVER_TICKS, MAX_CATCH_UP_TICKS, MIN_RESPONSE_LEN, RESPONSE_TIMEOUT_TICKS,
    SYNC_CADENCE_TICKS, TICK_MS, TITLE_TICKS, VELOCITY_FACTOR,
};
use crate::transport::ShadowEndpoint;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid option {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyncConfig {
    pub cadence_ticks: u32,
    pub min_response_len: usize,
    /// `None` waits for a response forever.
    pub response_timeout_ticks: Option<u32>,
    pub selected_ghost: usize,
    pub endpoint: ShadowEndpoint,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cadence_ticks: SYNC_CADENCE_TICKS,
            min_response_len: MIN_RESPONSE_LEN,
            response_timeout_ticks: Some(RESPONSE_TIMEOUT_TICKS),
            selected_ghost: 0,
            endpoint: ShadowEndpoint::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameOptions {
    pub seed: u32,
    pub tick_ms: u64,
    pub max_catch_up_ticks: u32,
    pub title_ticks: u32,
    pub game_over_ticks: u32,
    pub velocity_factor: i32,
    pub note_ticks: u32,
    /// Level text; the bundled maze when absent.
    pub level: Option<String>,
    pub sync: SyncConfig,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            seed: 1,
            tick_ms: TICK_MS,
            max_catch_up_ticks: MAX_CATCH_UP_TICKS,
            title_ticks: TITLE_TICKS,
            game_over_ticks: GAME_OVER_TICKS,
            velocity_factor: VELOCITY_FACTOR,
            note_ticks: 3,
            level: None,
            sync: SyncConfig::default(),
        }
    }
}

impl GameOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "tickMs",
                reason: "must be positive".to_string(),
            });
        }
        if self.sync.cadence_ticks == 0 {
            return Err(ConfigError::Invalid {
                field: "sync.cadenceTicks",
                reason: "must be positive".to_string(),
            });
        }
        if self.sync.response_timeout_ticks == Some(0) {
            return Err(ConfigError::Invalid {
                field: "sync.responseTimeoutTicks",
                reason: "must be positive or null".to_string(),
            });
        }
        if self.note_ticks == 0 {
            return Err(ConfigError::Invalid {
                field: "noteTicks",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

pub fn parse_options(text: &str, origin: &str) -> Result<GameOptions, ConfigError> {
    let options: GameOptions = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
        path: origin.to_string(),
        source,
    })?;
    options.validate()?;
    Ok(options)
}

pub fn load_options(path: &Path) -> Result<GameOptions, ConfigError> {
    let origin = path.to_string_lossy().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: origin.clone(),
        source,
    })?;
    parse_options(&text, &origin)
}
