//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix for environment overrides, e.g. `BATTLE_META__ENGINE__MIN_SAMPLE=3`.
pub const ENV_PREFIX: &str = "BATTLE_META";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to load layered config: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Defaults and caps for the analytic queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Popularity queries only count battles whose primary player is ranked at or above this
    #[serde(default = "default_top_rank_threshold")]
    pub top_rank_threshold: u32,

    #[serde(default = "default_popularity_limit")]
    pub popularity_limit: usize,

    /// Minimum battles for a deck or combo to be ranked
    #[serde(default = "default_min_sample")]
    pub min_sample: u64,

    /// Minimum battles for a card to appear in card stats
    #[serde(default = "default_card_stats_min_sample")]
    pub card_stats_min_sample: u64,

    #[serde(default = "default_deck_limit")]
    pub deck_limit: usize,

    /// Win percentage a deck must exceed
    #[serde(default = "default_deck_win_rate_threshold")]
    pub deck_win_rate_threshold: f64,

    #[serde(default = "default_combo_limit")]
    pub combo_limit: usize,

    /// Win percentage a combo must reach when the caller gives none
    #[serde(default = "default_combo_win_rate_threshold")]
    pub combo_win_rate_threshold: f64,

    /// Combos enumerated per battle before truncation
    #[serde(default = "default_max_combos_per_battle")]
    pub max_combos_per_battle: usize,

    #[serde(default = "default_recent_battles_limit")]
    pub recent_battles_limit: usize,
}

fn default_top_rank_threshold() -> u32 {
    100
}

fn default_popularity_limit() -> usize {
    10
}

fn default_min_sample() -> u64 {
    5
}

fn default_card_stats_min_sample() -> u64 {
    1
}

fn default_deck_limit() -> usize {
    30
}

fn default_deck_win_rate_threshold() -> f64 {
    60.0
}

fn default_combo_limit() -> usize {
    10
}

fn default_combo_win_rate_threshold() -> f64 {
    50.0
}

fn default_max_combos_per_battle() -> usize {
    100
}

fn default_recent_battles_limit() -> usize {
    15
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_rank_threshold: default_top_rank_threshold(),
            popularity_limit: default_popularity_limit(),
            min_sample: default_min_sample(),
            card_stats_min_sample: default_card_stats_min_sample(),
            deck_limit: default_deck_limit(),
            deck_win_rate_threshold: default_deck_win_rate_threshold(),
            combo_limit: default_combo_limit(),
            combo_win_rate_threshold: default_combo_win_rate_threshold(),
            max_combos_per_battle: default_max_combos_per_battle(),
            recent_battles_limit: default_recent_battles_limit(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load an optional TOML file, then apply `BATTLE_META__*` environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let engine = &self.engine;

        for (name, value) in [
            ("popularity_limit", engine.popularity_limit),
            ("deck_limit", engine.deck_limit),
            ("combo_limit", engine.combo_limit),
            ("max_combos_per_battle", engine.max_combos_per_battle),
            ("recent_battles_limit", engine.recent_battles_limit),
        ] {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "engine.{} must be greater than 0",
                    name
                )));
            }
        }

        for (name, value) in [
            ("deck_win_rate_threshold", engine.deck_win_rate_threshold),
            ("combo_win_rate_threshold", engine.combo_win_rate_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "engine.{} must be between 0 and 100",
                    name
                )));
            }
        }

        Ok(())
    }
}
