//! Parlor configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use parlor_rules::{ChainReaction, DEFAULT_COLS, DEFAULT_ROWS, GameKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use strum::IntoEnumIterator;
use tracing::{debug, info, instrument};

/// Settings for a parlor instance.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ParlorConfig {
    /// SQLite database file.
    #[serde(default = "default_database_path")]
    database_path: String,

    /// Chat identity of the bot itself.
    #[serde(default = "default_bot_id")]
    bot_id: String,

    /// Tracing filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    log_filter: String,

    /// Chain Reaction board rows.
    #[serde(default = "default_chain_reaction_rows")]
    chain_reaction_rows: usize,

    /// Chain Reaction board columns.
    #[serde(default = "default_chain_reaction_cols")]
    chain_reaction_cols: usize,

    /// Games the parlor hosts.
    #[serde(default = "default_enabled_games")]
    enabled_games: Vec<GameKind>,
}

#[instrument]
fn default_database_path() -> String {
    "parlor.db".to_string()
}

#[instrument]
fn default_bot_id() -> String {
    "parlor-bot".to_string()
}

#[instrument]
fn default_log_filter() -> String {
    "info".to_string()
}

#[instrument]
fn default_chain_reaction_rows() -> usize {
    DEFAULT_ROWS
}

#[instrument]
fn default_chain_reaction_cols() -> usize {
    DEFAULT_COLS
}

#[instrument]
fn default_enabled_games() -> Vec<GameKind> {
    GameKind::iter().collect()
}

impl Default for ParlorConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            bot_id: default_bot_id(),
            log_filter: default_log_filter(),
            chain_reaction_rows: default_chain_reaction_rows(),
            chain_reaction_cols: default_chain_reaction_cols(),
            enabled_games: default_enabled_games(),
        }
    }
}

impl ParlorConfig {
    /// Loads configuration from a TOML file and validates it.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_toml(&content)?;
        info!(database = %config.database_path, games = config.enabled_games.len(), "Config loaded successfully");
        Ok(config)
    }

    /// Parses and validates TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Uses a different database file.
    pub fn with_database_path(mut self, path: impl Into<String>) -> Self {
        self.database_path = path.into();
        self
    }

    /// Uses a different bot identity.
    pub fn with_bot_id(mut self, bot_id: impl Into<String>) -> Self {
        self.bot_id = bot_id.into();
        self
    }

    /// Checks values the type system cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_id.trim().is_empty() {
            return Err(ConfigError::new("bot_id must not be empty".to_string()));
        }
        if ChainReaction::with_size(self.chain_reaction_rows, self.chain_reaction_cols).is_none() {
            return Err(ConfigError::new(format!(
                "Unsupported Chain Reaction size {}x{}",
                self.chain_reaction_rows, self.chain_reaction_cols
            )));
        }
        if self.enabled_games.is_empty() {
            return Err(ConfigError::new("enabled_games must name at least one game".to_string()));
        }
        Ok(())
    }

    /// Returns true if `game` is hosted.
    pub fn is_enabled(&self, game: GameKind) -> bool {
        self.enabled_games.contains(&game)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
