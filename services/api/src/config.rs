//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use score_ledger_core::{ScoringMode, MAX_PLAYERS, MIN_PLAYERS};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub data_dir: PathBuf,
    pub log_level: Level,
    pub scoring_mode: ScoringMode,
    /// Blank seats created for a ledger that starts with no saved game.
    pub initial_seats: usize,
    pub allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Storage Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let data_dir = lookup("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Ledger Settings ---
        let scoring_mode = match lookup("SCORING_MODE") {
            Some(raw) => raw
                .parse::<ScoringMode>()
                .map_err(|e| ConfigError::InvalidValue("SCORING_MODE".to_string(), e))?,
            None => ScoringMode::default(),
        };

        let initial_seats = match lookup("INITIAL_SEATS") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| (MIN_PLAYERS..=MAX_PLAYERS).contains(n))
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "INITIAL_SEATS".to_string(),
                        format!(
                            "'{}' is not a seat count between {} and {}",
                            raw, MIN_PLAYERS, MAX_PLAYERS
                        ),
                    )
                })?,
            None => 4,
        };

        let allowed_origin =
            lookup("ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            data_dir,
            log_level,
            scoring_mode,
            initial_seats,
            allowed_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.scoring_mode, ScoringMode::ZeroSum);
        assert_eq!(config.initial_seats, 4);
    }

    #[test]
    fn ledger_settings_are_read() {
        let config = config_from(&[("SCORING_MODE", "cumulative"), ("INITIAL_SEATS", "6")]).unwrap();
        assert_eq!(config.scoring_mode, ScoringMode::Cumulative);
        assert_eq!(config.initial_seats, 6);
    }

    #[test]
    fn out_of_range_seat_count_is_rejected() {
        let err = config_from(&[("INITIAL_SEATS", "12")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "INITIAL_SEATS"));
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        assert!(config_from(&[("BIND_ADDRESS", "not-an-address")]).is_err());
        assert!(config_from(&[("SCORING_MODE", "golf")]).is_err());
    }
}
