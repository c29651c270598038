use std::env;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{GameSettings, MAX_MOVES_UNTIL_RESET};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Could not parse {name}={value} as {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{name} must be {requirement}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: u32,
        requirement: &'static str,
    },
}

/// Server configuration, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Settings every new lobby starts with.
    pub game: GameSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = GameSettings::default();

        let host = lookup("MINECHESS_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = read(&lookup, "MINECHESS_PORT", 25568u16, "a port number")?;
        let start = read(&lookup, "MINECHESS_START_TIME", defaults.time_controls.0, "seconds")?;
        let increment = read(&lookup, "MINECHESS_INCREMENT", defaults.time_controls.1, "seconds")?;
        let per_side = read(&lookup, "MINECHESS_MINES_PER_SIDE", defaults.mine_count / 2, "a mine count")?;
        let moves_until_reset = read(
            &lookup,
            "MINECHESS_MOVES_UNTIL_RESET",
            defaults.moves_until_reset,
            "a move count",
        )?;

        if start == 0 {
            return Err(ConfigError::OutOfRange {
                name: "MINECHESS_START_TIME",
                value: start,
                requirement: "positive",
            });
        }
        if moves_until_reset > MAX_MOVES_UNTIL_RESET {
            return Err(ConfigError::OutOfRange {
                name: "MINECHESS_MOVES_UNTIL_RESET",
                value: moves_until_reset,
                requirement: "at most 2147483647",
            });
        }
        if per_side > 32 {
            return Err(ConfigError::OutOfRange {
                name: "MINECHESS_MINES_PER_SIDE",
                value: per_side,
                requirement: "at most 32",
            });
        }

        Ok(Config {
            host,
            port,
            game: GameSettings {
                time_controls: (start, increment),
                mine_count: per_side * 2,
                moves_until_reset,
            },
        })
    }
}

fn read<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
            expected,
        }),
    }
}
