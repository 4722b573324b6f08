//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::room::scoring::TieBreak;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origin for CORS (comma-separated list)
    pub client_origin: String,

    /// Duration of the final sliding-puzzle round
    pub puzzle_countdown: Duration,
    /// Tie-break strategy for the final standings
    pub tie_break: TieBreak,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Hosting platforms provide PORT; fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        };

        let puzzle_countdown_secs = match env::var("PUZZLE_COUNTDOWN_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("PUZZLE_COUNTDOWN_SECS"))?,
            Err(_) => 300,
        };

        let tie_break = match env::var("TIE_BREAK") {
            Ok(raw) => raw
                .parse::<TieBreak>()
                .map_err(|_| ConfigError::Invalid("TIE_BREAK"))?,
            Err(_) => TieBreak::JoinOrder,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            client_origin: env::var("CLIENT_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),

            puzzle_countdown: Duration::from_secs(puzzle_countdown_secs),
            tie_break,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_level: "info".to_string(),
            client_origin: "http://localhost:3000".to_string(),
            puzzle_countdown: Duration::from_secs(300),
            tie_break: TieBreak::JoinOrder,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
