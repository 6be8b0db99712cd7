//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::ledger::{EngineOptions, WriteMode};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis connection URL
    pub redis_url: String,

    /// Deadline for every store command
    pub store_timeout: Duration,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Atomic batches or sequential compatibility writes
    pub write_mode: WriteMode,

    /// Append applied transactions to the journal
    pub journal: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let redis_url = env::var("REDIS_URL").map_err(|_| ConfigError::MissingEnv("REDIS_URL"))?;

        let store_timeout_ms: u64 = env::var("STORE_TIMEOUT_MS")
            .unwrap_or_else(|_| "2000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("STORE_TIMEOUT_MS"))?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let write_mode = env::var("LEDGER_WRITE_MODE")
            .unwrap_or_else(|_| "atomic".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("LEDGER_WRITE_MODE"))?;

        let journal = parse_bool(
            &env::var("LEDGER_JOURNAL").unwrap_or_else(|_| "true".to_string()),
        )
        .ok_or(ConfigError::InvalidValue("LEDGER_JOURNAL"))?;

        Ok(Self {
            redis_url,
            store_timeout: Duration::from_millis(store_timeout_ms),
            host,
            port,
            environment,
            write_mode,
            journal,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            write_mode: self.write_mode,
            journal: self.journal,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
