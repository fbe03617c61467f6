//! Server configuration from environment variables.

use repertoire_core::{FailPenalty, IntervalTable, LevelScheduler};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    Missing(&'static str),
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Backend configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub scheduler: LevelScheduler,
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// Env vars:
    /// - DATABASE_URL: PostgreSQL connection string (required)
    /// - HOST / PORT: bind address (default 0.0.0.0:3000)
    /// - REPETITION_INTERVAL_HOURS: comma separated hours per level
    /// - FAIL_LEVEL_PENALTY: levels dropped on a failed review (default 2)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                reason: format!("not a port number: {raw:?}"),
            })?,
            None => 3000,
        };

        let table = match lookup("REPETITION_INTERVAL_HOURS") {
            Some(raw) => raw.parse::<IntervalTable>().map_err(|e| ConfigError::Invalid {
                name: "REPETITION_INTERVAL_HOURS",
                reason: e.to_string(),
            })?,
            None => IntervalTable::default(),
        };
        let penalty = match lookup("FAIL_LEVEL_PENALTY") {
            Some(raw) => FailPenalty::StepBack(raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "FAIL_LEVEL_PENALTY",
                reason: format!("not a level count: {raw:?}"),
            })?),
            None => FailPenalty::default(),
        };

        Ok(Self {
            database_url,
            host,
            port,
            scheduler: LevelScheduler::new(table, penalty),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
