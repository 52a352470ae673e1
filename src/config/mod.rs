//! Configuration module for the GLV backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.
//! The token signing key is the one value that has no default.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const JWT_KEY_VAR: &str = "GLV_JWT_PRIVATE_KEY";
pub const DB_PATH_VAR: &str = "GLV_DB_PATH";
pub const BIND_ADDR_VAR: &str = "GLV_BIND_ADDR";
pub const LOG_LEVEL_VAR: &str = "GLV_LOG_LEVEL";
pub const TOKEN_TTL_VAR: &str = "GLV_TOKEN_TTL_HOURS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("FATAL ERROR: {0} is not defined")]
    Missing(&'static str),
    #[error("Invalid {var} value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Secret used to sign and verify bearer tokens
    pub jwt_secret: String,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Lifetime of tokens minted by `issue-token`
    pub token_ttl: Duration,
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup(JWT_KEY_VAR)
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing(JWT_KEY_VAR))?;

        let db_path = lookup(DB_PATH_VAR)
            .unwrap_or_else(|| "./data/glv.sqlite".to_string())
            .into();

        let raw_addr = lookup(BIND_ADDR_VAR).unwrap_or_else(|| "127.0.0.1:3900".to_string());
        let bind_addr = raw_addr.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                var: BIND_ADDR_VAR,
                value: raw_addr.clone(),
                reason: e.to_string(),
            }
        })?;

        let log_level = lookup(LOG_LEVEL_VAR).unwrap_or_else(|| "info".to_string());

        let raw_ttl = lookup(TOKEN_TTL_VAR).unwrap_or_else(|| "24".to_string());
        let hours: u64 = raw_ttl.trim().parse().map_err(|e: std::num::ParseIntError| {
            ConfigError::Invalid {
                var: TOKEN_TTL_VAR,
                value: raw_ttl.clone(),
                reason: e.to_string(),
            }
        })?;
        if hours == 0 {
            return Err(ConfigError::Invalid {
                var: TOKEN_TTL_VAR,
                value: raw_ttl,
                reason: "must be at least one hour".to_string(),
            });
        }

        let ttl_secs = hours.checked_mul(3600).ok_or_else(|| ConfigError::Invalid {
            var: TOKEN_TTL_VAR,
            value: raw_ttl.clone(),
            reason: "is too large".to_string(),
        })?;

        Ok(Self {
            jwt_secret,
            db_path,
            bind_addr,
            log_level,
            token_ttl: Duration::from_secs(ttl_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::from_lookup(lookup(&[(JWT_KEY_VAR, "secret")])).unwrap();

        assert_eq!(config.jwt_secret, "secret");
        assert_eq!(config.db_path, PathBuf::from("./data/glv.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3900");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.token_ttl, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(JWT_KEY_VAR)));

        let err = Config::from_lookup(lookup(&[(JWT_KEY_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = Config::from_lookup(lookup(&[
            (JWT_KEY_VAR, "secret"),
            (BIND_ADDR_VAR, "not-an-address"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: BIND_ADDR_VAR, .. }));

        let err = Config::from_lookup(lookup(&[(JWT_KEY_VAR, "secret"), (TOKEN_TTL_VAR, "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: TOKEN_TTL_VAR, .. }));

        let huge = u64::MAX.to_string();
        let err = Config::from_lookup(lookup(&[(JWT_KEY_VAR, "secret"), (TOKEN_TTL_VAR, huge.as_str())]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: TOKEN_TTL_VAR, .. }));
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (JWT_KEY_VAR, "secret"),
            (DB_PATH_VAR, "/tmp/glv.sqlite"),
            (BIND_ADDR_VAR, "0.0.0.0:9000"),
            (LOG_LEVEL_VAR, "debug"),
            (TOKEN_TTL_VAR, "2"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/glv.sqlite"));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.token_ttl, Duration::from_secs(7200));
    }
}
