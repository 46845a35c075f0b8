use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_APP_NAME: &str = "tasklane";
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
/// One year.
const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 3600;
const DEFAULT_STORE_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Process-wide settings, read once by the binary at start-up.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// When unset, sessions live in an in-process map (single node only).
    pub redis_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    pub app_name: String,
    pub jwt_secret: String,
    /// Lifetime of both the signed token and its server-side session.
    pub token_ttl: Duration,
    pub log_level: String,
    pub bcrypt_cost: u32,
    /// Upper bound on any single cache or database round-trip.
    pub store_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let token_ttl_secs: u64 = parse_or(&lookup, "JWT_EXPIRES_IN", DEFAULT_TOKEN_TTL_SECS)?;
        if token_ttl_secs == 0 || token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::Invalid {
                key: "JWT_EXPIRES_IN",
                value: token_ttl_secs.to_string(),
            });
        }

        let store_timeout_ms: u64 =
            parse_or(&lookup, "STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS)?;
        if store_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "STORE_TIMEOUT_MS",
                value: "0".into(),
            });
        }

        let bcrypt_cost: u32 = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: lookup("REDIS_URL").filter(|url| !url.trim().is_empty()),
            server_port: parse_or(&lookup, "SERVER_PORT", 8080)?,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            app_name: lookup("APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            jwt_secret: required("JWT_SECRET")?,
            token_ttl: Duration::from_secs(token_ttl_secs),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            bcrypt_cost,
            store_timeout: Duration::from_millis(store_timeout_ms),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
