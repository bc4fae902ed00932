//! Runtime configuration, read from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `PVZ_ENV` | `local` |
//! | `PVZ_HTTP_ADDR` | `0.0.0.0:8080` |
//! | `PVZ_REQUEST_TIMEOUT_MS` | `4000` |
//! | `USE_PERSISTENT_STORES` | `false` |
//! | `DATABASE_URL` | required when persistent stores are on |
//! | `PVZ_DB_MAX_CONNECTIONS` | `10` |
//! | `PVZ_DB_MAX_LIFETIME_SECS` | `5400` |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 4_000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_MAX_LIFETIME_SECS: u64 = 90 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Deployment environment. Drives log level and format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Local,
    Dev,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => Err(format!("expected local, dev or prod, got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub max_lifetime: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub env: Environment,
    pub http_addr: SocketAddr,
    /// Deadline applied to every request by the HTTP layer.
    pub request_timeout: Duration,
    /// `Some` when PostgreSQL-backed stores are enabled.
    pub database: Option<DatabaseConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = parse_or(&lookup, "PVZ_ENV", Environment::Local)?;
        let http_addr = match lookup("PVZ_HTTP_ADDR") {
            Some(raw) => parse("PVZ_HTTP_ADDR", &raw)?,
            None => parse("PVZ_HTTP_ADDR", DEFAULT_HTTP_ADDR)?,
        };
        let timeout_ms: u64 =
            parse_or(&lookup, "PVZ_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?;
        if timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "PVZ_REQUEST_TIMEOUT_MS",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let persistent = lookup("USE_PERSISTENT_STORES")
            .map(|v| parse_flag("USE_PERSISTENT_STORES", &v))
            .transpose()?
            .unwrap_or(false);

        let database = if persistent {
            let url = lookup("DATABASE_URL")
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let max_connections =
                parse_or(&lookup, "PVZ_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?;
            let lifetime_secs =
                parse_or(&lookup, "PVZ_DB_MAX_LIFETIME_SECS", DEFAULT_DB_MAX_LIFETIME_SECS)?;
            Some(DatabaseConfig {
                url,
                max_connections,
                max_lifetime: Duration::from_secs(lifetime_secs),
            })
        } else {
            None
        };

        Ok(Self {
            env,
            http_addr,
            request_timeout: Duration::from_millis(timeout_ms),
            database,
        })
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        var,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => parse(var, &raw),
        None => Ok(default),
    }
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
