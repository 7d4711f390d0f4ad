//! Server configuration - environment loading
//!
//! Configuration is loaded from environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (required to serve from Postgres)
//! - `DB_MAX_OPEN`: pool max connections (default: 20)
//! - `DB_MAX_IDLE`: connections kept warm (default: 10)
//! - `DB_CONN_MAX_LIFETIME`: connection max lifetime (default: 30m)
//! - `DB_CONN_MAX_IDLE_TIME`: idle eviction (default: 5m)
//! - `HTTP_ADDR`: bind address, `:8080` form accepted (default: 0.0.0.0:8080)
//! - `REQUEST_TIMEOUT`: per-operation deadline (default: 10s)
//!
//! Unparseable values fall back to their defaults.

use std::net::SocketAddr;
use std::time::Duration;

use crate::db::PoolSettings;

/// Default bind address
pub const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";

/// Default per-operation deadline
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL is required")]
    MissingDatabaseUrl,

    #[error("invalid HTTP address '{0}'")]
    InvalidAddr(String),
}

/// Process configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub pool: PoolSettings,
    pub http_addr: SocketAddr,
    pub request_timeout: Duration,
}

impl Config {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup (for testing)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let defaults = PoolSettings::default();

        let pool = PoolSettings {
            max_connections: get("DB_MAX_OPEN")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_connections),
            min_connections: get("DB_MAX_IDLE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_connections),
            max_lifetime: get("DB_CONN_MAX_LIFETIME")
                .and_then(|v| parse_duration(&v))
                .unwrap_or(defaults.max_lifetime),
            idle_timeout: get("DB_CONN_MAX_IDLE_TIME")
                .and_then(|v| parse_duration(&v))
                .unwrap_or(defaults.idle_timeout),
            acquire_timeout: defaults.acquire_timeout,
        };

        let http_addr = parse_addr(&get("HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string()))?;

        let request_timeout = get("REQUEST_TIMEOUT")
            .and_then(|v| parse_duration(&v))
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Ok(Self {
            database_url: get("DATABASE_URL"),
            pool,
            http_addr,
            request_timeout,
        })
    }

    /// The database URL, or an error when it was never configured.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::MissingDatabaseUrl)
    }
}

/// Parse a bind address; a bare `:port` binds all interfaces.
pub fn parse_addr(s: &str) -> Result<SocketAddr, ConfigError> {
    let full = if s.starts_with(':') {
        format!("0.0.0.0{s}")
    } else {
        s.to_string()
    };
    full.parse().map_err(|_| ConfigError::InvalidAddr(s.to_string()))
}

/// Parse a duration like `250ms`, `90s`, `5m` or `1h30m`.
///
/// Units: `ms`, `s`, `m`, `h`. A bare number is seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let value: u64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = match &rest[..unit_len] {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.checked_mul(60)?),
            "h" => Duration::from_secs(value.checked_mul(3600)?),
            _ => return None,
        };
        total = total.checked_add(unit)?;
        rest = &rest[unit_len..];
    }

    Some(total)
}
