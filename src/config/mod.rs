//! # Configuration Management
//!
//! Environment-based configuration for the Admitpath backend. Every section
//! is loaded with a `from_env` constructor; token secrets fall back to
//! clearly-marked insecure development defaults when unset so the service
//! never runs with signing silently disabled.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Insecure fallback used only when `ADMITPATH_ACCESS_TOKEN_SECRET` is unset.
pub const DEV_ACCESS_TOKEN_SECRET: &str = "insecure-dev-access-secret-do-not-use-in-production";

/// Insecure fallback used only when `ADMITPATH_REFRESH_TOKEN_SECRET` is unset.
pub const DEV_REFRESH_TOKEN_SECRET: &str = "insecure-dev-refresh-secret-do-not-use-in-production";

const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 900; // 15 minutes
const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 604_800; // 7 days

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let config = Self {
            api: ApiServerConfig::from_env()?,
            database: DatabaseConfig::from_env(),
            auth: AuthConfig::from_env()?,
        };
        config.auth.validate()?;
        Ok(config)
    }
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1".to_string(), port: 8080 }
    }
}

impl ApiServerConfig {
    pub fn from_env() -> Result<Self> {
        let bind_address = std::env::var("ADMITPATH_API_BIND_ADDRESS")
            .unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("ADMITPATH_API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|e| Error::config(format!("Invalid API port: {}", e)))?;

        Ok(Self { bind_address, port })
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL (SQLite)
    pub url: String,
    /// Maximum connections in the pool
    pub max_connections: u32,
    /// Minimum connections kept alive in the pool
    pub min_connections: u32,
    /// Connection acquire timeout in seconds
    pub connect_timeout_seconds: u64,
    /// Run embedded migrations on startup
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./admitpath.db".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_seconds: 5,
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            url: std::env::var("ADMITPATH_DATABASE_URL").unwrap_or(defaults.url),
            max_connections: env_parse("ADMITPATH_DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.max_connections),
            min_connections: env_parse("ADMITPATH_DATABASE_MIN_CONNECTIONS")
                .unwrap_or(defaults.min_connections),
            connect_timeout_seconds: env_parse("ADMITPATH_DATABASE_CONNECT_TIMEOUT_SECONDS")
                .unwrap_or(defaults.connect_timeout_seconds),
            auto_migrate: env_parse("ADMITPATH_DATABASE_AUTO_MIGRATE")
                .unwrap_or(defaults.auto_migrate),
        }
    }

    pub fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Token signing configuration: two independent (secret, expiry) pairs.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub access_token_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_secret: String,
    pub refresh_token_ttl_secs: i64,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self> {
        let access_token_secret = match std::env::var("ADMITPATH_ACCESS_TOKEN_SECRET") {
            Ok(secret) => secret,
            Err(_) => {
                tracing::warn!(
                    "ADMITPATH_ACCESS_TOKEN_SECRET is not set; using the insecure \
                     development default. Do not run this in production."
                );
                DEV_ACCESS_TOKEN_SECRET.to_string()
            }
        };

        let refresh_token_secret = match std::env::var("ADMITPATH_REFRESH_TOKEN_SECRET") {
            Ok(secret) => secret,
            Err(_) => {
                tracing::warn!(
                    "ADMITPATH_REFRESH_TOKEN_SECRET is not set; using the insecure \
                     development default. Do not run this in production."
                );
                DEV_REFRESH_TOKEN_SECRET.to_string()
            }
        };

        let access_token_ttl_secs = env_parse("ADMITPATH_ACCESS_TOKEN_TTL_SECS")
            .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_SECS);
        let refresh_token_ttl_secs = env_parse("ADMITPATH_REFRESH_TOKEN_TTL_SECS")
            .unwrap_or(DEFAULT_REFRESH_TOKEN_TTL_SECS);

        Ok(Self {
            access_token_secret,
            access_token_ttl_secs,
            refresh_token_secret,
            refresh_token_ttl_secs,
        })
    }

    /// Validate secret strength and expiry sanity.
    pub fn validate(&self) -> Result<()> {
        if self.access_token_secret.len() < 32 {
            return Err(Error::config("Access token secret must be at least 32 characters long"));
        }
        if self.refresh_token_secret.len() < 32 {
            return Err(Error::config("Refresh token secret must be at least 32 characters long"));
        }
        // The token-scoping guarantee rests on the two verifiers rejecting
        // each other's tokens, which requires distinct secrets.
        if self.access_token_secret == self.refresh_token_secret {
            return Err(Error::config("Access and refresh token secrets must differ"));
        }
        if self.access_token_ttl_secs <= 0 || self.refresh_token_ttl_secs <= 0 {
            return Err(Error::config("Token TTLs must be positive"));
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: DEV_ACCESS_TOKEN_SECRET.to_string(),
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_token_secret: DEV_REFRESH_TOKEN_SECRET.to_string(),
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log filter directive, e.g. "info" or "admitpath=debug,sqlx=warn"
    pub log_level: String,
    /// Emit JSON-formatted logs
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logs: false }
    }
}

impl ObservabilityConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: std::env::var("ADMITPATH_LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logs: env_parse("ADMITPATH_LOG_JSON").unwrap_or(defaults.json_logs),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|value| value.parse().ok())
}
