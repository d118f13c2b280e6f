//! Environment-driven service configuration.
//!
//! | Variable        | Default   | Meaning                                   |
//! |-----------------|-----------|-------------------------------------------|
//! | `HOST`          | `0.0.0.0` | Bind address                              |
//! | `PORT`          | `8080`    | Bind port                                 |
//! | `EXCUSE_STORE`  | `memory`  | `memory` or `postgres`                    |
//! | `BOOTSTRAP_DIR` | unset     | Seed the store from this directory        |
//! | `LOG_FORMAT`    | `json`    | `json` or `pretty`                        |
//!
//! Database settings (`DATABASE_URL`, `DB_*`) are read by `PostgresConfig`
//! when the postgres backend is selected.

use std::path::PathBuf;

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default bind port.
pub const DEFAULT_PORT: u16 = 8080;

/// Error type for configuration loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable holds a value outside its allowed set.
    #[error("Invalid value for {key}: {value}")]
    InvalidValue {
        /// Variable name.
        key: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Which store backend to run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local [`InMemoryStore`](crate::store::InMemoryStore).
    #[default]
    Memory,
    /// PostgreSQL via `PostgresStore`.
    Postgres,
}

impl StoreBackend {
    /// Parse backend name (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" => Some(Self::Memory),
            "postgres" | "postgresql" => Some(Self::Postgres),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres => "postgres",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON lines.
    #[default]
    Json,
    /// Human-readable output for local development.
    Pretty,
}

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Store backend.
    pub store: StoreBackend,
    /// Directory to bootstrap content from at startup.
    pub bootstrap_dir: Option<PathBuf>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            store: StoreBackend::default(),
            bootstrap_dir: None,
            log_format: LogFormat::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let store = match lookup("EXCUSE_STORE") {
            Some(value) => StoreBackend::from_str(&value).ok_or(ConfigError::InvalidValue {
                key: "EXCUSE_STORE",
                value,
            })?,
            None => defaults.store,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            store,
            bootstrap_dir: lookup("BOOTSTRAP_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            log_format,
        })
    }

    /// `host:port` bind string.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
