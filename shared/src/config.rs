use crate::{Error, Result};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Sled,
}

impl FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "moka" => Ok(StoreBackend::Memory),
            "sled" => Ok(StoreBackend::Sled),
            other => Err(Error::Config(format!("unknown store backend '{}'", other))),
        }
    }
}

/// Where and how the cache store is opened.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub connection_string: Option<String>, // base directory for sled
    pub database_name: String,
    pub container_name: String,
    pub create_if_not_exists: bool,
    pub max_entries: Option<u64>, // memory backend only
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub http_port: u16,
    pub cache_key: String,
    pub ttl: Duration,
    pub request_timeout: Duration,
    pub allowed_origins: Vec<String>,
    pub store: StoreConfig,
}

impl Config {
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_HTTP_PORT: u16 = 7071;
    pub const DEFAULT_CACHE_KEY: &str = "myCacheKey";
    pub const DEFAULT_TTL_SECS: u64 = 300;
    pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
    pub const DEFAULT_DATABASE_NAME: &str = "myCacheDatabase";
    pub const DEFAULT_CONTAINER_NAME: &str = "myCacheContainer";

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        // Set but blank is an error, unset falls back to the default
        let cache_key = match lookup("CACHE_KEY") {
            Some(raw) => raw.trim().to_string(),
            None => Self::DEFAULT_CACHE_KEY.to_string(),
        };
        if cache_key.is_empty() {
            return Err(Error::Config("CACHE_KEY must not be empty".into()));
        }

        let ttl_secs = parse_or("CACHE_TTL_SECS", var("CACHE_TTL_SECS"), Self::DEFAULT_TTL_SECS)?;
        if ttl_secs == 0 {
            return Err(Error::Config("CACHE_TTL_SECS must be greater than zero".into()));
        }

        let request_timeout_ms = parse_or(
            "CACHE_REQUEST_TIMEOUT_MS",
            var("CACHE_REQUEST_TIMEOUT_MS"),
            Self::DEFAULT_REQUEST_TIMEOUT_MS,
        )?;

        let backend = match var("CACHE_STORE_BACKEND") {
            Some(raw) => raw.parse::<StoreBackend>()?,
            None => StoreBackend::Memory,
        };

        let connection_string = var("CACHE_STORE_CONNECTION_STRING");
        if backend == StoreBackend::Sled && connection_string.is_none() {
            return Err(Error::Config(
                "CACHE_STORE_CONNECTION_STRING is required for the sled backend".into(),
            ));
        }

        let max_entries = match var("CACHE_MAX_ENTRIES") {
            Some(raw) => Some(parse("CACHE_MAX_ENTRIES", &raw)?),
            None => None,
        };
        if max_entries.is_some() && backend != StoreBackend::Memory {
            warn!("CACHE_MAX_ENTRIES only applies to the memory backend, ignoring");
        }

        let allowed_origins = var("CACHE_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: var("CACHE_HOST").unwrap_or_else(|| Self::DEFAULT_HOST.to_string()),
            http_port: parse_or("CACHE_HTTP_PORT", var("CACHE_HTTP_PORT"), Self::DEFAULT_HTTP_PORT)?,
            cache_key,
            ttl: Duration::from_secs(ttl_secs),
            request_timeout: Duration::from_millis(request_timeout_ms),
            allowed_origins,
            store: StoreConfig {
                backend,
                connection_string,
                database_name: var("CACHE_DATABASE_NAME")
                    .unwrap_or_else(|| Self::DEFAULT_DATABASE_NAME.to_string()),
                container_name: var("CACHE_CONTAINER_NAME")
                    .unwrap_or_else(|| Self::DEFAULT_CONTAINER_NAME.to_string()),
                create_if_not_exists: parse_or(
                    "CACHE_CREATE_IF_NOT_EXISTS",
                    var("CACHE_CREATE_IF_NOT_EXISTS"),
                    true,
                )?,
                max_entries,
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

fn parse<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| Error::Config(format!("{} has an invalid value '{}'", name, raw)))
}

fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(raw) => parse(name, &raw),
        None => Ok(default),
    }
}
