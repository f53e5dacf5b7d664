// src/config.rs
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Semaphore;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Process-wide settings, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub api_key: Option<String>,
    pub api_base: String,
    pub upstream_timeout: Duration,
    pub retry_backoff: Duration,
    pub max_concurrent_upstream: usize,
}

// Keep the key out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("api_base", &self.api_base)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("retry_backoff", &self.retry_backoff)
            .field("max_concurrent_upstream", &self.max_concurrent_upstream)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            upstream_timeout: Duration::from_secs(30),
            retry_backoff: Duration::from_millis(500),
            max_concurrent_upstream: 16,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let bind_addr = match get("BIND_ADDR") {
            Some(v) => parse("BIND_ADDR", &v)?,
            None => defaults.bind_addr,
        };
        let upstream_timeout = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_positive("UPSTREAM_TIMEOUT_SECS", &v)?),
            None => defaults.upstream_timeout,
        };
        let retry_backoff = match get("UPSTREAM_RETRY_BACKOFF_MS") {
            Some(v) => Duration::from_millis(parse("UPSTREAM_RETRY_BACKOFF_MS", &v)?),
            None => defaults.retry_backoff,
        };
        let max_concurrent_upstream = match get("MAX_CONCURRENT_UPSTREAM") {
            Some(v) => match usize::try_from(parse_positive("MAX_CONCURRENT_UPSTREAM", &v)?) {
                Ok(n) if n <= Semaphore::MAX_PERMITS => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "MAX_CONCURRENT_UPSTREAM",
                        value: v,
                    });
                }
            },
            None => defaults.max_concurrent_upstream,
        };

        Ok(Self {
            bind_addr,
            api_key: get("GEMINI_API_KEY").map(|k| k.trim().to_string()),
            api_base: get("GEMINI_API_BASE")
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            upstream_timeout,
            retry_backoff,
            max_concurrent_upstream,
        })
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match parse::<u64>(key, value)? {
        0 => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
        n => Ok(n),
    }
}
