use std::{env, time::Duration};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Age after which cached queries refetch, in seconds (default: 300)
    pub cache_stale_seconds: u64,
    /// Age after which cached queries are dropped, in seconds (default: 1,800)
    pub cache_retention_seconds: u64,
    /// Maximum number of cache entries (default: 1,000)
    pub cache_max_entries: usize,
    /// Extra attempts after a failed query fetch (default: 1)
    pub query_retries: u32,
    /// Currency symbol used when rendering amounts (default: "R$")
    pub currency_symbol: String,
    /// Buffered rollback notifications per subscriber (default: 32)
    pub notification_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CACHE_STALE_SECONDS` - Cache stale time in seconds (default: 300)
    /// - `CACHE_RETENTION_SECONDS` - Cache retention in seconds (default: 1,800)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 1,000)
    /// - `QUERY_RETRIES` - Retries after a failed query fetch (default: 1)
    /// - `CURRENCY_SYMBOL` - Currency symbol (default: "R$")
    /// - `NOTIFICATION_CAPACITY` - Notification buffer size (default: 32)
    pub fn from_env() -> Self {
        Self {
            cache_stale_seconds: parse_var("CACHE_STALE_SECONDS").unwrap_or(300),
            cache_retention_seconds: parse_var("CACHE_RETENTION_SECONDS").unwrap_or(1_800),
            cache_max_entries: parse_var("CACHE_MAX_ENTRIES").unwrap_or(1_000),
            query_retries: parse_var("QUERY_RETRIES").unwrap_or(1),
            currency_symbol: env::var("CURRENCY_SYMBOL").unwrap_or_else(|_| "R$".to_string()),
            notification_capacity: parse_var("NOTIFICATION_CAPACITY").unwrap_or(32),
        }
    }

    /// Get the stale time as a Duration.
    pub fn stale_time(&self) -> Duration {
        Duration::from_secs(self.cache_stale_seconds)
    }

    /// Get the retention window as a Duration.
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.cache_retention_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
