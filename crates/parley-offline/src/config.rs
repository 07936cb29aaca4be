//! Offline layer configuration loaded from environment variables.
//!
//! Every setting has a default so the layer works with zero configuration.

use std::path::PathBuf;
use std::time::Duration;

use parley_shared::constants::{
    DEFAULT_CHANNEL_CACHE_SIZE, DEFAULT_MESSAGE_CACHE_SIZE, DEFAULT_RETRY_INTERVAL_SECS,
    DEFAULT_RETRY_PAGE_SIZE, DEFAULT_USER_CACHE_SIZE,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// SQLite file to open.
    /// Env: `PARLEY_DATABASE_PATH`
    /// Default: `None`, meaning the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Env: `PARLEY_USER_CACHE_SIZE`
    pub user_cache_size: usize,

    /// Env: `PARLEY_MESSAGE_CACHE_SIZE`
    pub message_cache_size: usize,

    /// Env: `PARLEY_CHANNEL_CACHE_SIZE`
    pub channel_cache_size: usize,

    /// Entities submitted concurrently per retry page.
    /// Env: `PARLEY_RETRY_PAGE_SIZE`
    pub retry_page_size: usize,

    /// Delay between scheduled retry passes.
    /// Env: `PARLEY_RETRY_INTERVAL_SECS`
    pub retry_interval: Duration,

    /// Upper bound on pages per pass; `None` drains until empty.
    /// Env: `PARLEY_MAX_RETRY_PAGES` (0 = unbounded)
    pub max_retry_pages: Option<usize>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            user_cache_size: DEFAULT_USER_CACHE_SIZE,
            message_cache_size: DEFAULT_MESSAGE_CACHE_SIZE,
            channel_cache_size: DEFAULT_CHANNEL_CACHE_SIZE,
            retry_page_size: DEFAULT_RETRY_PAGE_SIZE,
            retry_interval: Duration::from_secs(DEFAULT_RETRY_INTERVAL_SECS),
            max_retry_pages: None,
        }
    }
}

impl SyncConfig {
    /// Load configuration from the process environment, falling back to
    /// defaults for anything unset or invalid.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("PARLEY_DATABASE_PATH") {
            if !path.is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Some(n) = parse_positive(&lookup, "PARLEY_USER_CACHE_SIZE") {
            config.user_cache_size = n;
        }
        if let Some(n) = parse_positive(&lookup, "PARLEY_MESSAGE_CACHE_SIZE") {
            config.message_cache_size = n;
        }
        if let Some(n) = parse_positive(&lookup, "PARLEY_CHANNEL_CACHE_SIZE") {
            config.channel_cache_size = n;
        }
        if let Some(n) = parse_positive(&lookup, "PARLEY_RETRY_PAGE_SIZE") {
            config.retry_page_size = n;
        }
        if let Some(secs) = parse_positive(&lookup, "PARLEY_RETRY_INTERVAL_SECS") {
            config.retry_interval = Duration::from_secs(secs as u64);
        }

        if let Some(val) = lookup("PARLEY_MAX_RETRY_PAGES") {
            match val.parse::<usize>() {
                Ok(0) => config.max_retry_pages = None,
                Ok(n) => config.max_retry_pages = Some(n),
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid PARLEY_MAX_RETRY_PAGES, using default");
                }
            }
        }

        config
    }
}

/// Parse a strictly positive integer, warning about (and ignoring) anything
/// else.
fn parse_positive<F>(lookup: &F, key: &str) -> Option<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.user_cache_size, 100);
        assert_eq!(config.retry_page_size, 50);
        assert_eq!(config.max_retry_pages, None);
    }

    #[test]
    fn test_overrides() {
        let config = SyncConfig::from_lookup(lookup_from(&[
            ("PARLEY_DATABASE_PATH", "/tmp/chat.db"),
            ("PARLEY_USER_CACHE_SIZE", "7"),
            ("PARLEY_RETRY_PAGE_SIZE", "20"),
            ("PARLEY_RETRY_INTERVAL_SECS", "5"),
            ("PARLEY_MAX_RETRY_PAGES", "3"),
        ]));
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/chat.db")));
        assert_eq!(config.user_cache_size, 7);
        assert_eq!(config.retry_page_size, 20);
        assert_eq!(config.retry_interval, Duration::from_secs(5));
        assert_eq!(config.max_retry_pages, Some(3));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = SyncConfig::from_lookup(lookup_from(&[
            ("PARLEY_USER_CACHE_SIZE", "0"),
            ("PARLEY_RETRY_PAGE_SIZE", "lots"),
            ("PARLEY_MAX_RETRY_PAGES", "-1"),
        ]));
        assert_eq!(config, SyncConfig::default());
    }
}
