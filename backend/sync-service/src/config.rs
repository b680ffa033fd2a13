/// Configuration management for Sync Service
///
/// Loads configuration from environment variables.
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Polling cadence for conversation and presence sync
    pub sync: SyncConfig,
    /// Simulated backend settings
    pub backend: BackendConfig,
    /// Search result bounds
    pub search: SearchConfig,
    /// Feed/discovery list sizes
    pub feed: FeedConfig,
    /// Acting user for the demo session
    pub viewer_user_id: u64,
}

/// Polling cadence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Conversation re-fetch interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Presence snapshot interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub presence_interval_ms: u64,
}

/// Simulated backend latency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_read_latency_ms")]
    pub read_latency_ms: u64,
    #[serde(default = "default_write_latency_ms")]
    pub write_latency_ms: u64,
}

/// Per-category search bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_max_users")]
    pub max_users: usize,
    #[serde(default = "default_max_posts")]
    pub max_posts: usize,
    #[serde(default = "default_max_hashtags")]
    pub max_hashtags: usize,
}

/// Discovery list sizes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_suggested_limit")]
    pub suggested_limit: usize,
    #[serde(default = "default_trending_limit")]
    pub trending_limit: usize,
}

// Default values
fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_read_latency_ms() -> u64 {
    200
}

fn default_write_latency_ms() -> u64 {
    300
}

fn default_max_users() -> usize {
    20
}

fn default_max_posts() -> usize {
    20
}

fn default_max_hashtags() -> usize {
    10
}

fn default_suggested_limit() -> usize {
    5
}

fn default_trending_limit() -> usize {
    10
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn presence_interval(&self) -> Duration {
        Duration::from_millis(self.presence_interval_ms)
    }
}

impl BackendConfig {
    pub fn latency(&self) -> record_store::LatencyConfig {
        record_store::LatencyConfig::new(
            Duration::from_millis(self.read_latency_ms),
            Duration::from_millis(self.write_latency_ms),
        )
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            presence_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            read_latency_ms: default_read_latency_ms(),
            write_latency_ms: default_write_latency_ms(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_users: default_max_users(),
            max_posts: default_max_posts(),
            max_hashtags: default_max_hashtags(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            suggested_limit: default_suggested_limit(),
            trending_limit: default_trending_limit(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            backend: BackendConfig::default(),
            search: SearchConfig::default(),
            feed: FeedConfig::default(),
            viewer_user_id: 1,
        }
    }
}

/// Parse an optional numeric variable, failing loudly on malformed input
fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a number, got {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let sync = SyncConfig {
            poll_interval_ms: env_parse("SYNC_POLL_INTERVAL_MS", default_poll_interval_ms())?,
            presence_interval_ms: env_parse(
                "SYNC_PRESENCE_INTERVAL_MS",
                default_poll_interval_ms(),
            )?,
        };
        if sync.poll_interval_ms == 0 || sync.presence_interval_ms == 0 {
            bail!("sync intervals must be greater than zero");
        }

        let backend = BackendConfig {
            read_latency_ms: env_parse("BACKEND_READ_LATENCY_MS", default_read_latency_ms())?,
            write_latency_ms: env_parse("BACKEND_WRITE_LATENCY_MS", default_write_latency_ms())?,
        };

        let search = SearchConfig {
            max_users: env_parse("SEARCH_MAX_USERS", default_max_users())?,
            max_posts: env_parse("SEARCH_MAX_POSTS", default_max_posts())?,
            max_hashtags: env_parse("SEARCH_MAX_HASHTAGS", default_max_hashtags())?,
        };

        let feed = FeedConfig {
            suggested_limit: env_parse("SUGGESTED_USERS_LIMIT", default_suggested_limit())?,
            trending_limit: env_parse("TRENDING_POSTS_LIMIT", default_trending_limit())?,
        };

        let viewer_user_id = env_parse("VIEWER_USER_ID", 1u64)?;

        Ok(Config {
            sync,
            backend,
            search,
            feed,
            viewer_user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 4] = [
        "SYNC_POLL_INTERVAL_MS",
        "SYNC_PRESENCE_INTERVAL_MS",
        "SEARCH_MAX_POSTS",
        "VIEWER_USER_ID",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_default_values() {
        clear_env();

        let config = Config::from_env().unwrap();

        assert_eq!(config.sync.poll_interval(), Duration::from_secs(3));
        assert_eq!(config.sync.presence_interval(), Duration::from_secs(3));
        assert_eq!(config.search.max_users, 20);
        assert_eq!(config.search.max_posts, 20);
        assert_eq!(config.search.max_hashtags, 10);
        assert_eq!(config.feed.suggested_limit, 5);
        assert_eq!(config.viewer_user_id, 1);
    }

    #[test]
    #[serial]
    fn test_overrides_and_validation() {
        clear_env();
        std::env::set_var("SYNC_POLL_INTERVAL_MS", "500");
        std::env::set_var("SEARCH_MAX_POSTS", "7");
        let config = Config::from_env().unwrap();
        assert_eq!(config.sync.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.search.max_posts, 7);

        std::env::set_var("VIEWER_USER_ID", "abc");
        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("VIEWER_USER_ID"));

        std::env::remove_var("VIEWER_USER_ID");
        std::env::set_var("SYNC_POLL_INTERVAL_MS", "0");
        assert!(Config::from_env().is_err());

        clear_env();
    }
}
