//! Engine settings, loaded from an optional YAML file.
//!
//! Every field has a default, so a settings file only needs the values it
//! wants to change:
//!
//! ```yaml
//! cache_ttl_secs: 300
//! max_retries: 3
//! concurrent_sources: true
//! ```

use crate::error::ConfigError;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};

/// Tunables of the scraping engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Lifetime of a cached search.
    pub cache_ttl_secs: u64,
    /// Attempts per source, including the first one.
    pub max_retries: usize,
    /// Backoff before the second attempt; doubles afterwards.
    pub base_delay_ms: u64,
    /// Upper bound of the random jitter added to each backoff.
    pub jitter_ms: u64,
    /// Randomized pause between consecutive sources.
    pub source_pause_min_ms: u64,
    pub source_pause_max_ms: u64,
    /// Budget for the whole fetch phase of one search.
    pub search_deadline_secs: u64,
    /// Timeout of every HTTP request made by the session.
    pub request_timeout_secs: u64,
    pub max_results_per_source: usize,
    /// Query all sources at once instead of one after another.
    pub concurrent_sources: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 600,
            max_retries: 2,
            base_delay_ms: 1000,
            jitter_ms: 1000,
            source_pause_min_ms: 500,
            source_pause_max_ms: 1000,
            search_deadline_secs: 90,
            request_timeout_secs: 25,
            max_results_per_source: crate::scrapers::DEFAULT_MAX_RESULTS,
            concurrent_sources: false,
        }
    }
}

impl EngineConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.jitter_ms),
        )
    }

    pub fn source_pause(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.source_pause_min_ms),
            Duration::from_millis(self.source_pause_max_ms),
        )
    }

    pub fn search_deadline(&self) -> Duration {
        Duration::from_secs(self.search_deadline_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse settings from YAML text.
    pub fn from_yaml(text: &str, path: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml {
            path: path.to_string(),
            source,
        })
    }

    /// Load settings from `path`, or the defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No settings file given; using defaults");
            return Ok(Self::default());
        };

        let text = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_string(),
                source,
            })?;
        let config = Self::from_yaml(&text, path)?;
        info!(?config, "Loaded engine settings");
        Ok(config)
    }
}
