// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration.
//!
//! Every knob has a default; a config file only needs to name the values
//! it wants to change. Durations are stored as plain integers in the
//! file and exposed as [`Duration`] accessors.

use std::time::Duration;

use loom_core::RetryPolicy;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Acquisition target handed to the browser adapter.
    pub headline_target: String,
    /// Cache key for the headline batch.
    pub cache_key: String,
    /// Headline cache lifetime, seconds.
    pub cache_ttl_secs: u64,
    /// Sub-run poll interval, milliseconds.
    pub poll_interval_ms: u64,
    /// Delay between fan-out items, seconds.
    pub fanout_delay_secs: u64,
    /// Snapshots older than this are pruned, days.
    pub snapshot_retention_days: u64,
    /// UTC offset applied when evaluating the trigger window, hours.
    pub trigger_offset_hours: i32,
    /// Max entities picked per topic selection pass.
    pub selection_batch: usize,
    /// Model name used for topic selection.
    pub selection_model: String,
    /// Max scrape attempts per article.
    pub scrape_attempts: u32,
    /// Base delay for scrape retries, milliseconds.
    pub scrape_base_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            headline_target: "news-front".to_string(),
            cache_key: "headlines:front".to_string(),
            cache_ttl_secs: 2100,
            poll_interval_ms: 1000,
            fanout_delay_secs: 10,
            snapshot_retention_days: 30,
            trigger_offset_hours: loom_core::DEFAULT_OFFSET_HOURS,
            selection_batch: 3,
            selection_model: "flash".to_string(),
            scrape_attempts: 3,
            scrape_base_delay_ms: 2000,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn fanout_delay(&self) -> Duration {
        Duration::from_secs(self.fanout_delay_secs)
    }

    pub fn snapshot_retention(&self) -> Duration {
        Duration::from_secs(self.snapshot_retention_days * 24 * 60 * 60)
    }

    /// Retry policy for article scrapes.
    pub fn scrape_retry(&self) -> RetryPolicy {
        RetryPolicy::exponential(
            self.scrape_attempts,
            Duration::from_millis(self.scrape_base_delay_ms),
        )
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
