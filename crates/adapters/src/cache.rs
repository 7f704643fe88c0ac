// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key-value cache with per-entry TTL.
//!
//! The acquisition pipeline reads this cache first and only scrapes on a
//! miss. [`MemoryCache`] is the in-process implementation; expiry is driven
//! by the injected [`Clock`] so tests control it.

use async_trait::async_trait;
use loom_core::Clock;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors from cache operations
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

/// Adapter for a TTL'd key-value cache.
#[async_trait]
pub trait CacheAdapter: Clone + Send + Sync + 'static {
    /// Fetch a value; None on miss or expiry.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value with a time-to-live.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

struct CacheEntry {
    value: String,
    expires_at_ms: u64,
}

/// In-process cache with clock-driven expiry.
#[derive(Clone)]
pub struct MemoryCache<C: Clock> {
    clock: C,
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl<C: Clock> MemoryCache<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, entries: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Drop the entry for `key`, if any. Used by tests to force a miss.
    pub fn evict(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

#[async_trait]
impl<C: Clock> CacheAdapter for MemoryCache<C> {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = self.clock.epoch_ms();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at_ms > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at_ms = self.clock.epoch_ms().saturating_add(ttl.as_millis() as u64);
        self.entries.lock().insert(
            key.to_string(),
            CacheEntry { value: value.to_string(), expires_at_ms },
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
