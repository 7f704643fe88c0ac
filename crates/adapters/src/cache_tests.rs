// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use loom_core::FakeClock;

#[tokio::test]
async fn get_returns_live_entry() {
    let clock = FakeClock::new();
    let cache = MemoryCache::new(clock.clone());

    cache.put("headlines", "[]", Duration::from_secs(60)).await.unwrap();
    assert_eq!(cache.get("headlines").await.unwrap().as_deref(), Some("[]"));
}

#[tokio::test]
async fn entries_expire_by_clock() {
    let clock = FakeClock::new();
    let cache = MemoryCache::new(clock.clone());

    cache.put("headlines", "[]", Duration::from_secs(60)).await.unwrap();
    clock.advance(Duration::from_secs(61));

    assert_eq!(cache.get("headlines").await.unwrap(), None);
}

#[tokio::test]
async fn put_overwrites_and_extends_ttl() {
    let clock = FakeClock::new();
    let cache = MemoryCache::new(clock.clone());

    cache.put("k", "v1", Duration::from_secs(10)).await.unwrap();
    clock.advance(Duration::from_secs(8));
    cache.put("k", "v2", Duration::from_secs(10)).await.unwrap();
    clock.advance(Duration::from_secs(8));

    assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v2"));
}

#[tokio::test]
async fn evict_forces_a_miss() {
    let clock = FakeClock::new();
    let cache = MemoryCache::new(clock);

    cache.put("k", "v", Duration::from_secs(60)).await.unwrap();
    cache.evict("k");

    assert_eq!(cache.get("k").await.unwrap(), None);
}
