// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use loom_adapters::{FakeAuth, MemoryObjectStore, PublishAuthAdapter, TokenSet};

use super::{prepare_publish, upload_rendered};

fn tokens(expires_at_ms: u64) -> TokenSet {
    TokenSet {
        access_token: "access-live".into(),
        refresh_token: "refresh-live".into(),
        expires_at_ms,
    }
}

#[tokio::test]
async fn live_token_is_used_as_is() {
    let auth = FakeAuth::new(10_000);
    let ctx = prepare_publish(&auth, tokens(5_000), 1_000).await.unwrap();
    assert_eq!(auth.refresh_calls(), 0);
    assert_eq!(ctx.tokens.access_token, "access-live");
    assert_eq!(ctx.channel.channel_id, "chan-1");
}

#[tokio::test]
async fn expired_token_is_refreshed_first() {
    let auth = FakeAuth::new(10_000);
    let ctx = prepare_publish(&auth, tokens(5_000), 5_000).await.unwrap();
    assert_eq!(auth.refresh_calls(), 1);
    assert_eq!(ctx.tokens.access_token, "access-refresh-live");
    assert_eq!(ctx.tokens.expires_at_ms, 10_000);
}

#[tokio::test]
async fn exchange_then_prepare_round_trip() {
    let auth = FakeAuth::new(10_000);
    let tokens = auth.exchange_code("grant").await.unwrap();
    let ctx = prepare_publish(&auth, tokens, 0).await.unwrap();
    assert_eq!(ctx.channel.title, "Newsloom");
}

#[tokio::test]
async fn upload_names_the_asset_by_entity_key() {
    let store = MemoryObjectStore::new();
    let url = upload_rendered(&store, "ab12cd34ef56ab78", b"mp4 bytes".to_vec())
        .await
        .unwrap();
    assert!(url.ends_with("renders/ab12cd34ef56ab78.mp4"));
    assert!(store.contains("renders/ab12cd34ef56ab78.mp4"));
    assert_eq!(store.len(), 1);
}
