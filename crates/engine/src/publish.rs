// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Publish-side helpers: credential upkeep and rendered-asset upload.
//!
//! Kept free of the runtime so callers can prepare a publish outside any
//! run, then drive the entity's publish stage through the gate.

use loom_adapters::{
    ChannelMetadata, OAuthError, ObjectStoreAdapter, ObjectStoreError,
    PublishAuthAdapter, TokenSet,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("auth error: {0}")]
    Auth(#[from] OAuthError),
    #[error("object store error: {0}")]
    ObjectStore(#[from] ObjectStoreError),
}

/// Everything needed to start an upload: live credentials plus the
/// destination channel.
#[derive(Debug, Clone)]
pub struct PublishContext {
    pub tokens: TokenSet,
    pub channel: ChannelMetadata,
}

/// Make sure `tokens` are live at `now_ms`, refreshing if needed, and
/// resolve the destination channel.
pub async fn prepare_publish<A: PublishAuthAdapter>(
    auth: &A,
    tokens: TokenSet,
    now_ms: u64,
) -> Result<PublishContext, PublishError> {
    let tokens = if tokens.is_expired(now_ms) {
        tracing::debug!("access token expired, refreshing");
        auth.refresh(&tokens.refresh_token).await?
    } else {
        tokens
    };
    let channel = auth.channel_metadata(&tokens.access_token).await?;
    Ok(PublishContext { tokens, channel })
}

/// Upload a rendered asset and return its public url.
pub async fn upload_rendered<O: ObjectStoreAdapter>(
    store: &O,
    entity_key: &str,
    bytes: Vec<u8>,
) -> Result<String, PublishError> {
    let key = format!("renders/{entity_key}.mp4");
    let url = store.put(&key, bytes, "video/mp4").await?;
    tracing::info!(key = %key, "rendered asset uploaded");
    Ok(url)
}

#[cfg(test)]
#[path = "publish_tests.rs"]
mod tests;
