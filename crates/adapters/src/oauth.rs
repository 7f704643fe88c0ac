// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Publish-target OAuth provider adapter.
//!
//! Authorization-code exchange, token refresh, and channel metadata for
//! the upstream video platform. The engine only needs tokens and channel
//! identity; the upload protocol itself is out of scope.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the OAuth provider
#[derive(Debug, Clone, Error)]
pub enum OAuthError {
    #[error("code exchange rejected: {0}")]
    Exchange(String),
    #[error("refresh rejected: {0}")]
    Refresh(String),
    #[error("metadata fetch failed: {0}")]
    Metadata(String),
}

/// Issued token pair with its expiry instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at_ms: u64,
}

impl TokenSet {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// Channel identity on the publish target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMetadata {
    pub channel_id: String,
    pub title: String,
}

/// Adapter for the publish target's OAuth provider
#[async_trait]
pub trait PublishAuthAdapter: Clone + Send + Sync + 'static {
    /// Exchange an authorization code for tokens.
    async fn exchange_code(&self, code: &str) -> Result<TokenSet, OAuthError>;

    /// Refresh an expired access token.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, OAuthError>;

    /// Fetch the authenticated channel's metadata.
    async fn channel_metadata(&self, access_token: &str) -> Result<ChannelMetadata, OAuthError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{ChannelMetadata, OAuthError, PublishAuthAdapter, TokenSet};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Fake OAuth provider issuing deterministic tokens.
    #[derive(Clone)]
    pub struct FakeAuth {
        refresh_calls: Arc<Mutex<u32>>,
        expires_at_ms: u64,
    }

    impl FakeAuth {
        pub fn new(expires_at_ms: u64) -> Self {
            Self { refresh_calls: Arc::new(Mutex::new(0)), expires_at_ms }
        }

        pub fn refresh_calls(&self) -> u32 {
            *self.refresh_calls.lock()
        }
    }

    #[async_trait]
    impl PublishAuthAdapter for FakeAuth {
        async fn exchange_code(&self, code: &str) -> Result<TokenSet, OAuthError> {
            Ok(TokenSet {
                access_token: format!("access-{code}"),
                refresh_token: format!("refresh-{code}"),
                expires_at_ms: self.expires_at_ms,
            })
        }

        async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, OAuthError> {
            *self.refresh_calls.lock() += 1;
            Ok(TokenSet {
                access_token: format!("access-{refresh_token}"),
                refresh_token: refresh_token.to_string(),
                expires_at_ms: self.expires_at_ms,
            })
        }

        async fn channel_metadata(
            &self,
            _access_token: &str,
        ) -> Result<ChannelMetadata, OAuthError> {
            Ok(ChannelMetadata { channel_id: "chan-1".into(), title: "Newsloom".into() })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeAuth;

#[cfg(test)]
#[path = "oauth_tests.rs"]
mod tests;
