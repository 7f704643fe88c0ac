// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! loom-adapters: external collaborator interfaces for the Newsloom engine.
//!
//! Every external dependency of the orchestration layer is reached through
//! one of these traits: browser automation for scraping, the generative
//! content service, the key-value cache, object storage, and the publish
//! target's OAuth provider. Production wiring supplies real
//! implementations; tests use the scripted fakes behind `test-support`.

pub mod browser;
pub mod cache;
pub mod generate;
pub mod oauth;
pub mod object_store;

pub use browser::{BrowserAdapter, BrowserError, RawItem};
pub use cache::{CacheAdapter, CacheError, MemoryCache};
pub use generate::{GenerateError, Generation, GenerativeAdapter, ModelRate};
pub use oauth::{ChannelMetadata, OAuthError, PublishAuthAdapter, TokenSet};
pub use object_store::{ObjectStoreAdapter, ObjectStoreError};

#[cfg(any(test, feature = "test-support"))]
pub use browser::ScriptedBrowser;
#[cfg(any(test, feature = "test-support"))]
pub use generate::FakeGenerative;
#[cfg(any(test, feature = "test-support"))]
pub use oauth::FakeAuth;
#[cfg(any(test, feature = "test-support"))]
pub use object_store::MemoryObjectStore;
