// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Browser automation adapter.
//!
//! The acquisition pipeline drives a headless browser through this trait:
//! `acquire` navigates to a target (a listing page or a single article) and
//! returns the extracted items. Timeouts and navigation failures are
//! transient; a page that loads but does not parse is a validation failure
//! and is never retried.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from browser automation
#[derive(Debug, Clone, Error)]
pub enum BrowserError {
    #[error("navigation timeout for {0}")]
    Timeout(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    /// Page loaded but the expected structure was absent
    #[error("malformed page: {0}")]
    Malformed(String),
}

impl BrowserError {
    /// Timeouts and navigation failures are worth retrying; a malformed
    /// page will be malformed again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BrowserError::Timeout(_) | BrowserError::Navigation(_))
    }
}

/// One item extracted from a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

/// Adapter for timeout-bounded page acquisition
#[async_trait]
pub trait BrowserAdapter: Clone + Send + Sync + 'static {
    /// Navigate to `target` and extract its items.
    async fn acquire(&self, target: &str) -> Result<Vec<RawItem>, BrowserError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{BrowserAdapter, BrowserError, RawItem};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    struct ScriptedBrowserState {
        script: VecDeque<Result<Vec<RawItem>, BrowserError>>,
        calls: Vec<String>,
    }

    /// Scripted browser fake: queue outcomes, assert on recorded targets.
    ///
    /// When the script runs dry, further calls return an empty item list.
    #[derive(Clone)]
    pub struct ScriptedBrowser {
        inner: Arc<Mutex<ScriptedBrowserState>>,
    }

    impl Default for ScriptedBrowser {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(ScriptedBrowserState {
                    script: VecDeque::new(),
                    calls: Vec::new(),
                })),
            }
        }
    }

    impl ScriptedBrowser {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue the next acquisition outcome.
        pub fn push(&self, outcome: Result<Vec<RawItem>, BrowserError>) {
            self.inner.lock().script.push_back(outcome);
        }

        /// Queue a successful acquisition of `(url, title)` pairs.
        pub fn push_items(&self, items: &[(&str, &str)]) {
            self.push(Ok(items
                .iter()
                .map(|(url, title)| RawItem {
                    url: url.to_string(),
                    title: title.to_string(),
                    summary: None,
                    published_at: None,
                })
                .collect()));
        }

        /// Targets acquired so far, in call order.
        pub fn calls(&self) -> Vec<String> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl BrowserAdapter for ScriptedBrowser {
        async fn acquire(&self, target: &str) -> Result<Vec<RawItem>, BrowserError> {
            let mut state = self.inner.lock();
            state.calls.push(target.to_string());
            state.script.pop_front().unwrap_or_else(|| Ok(Vec::new()))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::ScriptedBrowser;
