// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generative content service adapter.
//!
//! The service bills by token usage; the engine computes cost from the
//! per-model rate table and appends it to the cost log.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the generative service
#[derive(Debug, Clone, Error)]
pub enum GenerateError {
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("unknown model: {0}")]
    UnknownModel(String),
}

impl GenerateError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerateError::RateLimited(_) | GenerateError::Request(_))
    }
}

/// One completed generation with its billed usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// USD per 1k tokens for one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelRate {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl ModelRate {
    /// Cost of a generation at this rate.
    pub fn cost_usd(&self, generation: &Generation) -> f64 {
        (generation.input_tokens as f64 / 1000.0) * self.input_per_1k
            + (generation.output_tokens as f64 / 1000.0) * self.output_per_1k
    }
}

/// Adapter for prompt completion
#[async_trait]
pub trait GenerativeAdapter: Clone + Send + Sync + 'static {
    /// Complete `prompt` with `model`.
    async fn generate(&self, prompt: &str, model: &str) -> Result<Generation, GenerateError>;

    /// Billing rate for a model, if known.
    fn model_rate(&self, model: &str) -> Option<ModelRate>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{GenerateError, Generation, GenerativeAdapter, ModelRate};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded generation request
    #[derive(Debug, Clone)]
    pub struct GenerateCall {
        pub prompt: String,
        pub model: String,
    }

    struct FakeGenerativeState {
        calls: Vec<GenerateCall>,
        fail_next: Option<GenerateError>,
    }

    /// Fake generative service: echoes a canned completion, records calls.
    #[derive(Clone)]
    pub struct FakeGenerative {
        inner: Arc<Mutex<FakeGenerativeState>>,
    }

    impl Default for FakeGenerative {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeGenerativeState {
                    calls: Vec::new(),
                    fail_next: None,
                })),
            }
        }
    }

    impl FakeGenerative {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_next(&self, error: GenerateError) {
            self.inner.lock().fail_next = Some(error);
        }

        pub fn calls(&self) -> Vec<GenerateCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl GenerativeAdapter for FakeGenerative {
        async fn generate(&self, prompt: &str, model: &str) -> Result<Generation, GenerateError> {
            let mut state = self.inner.lock();
            state.calls.push(GenerateCall {
                prompt: prompt.to_string(),
                model: model.to_string(),
            });
            if let Some(error) = state.fail_next.take() {
                return Err(error);
            }
            Ok(Generation {
                content: format!("generated: {}", prompt.chars().take(32).collect::<String>()),
                input_tokens: prompt.len() as u64,
                output_tokens: 64,
            })
        }

        fn model_rate(&self, _model: &str) -> Option<ModelRate> {
            Some(ModelRate { input_per_1k: 0.001, output_per_1k: 0.002 })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeGenerative, GenerateCall};

#[cfg(test)]
#[path = "generate_tests.rs"]
mod tests;
