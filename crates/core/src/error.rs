// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step failure classification.
//!
//! The executor consults [`ErrorClass`] to decide whether a failed step
//! body is retried (transient: network, timeout, rate limit) or failed
//! immediately (validation: malformed upstream payload).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a step failure should be treated by the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Retried per the step's retry policy, surfaced only when exhausted.
    Transient,
    /// Not retried; fails the step immediately.
    Validation,
}

crate::simple_display! {
    ErrorClass {
        Transient => "transient",
        Validation => "validation",
    }
}

/// A classified step failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{class} error: {message}")]
pub struct StepError {
    pub class: ErrorClass,
    pub message: String,
}

impl StepError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            class: ErrorClass::Transient,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            class: ErrorClass::Validation,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class == ErrorClass::Transient
    }
}
