// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error types.

use loom_core::{RunId, RunStatus, TransitionError};
use loom_storage::{
    CostLogError, EntityStoreError, RunStoreError, SnapshotStoreError,
};
use thiserror::Error;

/// Errors that can occur while driving runs
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("run store error: {0}")]
    RunStore(#[from] RunStoreError),
    #[error("entity store error: {0}")]
    EntityStore(#[from] EntityStoreError),
    #[error("snapshot store error: {0}")]
    SnapshotStore(#[from] SnapshotStoreError),
    #[error("cost log error: {0}")]
    CostLog(#[from] CostLogError),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown run: {0}")]
    UnknownRun(String),
    #[error("unknown program: {0}")]
    UnknownProgram(String),
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// A step exhausted its retries or hit a validation error.
    #[error("step '{step}' failed: {error}")]
    StepFailed { step: String, error: String },

    /// A sub-run reached a terminal status other than complete.
    #[error("sub-run {run_id} ended {status}: {}", error.as_deref().unwrap_or("no error recorded"))]
    SubRunFailed {
        run_id: RunId,
        status: RunStatus,
        error: Option<String>,
    },

    /// Deliberate conflict, not a failure: the policy engine refused the
    /// transition. Reasons are the blocking check codes.
    #[error("blocked by policy: {}", reasons.join(", "))]
    PolicyBlocked { reasons: Vec<String> },

    /// Stage transition refused by the state machine.
    #[error("stage transition refused: {0}")]
    Transition(TransitionError),

    /// The run was externally terminated while driving.
    #[error("run terminated")]
    Terminated,
}

impl From<TransitionError> for RuntimeError {
    fn from(e: TransitionError) -> Self {
        match e {
            TransitionError::PolicyBlocked { reasons } => RuntimeError::PolicyBlocked { reasons },
            other => RuntimeError::Transition(other),
        }
    }
}
