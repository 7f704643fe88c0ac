// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run lifecycle events.
//!
//! Events are facts about what happened; run state is derived from them by
//! replay. Serializes with `{"type": "step:completed", ...fields}` format,
//! one JSON value per log line.

use crate::run::RunId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events that drive a run's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RunEvent {
    #[serde(rename = "run:created")]
    Created {
        id: RunId,
        program: String,
        input: Value,
        at_ms: u64,
    },

    #[serde(rename = "run:started")]
    Started { id: RunId, at_ms: u64 },

    /// Durable commit of a successful step. The commit strictly precedes
    /// the start of the next step.
    #[serde(rename = "step:completed")]
    StepCompleted {
        id: RunId,
        step: String,
        attempt: u32,
        result: Value,
        at_ms: u64,
    },

    /// Absolute wake deadline for a durable wait (retry backoff, sub-run
    /// poll pacing, fan-out pacing). Recorded before the wait begins so a
    /// restart resumes the remaining wait.
    #[serde(rename = "wait:scheduled")]
    WaitScheduled {
        id: RunId,
        step: String,
        wake_at_ms: u64,
    },

    #[serde(rename = "run:completed")]
    Completed {
        id: RunId,
        output: Value,
        at_ms: u64,
    },

    #[serde(rename = "run:failed")]
    Failed {
        id: RunId,
        error: String,
        at_ms: u64,
    },

    #[serde(rename = "run:terminated")]
    Terminated { id: RunId, at_ms: u64 },
}

impl RunEvent {
    /// The run this event belongs to.
    pub fn run_id(&self) -> &RunId {
        match self {
            RunEvent::Created { id, .. }
            | RunEvent::Started { id, .. }
            | RunEvent::StepCompleted { id, .. }
            | RunEvent::WaitScheduled { id, .. }
            | RunEvent::Completed { id, .. }
            | RunEvent::Failed { id, .. }
            | RunEvent::Terminated { id, .. } => id,
        }
    }

    /// Short name for tracing.
    pub fn name(&self) -> &'static str {
        match self {
            RunEvent::Created { .. } => "run:created",
            RunEvent::Started { .. } => "run:started",
            RunEvent::StepCompleted { .. } => "step:completed",
            RunEvent::WaitScheduled { .. } => "wait:scheduled",
            RunEvent::Completed { .. } => "run:completed",
            RunEvent::Failed { .. } => "run:failed",
            RunEvent::Terminated { .. } => "run:terminated",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
