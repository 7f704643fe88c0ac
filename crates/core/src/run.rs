// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run identifier, status, and materialized run state.
//!
//! A [`Run`] is one execution instance of a pipeline program: an ordered,
//! append-only log of completed steps plus an overall status. Runs are
//! mutated only by applying [`RunEvent`](crate::event::RunEvent)s, so the
//! in-memory view is always reproducible by replaying the durable log.

use crate::event::RunEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

crate::define_id! {
    /// Unique identifier for a run instance.
    pub struct RunId("run-");
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Created, not yet picked up by a driver task
    Queued,
    /// Steps executing
    Running,
    /// Finished successfully; output present
    Complete,
    /// A step exhausted its retries or hit a validation error
    Failed,
    /// Externally terminated; effects of the in-flight step are unknown
    Terminated,
}

impl RunStatus {
    /// Terminal statuses are immutable except for nothing: once terminal,
    /// no further events change the run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Complete | RunStatus::Failed | RunStatus::Terminated
        )
    }
}

crate::simple_display! {
    RunStatus {
        Queued => "queued",
        Running => "running",
        Complete => "complete",
        Failed => "failed",
        Terminated => "terminated",
    }
}

/// One successfully committed step within a run.
///
/// A step name that already has a record is never re-executed within the
/// same run; the executor returns the recorded result instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step name, unique within the run
    pub name: String,
    /// 0-indexed attempt that succeeded
    pub attempt: u32,
    /// Serialized step result
    pub result: Value,
    pub completed_at_ms: u64,
}

/// Materialized state of one run, rebuilt by replaying its event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    /// Program identity (e.g. "headline-acquisition")
    pub program: String,
    pub input: Value,
    pub status: RunStatus,
    /// Ordered log of committed steps
    pub log: Vec<StepRecord>,
    /// Durable wait deadlines: step name → absolute wake instant (epoch ms).
    /// A crash during a wait resumes the remaining wait, not the step body.
    #[serde(default)]
    pub waits: HashMap<String, u64>,
    /// Present iff status is Complete
    pub output: Option<Value>,
    /// Present iff status is Failed
    pub error: Option<String>,
    pub created_at_ms: u64,
    #[serde(default)]
    pub finished_at_ms: Option<u64>,
}

impl Run {
    pub fn new(id: RunId, program: impl Into<String>, input: Value, at_ms: u64) -> Self {
        Self {
            id,
            program: program.into(),
            input,
            status: RunStatus::Queued,
            log: Vec::new(),
            waits: HashMap::new(),
            output: None,
            error: None,
            created_at_ms: at_ms,
            finished_at_ms: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Committed result for `name`, if the step already succeeded.
    pub fn step_result(&self, name: &str) -> Option<&Value> {
        self.log.iter().find(|r| r.name == name).map(|r| &r.result)
    }

    /// Recorded wake deadline for a durable wait step, if any.
    pub fn wait_deadline(&self, name: &str) -> Option<u64> {
        self.waits.get(name).copied()
    }

    /// Apply an event to derive state changes.
    ///
    /// All handlers are idempotent: applying the same event twice must
    /// produce the same state as applying it once, because events are
    /// applied both at emit time and again during replay after a restart.
    /// Events arriving after the run is terminal are ignored, except
    /// `Terminated`, which wins over an in-flight transition race.
    pub fn apply(&mut self, event: &RunEvent) {
        match event {
            RunEvent::Created { .. } => {}
            RunEvent::Started { .. } => {
                if self.status == RunStatus::Queued {
                    self.status = RunStatus::Running;
                }
            }
            RunEvent::StepCompleted {
                step,
                attempt,
                result,
                at_ms,
                ..
            } => {
                if self.is_terminal() || self.step_result(step).is_some() {
                    return;
                }
                self.waits.remove(step);
                self.log.push(StepRecord {
                    name: step.clone(),
                    attempt: *attempt,
                    result: result.clone(),
                    completed_at_ms: *at_ms,
                });
            }
            RunEvent::WaitScheduled { step, wake_at_ms, .. } => {
                if !self.is_terminal() {
                    self.waits.entry(step.clone()).or_insert(*wake_at_ms);
                }
            }
            RunEvent::Completed { output, at_ms, .. } => {
                if !self.is_terminal() {
                    self.status = RunStatus::Complete;
                    self.output = Some(output.clone());
                    self.finished_at_ms = Some(*at_ms);
                }
            }
            RunEvent::Failed { error, at_ms, .. } => {
                if !self.is_terminal() {
                    self.status = RunStatus::Failed;
                    self.error = Some(error.clone());
                    self.finished_at_ms = Some(*at_ms);
                }
            }
            RunEvent::Terminated { at_ms, .. } => {
                if !self.is_terminal() {
                    self.status = RunStatus::Terminated;
                    self.finished_at_ms = Some(*at_ms);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
