// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage admission and entity operations.
//!
//! Every transition is checked against the entity's status vector and
//! the policy severity engine before it is durably recorded. Serializing
//! per-entity admission here is what prevents two concurrent runs from
//! working the same stage of the same entity.

use loom_adapters::{BrowserAdapter, CacheAdapter, GenerativeAdapter};
use loom_core::{
    Clock, Entity, EntityEvent, Finding, PublishState, Stage, StageState,
    TransitionError,
};

use crate::error::RuntimeError;
use crate::pacer::Pacer;
use crate::runtime::Runtime;

impl<C, P, B, G, K> Runtime<C, P, B, G, K>
where
    C: Clock,
    P: Pacer,
    B: BrowserAdapter,
    G: GenerativeAdapter,
    K: CacheAdapter,
{
    /// Snapshot of an entity's materialized state.
    pub fn entity(&self, key: &str) -> Option<Entity> {
        self.inner.entities.lock().get(key).cloned()
    }

    /// Admit `stage` into in-progress. Refused when the stage is already
    /// in progress or done, when publish is attempted before render, or
    /// when the policy engine blocks (asset and publish only).
    pub fn begin_stage(&self, key: &str, stage: Stage) -> Result<(), RuntimeError> {
        let mut entities = self.inner.entities.lock();
        let entity = entities
            .get(key)
            .ok_or_else(|| RuntimeError::UnknownEntity(key.to_string()))?;
        let overall = entity.overall_status();
        let reasons = entity.block_reasons();
        entity.status.check_begin(stage, overall, &reasons)?;
        entities.record(&EntityEvent::StageChanged {
            key: key.to_string(),
            stage,
            state: StageState::InProgress,
            error: None,
        })?;
        tracing::debug!(key, stage = %stage, "stage begun");
        Ok(())
    }

    /// Mark an in-progress stage done.
    pub fn finish_stage(&self, key: &str, stage: Stage) -> Result<(), RuntimeError> {
        let mut entities = self.inner.entities.lock();
        let entity = entities
            .get(key)
            .ok_or_else(|| RuntimeError::UnknownEntity(key.to_string()))?;
        // Same check as StatusVector::finish, expressed as an event.
        match entity.status.state(stage) {
            StageState::InProgress => {}
            from => return Err(TransitionError::NotInProgress { stage, from }.into()),
        }
        entities.record(&EntityEvent::StageChanged {
            key: key.to_string(),
            stage,
            state: StageState::Done,
            error: None,
        })?;
        tracing::info!(key, stage = %stage, "stage done");
        Ok(())
    }

    /// Record a stage failure with its error message.
    pub fn fail_stage(
        &self,
        key: &str,
        stage: Stage,
        error: &str,
    ) -> Result<(), RuntimeError> {
        let mut entities = self.inner.entities.lock();
        let entity = entities
            .get(key)
            .ok_or_else(|| RuntimeError::UnknownEntity(key.to_string()))?;
        match entity.status.state(stage) {
            StageState::InProgress => {}
            from => return Err(TransitionError::NotInProgress { stage, from }.into()),
        }
        entities.record(&EntityEvent::StageChanged {
            key: key.to_string(),
            stage,
            state: StageState::Error,
            error: Some(error.to_string()),
        })?;
        tracing::warn!(key, stage = %stage, error, "stage failed");
        Ok(())
    }

    /// Send a stage back to pending so it can be re-run. Valid from
    /// in-progress (abandoning work) and from error (after a rescrape);
    /// releasing a pending stage is a no-op.
    pub fn release_stage(&self, key: &str, stage: Stage) -> Result<(), RuntimeError> {
        let mut entities = self.inner.entities.lock();
        let entity = entities
            .get(key)
            .ok_or_else(|| RuntimeError::UnknownEntity(key.to_string()))?;
        match entity.status.state(stage) {
            StageState::InProgress | StageState::Error => {}
            StageState::Pending => return Ok(()),
            from @ StageState::Done => {
                return Err(TransitionError::NotInProgress { stage, from }.into())
            }
        }
        entities.record(&EntityEvent::StageChanged {
            key: key.to_string(),
            stage,
            state: StageState::Pending,
            error: None,
        })?;
        tracing::debug!(key, stage = %stage, "stage released");
        Ok(())
    }

    /// Record the findings of one compliance check phase, replacing any
    /// previous findings for that phase.
    pub fn record_findings(
        &self,
        key: &str,
        phase: &str,
        findings: Vec<Finding>,
    ) -> Result<(), RuntimeError> {
        let mut entities = self.inner.entities.lock();
        if !entities.contains(key) {
            return Err(RuntimeError::UnknownEntity(key.to_string()));
        }
        entities.record(&EntityEvent::FindingsRecorded {
            key: key.to_string(),
            phase: phase.to_string(),
            findings,
        })?;
        Ok(())
    }

    /// Advance the publish provider sub-state. Monotonic: a stale
    /// callback carrying an earlier state is recorded but has no effect
    /// on the materialized vector.
    pub fn advance_publish(
        &self,
        key: &str,
        state: PublishState,
    ) -> Result<(), RuntimeError> {
        let mut entities = self.inner.entities.lock();
        if !entities.contains(key) {
            return Err(RuntimeError::UnknownEntity(key.to_string()));
        }
        entities.record(&EntityEvent::PublishAdvanced {
            key: key.to_string(),
            state,
        })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
