// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-entity pipeline stage state machine.
//!
//! Each entity carries one status per pipeline stage. The stages form a
//! strict DAG of preconditions rather than a single finite-state machine:
//! every transition is checked against a small table of
//! (stage, precondition-on-other-stage, precondition-on-policy) rules.
//!
//! Transition rules:
//! - a stage moves pending → in-progress → done, or from in-progress back
//!   to pending/error on failure; never done → pending;
//! - entering in-progress while already in-progress is refused, which is
//!   what serializes per-entity admission across concurrent runs;
//! - entering in-progress for asset or publish is refused with a conflict
//!   when the entity's overall policy status is Block;
//! - publish may leave pending only once render is done.

use crate::policy::OverallStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline stages, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Selection,
    Script,
    Asset,
    Render,
    Publish,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Selection,
        Stage::Script,
        Stage::Asset,
        Stage::Render,
        Stage::Publish,
    ];
}

crate::simple_display! {
    Stage {
        Selection => "selection",
        Script => "script",
        Asset => "asset",
        Render => "render",
        Publish => "publish",
    }
}

/// Progress of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    #[default]
    Pending,
    InProgress,
    Done,
    Error,
}

crate::simple_display! {
    StageState {
        Pending => "pending",
        InProgress => "in-progress",
        Done => "done",
        Error => "error",
    }
}

/// Publish carries the external provider's own async processing states.
/// They project onto the four-way progression via [`PublishState::progression`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PublishState {
    #[default]
    Pending,
    Uploading,
    Processing,
    Live,
    Error,
}

impl PublishState {
    pub fn progression(&self) -> StageState {
        match self {
            PublishState::Pending => StageState::Pending,
            PublishState::Uploading | PublishState::Processing => StageState::InProgress,
            PublishState::Live => StageState::Done,
            PublishState::Error => StageState::Error,
        }
    }
}

crate::simple_display! {
    PublishState {
        Pending => "pending",
        Uploading => "uploading",
        Processing => "processing",
        Live => "live",
        Error => "error",
    }
}

/// A refused stage transition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// Another run already owns this stage; callers return a conflict.
    #[error("{stage} already in progress")]
    AlreadyInProgress { stage: Stage },

    /// Stage already completed; done never regresses to pending.
    #[error("{stage} is {from}, cannot start")]
    Regression { stage: Stage, from: StageState },

    #[error("render must be done before publish")]
    RenderNotDone,

    /// Policy gate refused the transition; not an error, a deliberate
    /// conflict carrying the blocking check codes.
    #[error("blocked by policy: {}", reasons.join(", "))]
    PolicyBlocked { reasons: Vec<String> },

    #[error("{stage} is {from}, expected in-progress")]
    NotInProgress { stage: Stage, from: StageState },
}

/// The multi-field status vector carried by every entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusVector {
    pub selection: StageState,
    pub script: StageState,
    pub asset: StageState,
    pub render: StageState,
    pub publish: PublishState,
}

impl StatusVector {
    /// Four-way progression of a stage (publish projected).
    pub fn state(&self, stage: Stage) -> StageState {
        match stage {
            Stage::Selection => self.selection,
            Stage::Script => self.script,
            Stage::Asset => self.asset,
            Stage::Render => self.render,
            Stage::Publish => self.publish.progression(),
        }
    }

    fn set_state(&mut self, stage: Stage, state: StageState) {
        match stage {
            Stage::Selection => self.selection = state,
            Stage::Script => self.script = state,
            Stage::Asset => self.asset = state,
            Stage::Render => self.render = state,
            Stage::Publish => {
                self.publish = match state {
                    StageState::Pending => PublishState::Pending,
                    StageState::InProgress => PublishState::Uploading,
                    StageState::Done => PublishState::Live,
                    StageState::Error => PublishState::Error,
                }
            }
        }
    }

    /// Check whether `stage` may enter in-progress, without mutating.
    ///
    /// `overall` and `reasons` come from the policy severity engine; the
    /// reasons are echoed back in the conflict so the caller can surface
    /// them.
    pub fn check_begin(
        &self,
        stage: Stage,
        overall: OverallStatus,
        reasons: &[String],
    ) -> Result<(), TransitionError> {
        // Policy gate applies to the stages with irreversible externally
        // visible effects: asset generation and publish.
        if matches!(stage, Stage::Asset | Stage::Publish) && overall == OverallStatus::Block {
            return Err(TransitionError::PolicyBlocked {
                reasons: reasons.to_vec(),
            });
        }

        if stage == Stage::Publish && self.render != StageState::Done {
            return Err(TransitionError::RenderNotDone);
        }

        match self.state(stage) {
            StageState::Pending | StageState::Error => Ok(()),
            StageState::InProgress => Err(TransitionError::AlreadyInProgress { stage }),
            StageState::Done => Err(TransitionError::Regression {
                stage,
                from: StageState::Done,
            }),
        }
    }

    /// Enter in-progress for `stage`, enforcing the transition table.
    pub fn begin(
        &mut self,
        stage: Stage,
        overall: OverallStatus,
        reasons: &[String],
    ) -> Result<(), TransitionError> {
        self.check_begin(stage, overall, reasons)?;
        self.set_state(stage, StageState::InProgress);
        Ok(())
    }

    /// Mark `stage` done. Only valid from in-progress.
    pub fn finish(&mut self, stage: Stage) -> Result<(), TransitionError> {
        match self.state(stage) {
            StageState::InProgress => {
                self.set_state(stage, StageState::Done);
                Ok(())
            }
            from => Err(TransitionError::NotInProgress { stage, from }),
        }
    }

    /// Record a failure: in-progress → error (manual retry allowed later).
    pub fn fail(&mut self, stage: Stage) -> Result<(), TransitionError> {
        match self.state(stage) {
            StageState::InProgress => {
                self.set_state(stage, StageState::Error);
                Ok(())
            }
            from => Err(TransitionError::NotInProgress { stage, from }),
        }
    }

    /// Release the stage back to pending without recording an error.
    pub fn release(&mut self, stage: Stage) -> Result<(), TransitionError> {
        match self.state(stage) {
            StageState::InProgress => {
                self.set_state(stage, StageState::Pending);
                Ok(())
            }
            from => Err(TransitionError::NotInProgress { stage, from }),
        }
    }

    /// Advance the publish provider sub-state. Only forward movement is
    /// applied; a stale provider callback never regresses the state.
    pub fn advance_publish(&mut self, next: PublishState) {
        let order = |s: &PublishState| match s {
            PublishState::Pending => 0,
            PublishState::Uploading => 1,
            PublishState::Processing => 2,
            PublishState::Live => 3,
            PublishState::Error => 4,
        };
        if order(&next) > order(&self.publish) {
            self.publish = next;
        }
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
