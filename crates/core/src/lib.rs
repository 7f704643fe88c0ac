// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! loom-core: domain types for the Newsloom pipeline engine.
//!
//! Pure, I/O-free building blocks: run and step records with their event
//! log, the retry policy, the scheduler trigger decision, the policy
//! severity engine, and the per-entity stage state machine.

pub mod macros;

pub mod clock;
pub mod entity;
pub mod error;
pub mod event;
pub mod policy;
pub mod retry;
pub mod run;
pub mod stage;
pub mod trigger;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use entity::{natural_key, Entity, EntityEvent};
pub use error::{ErrorClass, StepError};
pub use event::RunEvent;
pub use policy::{
    block_reasons, derive_overall_status, derive_stage_status, Finding, OverallStatus, Severity,
    StageStatus,
};
pub use retry::{Backoff, RetryPolicy};
pub use run::{Run, RunId, RunStatus, StepRecord};
pub use stage::{PublishState, Stage, StageState, StatusVector, TransitionError};
pub use trigger::{TriggerDecision, DEFAULT_OFFSET_HOURS};
