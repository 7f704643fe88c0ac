// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable orchestration engine for the content pipeline.
//!
//! The runtime drives [`programs`] as event-logged runs: each step's
//! result is committed before the next step starts, so a restarted
//! process replays the log and picks up exactly where it left off.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

#[cfg(test)]
pub(crate) mod testutil;

pub mod config;
pub mod context;
pub mod error;
pub mod gate;
pub mod pacer;
pub mod programs;
pub mod publish;
pub mod runtime;
pub mod subrun;

pub use config::{ConfigError, EngineConfig};
pub use context::RunContext;
pub use error::RuntimeError;
pub use pacer::{Pacer, TokioPacer};
pub use programs::{
    AcquisitionReport, CaptureInput, CaptureReport, HeadlineBatch, ProgramKind,
    ScanReport, SelectionReport,
};
pub use publish::{prepare_publish, upload_rendered, PublishContext, PublishError};
pub use runtime::{Runtime, TickOutcome};
pub use subrun::{invoke_and_await, AwaitResult};

#[cfg(any(test, feature = "test-support"))]
pub use pacer::fake::ManualPacer;
