// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! loom-storage: durable layer for the Newsloom pipeline engine.
//!
//! Everything here is append-only and replayable: per-run event logs
//! materialize [`loom_core::Run`]s, the entity log materializes the entity
//! index, snapshots capture acquired data immutably, and the cost log
//! records generative spend. A crash never loses a committed write; replay
//! reconstructs the exact in-memory state.

mod costs;
mod entities;
mod runlog;
mod runs;
mod snapshots;

pub use costs::{CostEntry, CostLog, CostLogError};
pub use entities::{EntityStore, EntityStoreError};
pub use runlog::{RunLog, RunLogError};
pub use runs::{RunStore, RunStoreError};
pub use snapshots::{SnapshotMeta, SnapshotStore, SnapshotStoreError};
