// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized run state over per-run event logs.
//!
//! `RunStore` owns one [`RunLog`] per run under `<dir>/runs/` and keeps the
//! replayed [`Run`]s in memory. `append` commits the event durably first,
//! then applies it to the in-memory run, so a step's durable commit always
//! precedes any observer seeing it, and a crash between the two simply
//! re-applies on replay (event application is idempotent).

use crate::runlog::{RunLog, RunLogError};
use loom_core::{Run, RunEvent, RunId, RunStatus};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from run store operations
#[derive(Debug, Error)]
pub enum RunStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("run log error: {0}")]
    Log(#[from] RunLogError),
    #[error("unknown run: {0}")]
    UnknownRun(String),
    #[error("run {0} already exists")]
    DuplicateRun(String),
}

/// Durable store of all runs.
pub struct RunStore {
    dir: PathBuf,
    runs: HashMap<String, Run>,
    logs: HashMap<String, RunLog>,
}

impl RunStore {
    /// Open the store rooted at `dir`, replaying every run log found.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, RunStoreError> {
        let dir = dir.into();
        let runs_dir = dir.join("runs");
        std::fs::create_dir_all(&runs_dir)?;

        let mut runs = HashMap::new();
        for entry in std::fs::read_dir(&runs_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "log").unwrap_or(false) {
                if let Some(run) = Self::materialize(&path)? {
                    runs.insert(run.id.to_string(), run);
                }
            }
        }

        tracing::debug!(dir = %dir.display(), runs = runs.len(), "run store opened");
        Ok(Self { dir, runs, logs: HashMap::new() })
    }

    fn log_path(&self, id: &RunId) -> PathBuf {
        self.dir.join("runs").join(format!("{id}.log"))
    }

    /// Replay one log file into a run, or None if the log never recorded
    /// a creation event (nothing durable happened).
    fn materialize(path: &Path) -> Result<Option<Run>, RunStoreError> {
        let events = RunLog::replay(path)?;
        let mut iter = events.iter();
        let mut run = match iter.next() {
            Some(RunEvent::Created { id, program, input, at_ms }) => {
                Run::new(id.clone(), program.clone(), input.clone(), *at_ms)
            }
            _ => return Ok(None),
        };
        for event in iter {
            run.apply(event);
        }
        Ok(Some(run))
    }

    /// Create a new run: durably commit its creation event and return it.
    pub fn create(
        &mut self,
        id: RunId,
        program: &str,
        input: Value,
        at_ms: u64,
    ) -> Result<Run, RunStoreError> {
        if self.runs.contains_key(id.as_str()) {
            return Err(RunStoreError::DuplicateRun(id.to_string()));
        }

        let mut log = RunLog::open(self.log_path(&id))?;
        log.append(&RunEvent::Created {
            id: id.clone(),
            program: program.to_string(),
            input: input.clone(),
            at_ms,
        })?;
        log.flush()?;

        let run = Run::new(id.clone(), program, input, at_ms);
        self.logs.insert(id.to_string(), log);
        self.runs.insert(id.to_string(), run.clone());
        Ok(run)
    }

    /// Durably append an event to its run's log, then apply it in memory.
    pub fn append(&mut self, event: &RunEvent) -> Result<(), RunStoreError> {
        let id = event.run_id().clone();
        if !self.runs.contains_key(id.as_str()) {
            return Err(RunStoreError::UnknownRun(id.to_string()));
        }

        let path = self.log_path(&id);
        let log = match self.logs.entry(id.to_string()) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(e) => e.insert(RunLog::open(path)?),
        };
        log.append(event)?;
        log.flush()?;

        if let Some(run) = self.runs.get_mut(id.as_str()) {
            run.apply(event);
        }
        Ok(())
    }

    /// Get a run by ID or unique prefix (like git commit hashes).
    pub fn get(&self, id: &str) -> Option<&Run> {
        if let Some(run) = self.runs.get(id) {
            return Some(run);
        }
        let mut matches = self.runs.values().filter(|r| r.id.starts_with(id));
        match (matches.next(), matches.next()) {
            (Some(run), None) => Some(run),
            _ => None,
        }
    }

    /// All runs that have not reached a terminal status, oldest first.
    /// These are the runs a restarted process re-drives.
    pub fn non_terminal(&self) -> Vec<Run> {
        let mut runs: Vec<Run> =
            self.runs.values().filter(|r| !r.is_terminal()).cloned().collect();
        runs.sort_by_key(|r| r.created_at_ms);
        runs
    }

    /// Count of runs with the given status.
    pub fn count_with_status(&self, status: RunStatus) -> usize {
        self.runs.values().filter(|r| r.status == status).count()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

#[cfg(test)]
#[path = "runs_tests.rs"]
mod tests;
