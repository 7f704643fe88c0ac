// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The runtime owns the stores and the adapter set, creates runs, and
//! drives each one on its own task. Concurrency is across runs; within a
//! run, steps execute strictly in order.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use loom_adapters::{BrowserAdapter, CacheAdapter, GenerativeAdapter};
use loom_core::{Clock, Run, RunEvent, RunId, TriggerDecision};
use loom_storage::{CostLog, EntityStore, RunStore, SnapshotStore};
use parking_lot::Mutex;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::context::RunContext;
use crate::error::RuntimeError;
use crate::pacer::Pacer;
use crate::programs::ProgramKind;

pub(crate) struct Inner<C, P, B, G, K> {
    pub(crate) config: EngineConfig,
    pub(crate) clock: C,
    pub(crate) pacer: P,
    pub(crate) browser: B,
    pub(crate) generative: G,
    pub(crate) cache: K,
    pub(crate) runs: Mutex<RunStore>,
    pub(crate) entities: Mutex<EntityStore>,
    pub(crate) snapshots: SnapshotStore,
    pub(crate) costs: Mutex<CostLog>,
    cancels: Mutex<HashMap<String, CancellationToken>>,
}

/// Shared handle to the engine. Cheap to clone; every driver task holds
/// one.
pub struct Runtime<C, P, B, G, K>
where
    C: Clock,
    P: Pacer,
    B: BrowserAdapter,
    G: GenerativeAdapter,
    K: CacheAdapter,
{
    pub(crate) inner: Arc<Inner<C, P, B, G, K>>,
}

impl<C, P, B, G, K> Clone for Runtime<C, P, B, G, K>
where
    C: Clock,
    P: Pacer,
    B: BrowserAdapter,
    G: GenerativeAdapter,
    K: CacheAdapter,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// What a scheduler tick did.
#[derive(Debug)]
pub struct TickOutcome {
    pub decision: TriggerDecision,
    /// Runs created by this tick, in creation order.
    pub created: Vec<(ProgramKind, RunId)>,
}

impl<C, P, B, G, K> Runtime<C, P, B, G, K>
where
    C: Clock,
    P: Pacer,
    B: BrowserAdapter,
    G: GenerativeAdapter,
    K: CacheAdapter,
{
    /// Open (or create) all stores under `data_dir` and assemble the
    /// runtime. Existing run logs are replayed into memory but not
    /// resumed; call [`Runtime::resume_all`] for that.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: EngineConfig,
        clock: C,
        pacer: P,
        browser: B,
        generative: G,
        cache: K,
        data_dir: impl AsRef<Path>,
    ) -> Result<Self, RuntimeError> {
        let dir = data_dir.as_ref();
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                clock,
                pacer,
                browser,
                generative,
                cache,
                runs: Mutex::new(RunStore::open(dir)?),
                entities: Mutex::new(EntityStore::open(dir)?),
                snapshots: SnapshotStore::open(dir.join("snapshots"))?,
                costs: Mutex::new(CostLog::open(dir)?),
                cancels: Mutex::new(HashMap::new()),
            }),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Create a run and start driving it on its own task. Returns the id
    /// immediately; poll [`Runtime::run_status`] for progress.
    pub fn create_run(
        &self,
        program: ProgramKind,
        input: Value,
    ) -> Result<RunId, RuntimeError> {
        let id = RunId::new();
        let now = self.inner.clock.epoch_ms();
        self.inner
            .runs
            .lock()
            .create(id.clone(), program.as_str(), input, now)?;
        tracing::info!(run = %id, program = %program, "run created");
        self.spawn_driver(id.clone());
        Ok(id)
    }

    /// Current materialized state of a run, by full id or unique prefix.
    pub fn run_status(&self, id: &str) -> Result<Run, RuntimeError> {
        self.inner
            .runs
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownRun(id.to_string()))
    }

    /// Terminate a run. Effects of the in-flight step are not rolled
    /// back; the log records everything committed before the cut.
    /// Terminating an already-terminal run is a no-op.
    pub fn terminate_run(&self, id: &str) -> Result<(), RuntimeError> {
        let event = {
            let runs = self.inner.runs.lock();
            let run = runs
                .get(id)
                .ok_or_else(|| RuntimeError::UnknownRun(id.to_string()))?;
            if run.is_terminal() {
                return Ok(());
            }
            RunEvent::Terminated {
                id: run.id.clone(),
                at_ms: self.inner.clock.epoch_ms(),
            }
        };
        let run_id = event.run_id().clone();
        self.inner.runs.lock().append(&event)?;
        if let Some(token) = self.inner.cancels.lock().remove(run_id.as_str()) {
            token.cancel();
        }
        tracing::info!(run = %run_id, "run terminated");
        Ok(())
    }

    /// Spawn driver tasks for every non-terminal run on disk. Call once
    /// after startup; returns how many runs were resumed.
    pub fn resume_all(&self) -> usize {
        let pending = self.inner.runs.lock().non_terminal();
        let mut resumed = 0;
        for run in pending {
            if self.inner.cancels.lock().contains_key(run.id.as_str()) {
                continue;
            }
            tracing::info!(run = %run.id, program = %run.program, "resuming run");
            self.spawn_driver(run.id);
            resumed += 1;
        }
        resumed
    }

    /// One scheduler pass: always refresh the acquisition pipeline and
    /// scan for failed scrapes; start topic selection only inside the
    /// trigger window.
    pub fn tick(&self) -> Result<TickOutcome, RuntimeError> {
        let decision = TriggerDecision::evaluate(
            self.inner.clock.utc(),
            self.inner.config.trigger_offset_hours,
        );
        let mut created = Vec::new();
        for kind in [ProgramKind::HeadlineAcquisition, ProgramKind::RescrapeScan] {
            let id = self.create_run(kind, Value::Null)?;
            created.push((kind, id));
        }
        if decision.should_trigger {
            let id = self.create_run(ProgramKind::TopicSelection, Value::Null)?;
            created.push((ProgramKind::TopicSelection, id));
        }
        tracing::debug!(
            trigger = decision.should_trigger,
            runs = created.len(),
            "tick"
        );
        Ok(TickOutcome { decision, created })
    }

    fn spawn_driver(&self, run_id: RunId) {
        let token = CancellationToken::new();
        self.inner
            .cancels
            .lock()
            .insert(run_id.to_string(), token.clone());
        let runtime = self.clone();
        tokio::spawn(async move {
            runtime.drive(run_id, token).await;
        });
    }

    /// Drive one run to a terminal state. Runs on its own task; errors
    /// end the run and are recorded in its log, never propagated.
    async fn drive(self, run_id: RunId, cancel: CancellationToken) {
        let outcome = self.drive_inner(&run_id, cancel).await;
        self.inner.cancels.lock().remove(run_id.as_str());
        if let Err(err) = outcome {
            tracing::error!(run = %run_id, error = %err, "driver error");
        }
    }

    async fn drive_inner(
        &self,
        run_id: &RunId,
        cancel: CancellationToken,
    ) -> Result<(), RuntimeError> {
        let (program, started) = {
            let runs = self.inner.runs.lock();
            let run = runs
                .get(run_id.as_str())
                .ok_or_else(|| RuntimeError::UnknownRun(run_id.to_string()))?;
            if run.is_terminal() {
                return Ok(());
            }
            (run.program.clone(), run.status == loom_core::RunStatus::Running)
        };
        if !started {
            self.append(RunEvent::Started {
                id: run_id.clone(),
                at_ms: self.inner.clock.epoch_ms(),
            })?;
        }

        // An unrecognized program still ends the run with a recorded
        // failure; leaving it Running would strand the status endpoint.
        let kind = match ProgramKind::parse(&program) {
            Some(kind) => kind,
            None => {
                let err = RuntimeError::UnknownProgram(program.clone());
                tracing::warn!(run = %run_id, error = %err, "run failed before dispatch");
                return self.append(RunEvent::Failed {
                    id: run_id.clone(),
                    error: err.to_string(),
                    at_ms: self.inner.clock.epoch_ms(),
                });
            }
        };
        let ctx = RunContext::new(self.clone(), run_id.clone(), cancel.clone());

        match self.dispatch(kind, &ctx).await {
            Ok(output) => {
                tracing::info!(run = %run_id, program = %kind, "run complete");
                self.append(RunEvent::Completed {
                    id: run_id.clone(),
                    output,
                    at_ms: self.inner.clock.epoch_ms(),
                })
            }
            Err(RuntimeError::Terminated) => Ok(()),
            Err(err) if cancel.is_cancelled() => {
                tracing::debug!(run = %run_id, error = %err, "run cancelled mid-step");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(run = %run_id, program = %kind, error = %err, "run failed");
                self.append(RunEvent::Failed {
                    id: run_id.clone(),
                    error: err.to_string(),
                    at_ms: self.inner.clock.epoch_ms(),
                })
            }
        }
    }

    // Accessors used by the step executor. Locks are scoped so no guard
    // is ever held across an await point.

    pub(crate) fn append(&self, event: RunEvent) -> Result<(), RuntimeError> {
        Ok(self.inner.runs.lock().append(&event)?)
    }

    pub(crate) fn step_result(
        &self,
        run_id: &RunId,
        step: &str,
    ) -> Result<Option<Value>, RuntimeError> {
        let runs = self.inner.runs.lock();
        let run = runs
            .get(run_id.as_str())
            .ok_or_else(|| RuntimeError::UnknownRun(run_id.to_string()))?;
        Ok(run.step_result(step).cloned())
    }

    /// Highest retry ordinal already recorded for `step`, counting both
    /// committed backoff waits and a wait scheduled by a crashed
    /// incarnation. Zero when the step has never failed.
    pub(crate) fn recorded_retries(
        &self,
        run_id: &RunId,
        step: &str,
    ) -> Result<u32, RuntimeError> {
        let runs = self.inner.runs.lock();
        let run = runs
            .get(run_id.as_str())
            .ok_or_else(|| RuntimeError::UnknownRun(run_id.to_string()))?;
        let prefix = format!("{step}:retry-");
        Ok(run
            .log
            .iter()
            .map(|r| r.name.as_str())
            .chain(run.waits.keys().map(String::as_str))
            .filter_map(|name| name.strip_prefix(&prefix))
            .filter_map(|n| n.parse().ok())
            .max()
            .unwrap_or(0))
    }

    pub(crate) fn wait_deadline(
        &self,
        run_id: &RunId,
        step: &str,
    ) -> Result<Option<u64>, RuntimeError> {
        let runs = self.inner.runs.lock();
        let run = runs
            .get(run_id.as_str())
            .ok_or_else(|| RuntimeError::UnknownRun(run_id.to_string()))?;
        Ok(run.wait_deadline(step))
    }

    pub(crate) fn now_ms(&self) -> u64 {
        self.inner.clock.epoch_ms()
    }

    pub(crate) fn now_utc(&self) -> DateTime<Utc> {
        self.inner.clock.utc()
    }

    pub(crate) async fn pause(&self, d: Duration) {
        self.inner.pacer.pause(d).await;
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
