// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-run step executor.
//!
//! Step bodies run at least once; their commit happens at most once. A
//! step name that already has a committed record returns the recorded
//! result without re-invoking the body, which is what makes a crashed
//! run resumable from its log.

use std::future::Future;
use std::time::Duration;

use loom_adapters::{BrowserAdapter, CacheAdapter, GenerativeAdapter};
use loom_core::{Clock, RetryPolicy, RunEvent, RunId, StepError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;
use crate::pacer::Pacer;
use crate::runtime::Runtime;

pub struct RunContext<C, P, B, G, K>
where
    C: Clock,
    P: Pacer,
    B: BrowserAdapter,
    G: GenerativeAdapter,
    K: CacheAdapter,
{
    runtime: Runtime<C, P, B, G, K>,
    run_id: RunId,
    cancel: CancellationToken,
}

impl<C, P, B, G, K> RunContext<C, P, B, G, K>
where
    C: Clock,
    P: Pacer,
    B: BrowserAdapter,
    G: GenerativeAdapter,
    K: CacheAdapter,
{
    pub(crate) fn new(
        runtime: Runtime<C, P, B, G, K>,
        run_id: RunId,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            runtime,
            run_id,
            cancel,
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub(crate) fn runtime(&self) -> &Runtime<C, P, B, G, K> {
        &self.runtime
    }

    /// Execute a named step. Memoized: if the run's log already holds a
    /// record for `name`, the body is skipped and the recorded result is
    /// returned. Transient failures retry per `policy` with a durable
    /// backoff wait between attempts; validation failures fail the step
    /// immediately.
    pub async fn run_step<T, F, Fut>(
        &self,
        name: &str,
        policy: &RetryPolicy,
        mut body: F,
    ) -> Result<T, RuntimeError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StepError>>,
    {
        if let Some(recorded) = self.runtime.step_result(&self.run_id, name)? {
            tracing::debug!(run = %self.run_id, step = name, "step replayed from log");
            return Ok(serde_json::from_value(recorded)?);
        }

        // A crash during a retry backoff leaves the wait in the log. Pick
        // the attempt counter back up from the recorded retries and finish
        // any pending wait before touching the body again.
        let mut attempt = self.runtime.recorded_retries(&self.run_id, name)?;
        if attempt > 0 {
            self.wait(&format!("{name}:retry-{attempt}"), Duration::ZERO)
                .await?;
        }
        loop {
            if self.cancel.is_cancelled() {
                return Err(RuntimeError::Terminated);
            }
            match body().await {
                Ok(value) => {
                    let result = serde_json::to_value(&value)?;
                    self.runtime.append(RunEvent::StepCompleted {
                        id: self.run_id.clone(),
                        step: name.to_string(),
                        attempt,
                        result,
                        at_ms: self.runtime.now_ms(),
                    })?;
                    tracing::debug!(run = %self.run_id, step = name, attempt, "step committed");
                    return Ok(value);
                }
                Err(err) if err.is_retryable() && policy.allows_retry(attempt + 1) => {
                    tracing::warn!(
                        run = %self.run_id,
                        step = name,
                        attempt,
                        error = %err,
                        "transient step failure, will retry"
                    );
                    let delay = policy.delay_for(attempt);
                    attempt += 1;
                    self.wait(&format!("{name}:retry-{attempt}"), delay).await?;
                }
                Err(err) => {
                    tracing::warn!(
                        run = %self.run_id,
                        step = name,
                        attempt,
                        error = %err,
                        "step failed"
                    );
                    return Err(RuntimeError::StepFailed {
                        step: name.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }
    }

    /// Durable wait. The absolute wake deadline is committed to the log
    /// before pausing, so a restart resumes the remaining wait rather
    /// than restarting it. A wait whose step record is already committed
    /// is a no-op on replay.
    pub async fn wait(&self, name: &str, delay: Duration) -> Result<(), RuntimeError> {
        if self.runtime.step_result(&self.run_id, name)?.is_some() {
            return Ok(());
        }
        let wake_at_ms = match self.runtime.wait_deadline(&self.run_id, name)? {
            Some(deadline) => deadline,
            None => {
                let deadline = self
                    .runtime
                    .now_ms()
                    .saturating_add(delay.as_millis() as u64);
                self.runtime.append(RunEvent::WaitScheduled {
                    id: self.run_id.clone(),
                    step: name.to_string(),
                    wake_at_ms: deadline,
                })?;
                deadline
            }
        };

        let remaining = wake_at_ms.saturating_sub(self.runtime.now_ms());
        if remaining > 0 {
            self.runtime.pause(Duration::from_millis(remaining)).await;
        }
        if self.cancel.is_cancelled() {
            return Err(RuntimeError::Terminated);
        }
        self.runtime.append(RunEvent::StepCompleted {
            id: self.run_id.clone(),
            step: name.to_string(),
            attempt: 0,
            result: Value::Null,
            at_ms: self.runtime.now_ms(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
