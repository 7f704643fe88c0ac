// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Two-phase sub-run invocation.
//!
//! Phase one commits the child's run id as a step result before anything
//! else, so a crash between "child created" and "child awaited" can never
//! spawn a duplicate child. Phase two polls the child to a terminal
//! status with durable pacing between polls.

use loom_adapters::{BrowserAdapter, CacheAdapter, GenerativeAdapter};
use loom_core::{Clock, RetryPolicy, RunId, RunStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::RunContext;
use crate::error::RuntimeError;
use crate::pacer::Pacer;
use crate::programs::ProgramKind;

/// Terminal state of an awaited sub-run, as memoized by the await step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwaitResult {
    pub run_id: RunId,
    pub status: RunStatus,
    pub output: Option<Value>,
    pub error: Option<String>,
}

/// Invoke `program` as a sub-run and await its terminal status. `label`
/// names the pair of steps (`{label}:create`, `{label}:await`) in the
/// parent's log. A child that ends anything but complete surfaces as
/// [`RuntimeError::SubRunFailed`].
pub async fn invoke_and_await<C, P, B, G, K>(
    ctx: &RunContext<C, P, B, G, K>,
    label: &str,
    program: ProgramKind,
    input: Value,
) -> Result<AwaitResult, RuntimeError>
where
    C: Clock,
    P: Pacer,
    B: BrowserAdapter,
    G: GenerativeAdapter,
    K: CacheAdapter,
{
    let runtime = ctx.runtime().clone();
    let create_input = input.clone();
    let child_id: RunId = ctx
        .run_step(&format!("{label}:create"), &RetryPolicy::none(), || {
            let runtime = runtime.clone();
            let input = create_input.clone();
            async move {
                runtime
                    .create_run(program, input)
                    .map_err(|e| loom_core::StepError::transient(e.to_string()))
            }
        })
        .await?;

    let poll_interval = runtime.config().poll_interval();
    let mut polls: u32 = 0;
    let result: AwaitResult = loop {
        let run = runtime.run_status(child_id.as_str())?;
        if run.status.is_terminal() {
            break AwaitResult {
                run_id: child_id.clone(),
                status: run.status,
                output: run.output,
                error: run.error,
            };
        }
        polls += 1;
        ctx.wait(&format!("{label}:poll-{polls}"), poll_interval)
            .await?;
    };

    // Memoize the terminal observation so a replay never re-polls.
    let result = ctx
        .run_step(&format!("{label}:await"), &RetryPolicy::none(), || {
            let result = result.clone();
            async move { Ok(result) }
        })
        .await?;

    match result.status {
        RunStatus::Complete => Ok(result),
        status => Err(RuntimeError::SubRunFailed {
            run_id: result.run_id.clone(),
            status,
            error: result.error.clone(),
        }),
    }
}

#[cfg(test)]
#[path = "subrun_tests.rs"]
mod tests;
