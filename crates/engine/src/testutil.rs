// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared engine test harness: a runtime wired entirely to fakes, with
//! the clock advanced by the pacer so nothing waits on the wall clock.

use loom_adapters::{FakeGenerative, MemoryCache, ScriptedBrowser};
use loom_core::{FakeClock, Run, RunId};
use tempfile::TempDir;

use crate::config::EngineConfig;
use crate::pacer::fake::ManualPacer;
use crate::runtime::Runtime;

pub(crate) type TestRuntime =
    Runtime<FakeClock, ManualPacer, ScriptedBrowser, FakeGenerative, MemoryCache<FakeClock>>;

pub(crate) struct Harness {
    pub runtime: TestRuntime,
    pub clock: FakeClock,
    pub pacer: ManualPacer,
    pub browser: ScriptedBrowser,
    pub generative: FakeGenerative,
    pub cache: MemoryCache<FakeClock>,
    pub dir: TempDir,
}

pub(crate) fn harness() -> Harness {
    harness_with(EngineConfig::default())
}

pub(crate) fn harness_with(config: EngineConfig) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_760_000_000_000);
    build(config, clock, dir)
}

/// Reopen the stores of an existing harness, as a restarted process
/// would. The old harness must be dropped first so its writers are
/// flushed and closed.
pub(crate) fn reopen(config: EngineConfig, clock: FakeClock, dir: TempDir) -> Harness {
    build(config, clock, dir)
}

fn build(config: EngineConfig, clock: FakeClock, dir: TempDir) -> Harness {
    let pacer = ManualPacer::new(clock.clone());
    let browser = ScriptedBrowser::new();
    let generative = FakeGenerative::new();
    let cache = MemoryCache::new(clock.clone());
    let runtime = Runtime::new(
        config,
        clock.clone(),
        pacer.clone(),
        browser.clone(),
        generative.clone(),
        cache.clone(),
        dir.path(),
    )
    .unwrap();
    Harness {
        runtime,
        clock,
        pacer,
        browser,
        generative,
        cache,
        dir,
    }
}

/// Yield until `id` reaches a terminal status.
pub(crate) async fn wait_terminal(runtime: &TestRuntime, id: &RunId) -> Run {
    for _ in 0..100_000 {
        let run = runtime.run_status(id.as_str()).unwrap();
        if run.is_terminal() {
            return run;
        }
        tokio::task::yield_now().await;
    }
    panic!("run {id} never reached a terminal status");
}
