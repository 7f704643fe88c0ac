// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use tempfile::tempdir;

fn new_store(dir: &Path) -> RunStore {
    RunStore::open(dir).unwrap()
}

#[test]
fn create_and_get() {
    let dir = tempdir().unwrap();
    let mut store = new_store(dir.path());

    let id = RunId::new();
    store.create(id.clone(), "headline-acquisition", json!({"target": "front"}), 10).unwrap();

    let run = store.get(id.as_str()).unwrap();
    assert_eq!(run.program, "headline-acquisition");
    assert_eq!(run.status, RunStatus::Queued);
}

#[test]
fn duplicate_create_is_refused() {
    let dir = tempdir().unwrap();
    let mut store = new_store(dir.path());

    let id = RunId::new();
    store.create(id.clone(), "x", json!(null), 10).unwrap();
    let err = store.create(id, "x", json!(null), 10).unwrap_err();
    assert!(matches!(err, RunStoreError::DuplicateRun(_)));
}

#[test]
fn append_requires_known_run() {
    let dir = tempdir().unwrap();
    let mut store = new_store(dir.path());

    let err = store
        .append(&RunEvent::Started { id: RunId::from_string("run-nope"), at_ms: 1 })
        .unwrap_err();
    assert!(matches!(err, RunStoreError::UnknownRun(_)));
}

#[test]
fn state_survives_reopen() {
    let dir = tempdir().unwrap();
    let id = RunId::new();

    {
        let mut store = new_store(dir.path());
        store.create(id.clone(), "headline-refresh", json!(null), 10).unwrap();
        store.append(&RunEvent::Started { id: id.clone(), at_ms: 11 }).unwrap();
        store
            .append(&RunEvent::StepCompleted {
                id: id.clone(),
                step: "scrape".into(),
                attempt: 1,
                result: json!([{"url": "https://example.com/a"}]),
                at_ms: 12,
            })
            .unwrap();
    }

    // Fresh process: replay materializes the same state
    let store = new_store(dir.path());
    let run = store.get(id.as_str()).unwrap();
    assert_eq!(run.status, RunStatus::Running);
    assert_eq!(run.log.len(), 1);
    assert_eq!(run.log[0].attempt, 1);
    assert!(run.step_result("scrape").is_some());
}

#[test]
fn prefix_lookup_requires_uniqueness() {
    let dir = tempdir().unwrap();
    let mut store = new_store(dir.path());

    store.create(RunId::from_string("run-abc111"), "x", json!(null), 1).unwrap();
    store.create(RunId::from_string("run-abd222"), "x", json!(null), 2).unwrap();

    assert!(store.get("run-abc").is_some());
    // Ambiguous prefix
    assert!(store.get("run-ab").is_none());
    assert!(store.get("run-zz").is_none());
}

#[test]
fn non_terminal_excludes_finished_runs() {
    let dir = tempdir().unwrap();
    let mut store = new_store(dir.path());

    let done = RunId::new();
    store.create(done.clone(), "x", json!(null), 1).unwrap();
    store.append(&RunEvent::Completed { id: done, output: json!(1), at_ms: 2 }).unwrap();

    let live = RunId::new();
    store.create(live.clone(), "x", json!(null), 3).unwrap();

    let open = store.non_terminal();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, live);
}

#[test]
fn wait_deadlines_survive_reopen() {
    let dir = tempdir().unwrap();
    let id = RunId::new();

    {
        let mut store = new_store(dir.path());
        store.create(id.clone(), "x", json!(null), 1).unwrap();
        store
            .append(&RunEvent::WaitScheduled {
                id: id.clone(),
                step: "fetch:retry-0".into(),
                wake_at_ms: 90_000,
            })
            .unwrap();
    }

    let store = new_store(dir.path());
    let run = store.get(id.as_str()).unwrap();
    assert_eq!(run.wait_deadline("fetch:retry-0"), Some(90_000));
}
