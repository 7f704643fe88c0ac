// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn run() -> Run {
    Run::new(RunId::from_string("run-test"), "headline-acquisition", json!({}), 100)
}

fn step_completed(run: &Run, step: &str, result: Value) -> RunEvent {
    RunEvent::StepCompleted {
        id: run.id.clone(),
        step: step.to_string(),
        attempt: 0,
        result,
        at_ms: 200,
    }
}

#[test]
fn started_moves_queued_to_running() {
    let mut r = run();
    r.apply(&RunEvent::Started { id: r.id.clone(), at_ms: 150 });
    assert_eq!(r.status, RunStatus::Running);
}

#[test]
fn step_completed_appends_once() {
    let mut r = run();
    let event = step_completed(&r, "check-cache", json!({"hit": false}));

    r.apply(&event);
    r.apply(&event);

    assert_eq!(r.log.len(), 1);
    assert_eq!(r.step_result("check-cache"), Some(&json!({"hit": false})));
}

#[test]
fn wait_scheduled_records_first_deadline() {
    let mut r = run();
    let id = r.id.clone();
    r.apply(&RunEvent::WaitScheduled {
        id: id.clone(),
        step: "refresh:retry-0".into(),
        wake_at_ms: 5_000,
    });
    // Replay of the same wait must not move the deadline
    r.apply(&RunEvent::WaitScheduled {
        id,
        step: "refresh:retry-0".into(),
        wake_at_ms: 9_000,
    });

    assert_eq!(r.wait_deadline("refresh:retry-0"), Some(5_000));
}

#[test]
fn step_completion_clears_its_wait() {
    let mut r = run();
    let id = r.id.clone();
    r.apply(&RunEvent::WaitScheduled { id, step: "refresh".into(), wake_at_ms: 5_000 });
    let done = step_completed(&r, "refresh", json!(3));
    r.apply(&done);

    assert_eq!(r.wait_deadline("refresh"), None);
}

#[test]
fn completed_sets_output_and_terminal() {
    let mut r = run();
    r.apply(&RunEvent::Completed { id: r.id.clone(), output: json!([1, 2]), at_ms: 300 });

    assert_eq!(r.status, RunStatus::Complete);
    assert_eq!(r.output, Some(json!([1, 2])));
    assert_eq!(r.finished_at_ms, Some(300));
    assert!(r.is_terminal());
}

#[test]
fn failed_preserves_error_message() {
    let mut r = run();
    r.apply(&RunEvent::Failed { id: r.id.clone(), error: "navigation timeout".into(), at_ms: 300 });

    assert_eq!(r.status, RunStatus::Failed);
    assert_eq!(r.error.as_deref(), Some("navigation timeout"));
}

#[test]
fn terminal_runs_ignore_later_events() {
    let mut r = run();
    r.apply(&RunEvent::Completed { id: r.id.clone(), output: json!(1), at_ms: 300 });

    r.apply(&RunEvent::Failed { id: r.id.clone(), error: "late".into(), at_ms: 400 });
    let late_step = step_completed(&r, "extra", json!(0));
    r.apply(&late_step);

    assert_eq!(r.status, RunStatus::Complete);
    assert!(r.error.is_none());
    assert!(r.log.is_empty());
}

#[test]
fn terminate_is_terminal_and_idempotent() {
    let mut r = run();
    r.apply(&RunEvent::Terminated { id: r.id.clone(), at_ms: 300 });
    r.apply(&RunEvent::Terminated { id: r.id.clone(), at_ms: 999 });

    assert_eq!(r.status, RunStatus::Terminated);
    assert_eq!(r.finished_at_ms, Some(300));
}

#[yare::parameterized(
    queued = { RunStatus::Queued, false },
    running = { RunStatus::Running, false },
    complete = { RunStatus::Complete, true },
    failed = { RunStatus::Failed, true },
    terminated = { RunStatus::Terminated, true },
)]
fn terminal_statuses(status: RunStatus, expected: bool) {
    assert_eq!(status.is_terminal(), expected);
}
