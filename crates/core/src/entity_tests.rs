// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::policy::Severity;

fn entity() -> Entity {
    Entity::new(
        natural_key("https://example.com/a"),
        "https://example.com/a".into(),
        "Example headline".into(),
        100,
    )
}

#[test]
fn natural_key_is_stable_and_short() {
    let a = natural_key("https://example.com/a");
    let b = natural_key("https://example.com/a");
    let c = natural_key("https://example.com/b");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), 16);
    assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
}

#[test]
fn overall_status_pending_before_any_phase_reports() {
    assert_eq!(entity().overall_status(), OverallStatus::Pending);
}

#[test]
fn findings_drive_overall_status() {
    let mut e = entity();
    e.apply(&EntityEvent::FindingsRecorded {
        key: e.key.clone(),
        phase: "script".into(),
        findings: vec![Finding::new("tone", Severity::Warn)],
    });
    assert_eq!(e.overall_status(), OverallStatus::Warn);

    e.apply(&EntityEvent::FindingsRecorded {
        key: e.key.clone(),
        phase: "render".into(),
        findings: vec![Finding::new("defamation", Severity::Block)],
    });
    assert_eq!(e.overall_status(), OverallStatus::Block);
    assert_eq!(e.block_reasons(), vec!["defamation"]);
}

#[test]
fn re_recording_a_phase_replaces_its_findings() {
    let mut e = entity();
    e.apply(&EntityEvent::FindingsRecorded {
        key: e.key.clone(),
        phase: "script".into(),
        findings: vec![Finding::new("defamation", Severity::Block)],
    });
    e.apply(&EntityEvent::FindingsRecorded {
        key: e.key.clone(),
        phase: "script".into(),
        findings: vec![],
    });

    assert_eq!(e.overall_status(), OverallStatus::Clean);
    assert!(e.block_reasons().is_empty());
}

#[test]
fn stage_changed_sets_state_and_error() {
    let mut e = entity();
    e.apply(&EntityEvent::StageChanged {
        key: e.key.clone(),
        stage: Stage::Selection,
        state: StageState::Error,
        error: Some("capture timeout".into()),
    });

    assert_eq!(e.status.selection, StageState::Error);
    assert_eq!(e.stage_errors.get(&Stage::Selection).map(String::as_str), Some("capture timeout"));

    // A later successful transition clears the stored error
    e.apply(&EntityEvent::StageChanged {
        key: e.key.clone(),
        stage: Stage::Selection,
        state: StageState::Done,
        error: None,
    });
    assert!(e.stage_errors.is_empty());
}

#[test]
fn publish_stage_changed_maps_to_substates() {
    let mut e = entity();
    e.apply(&EntityEvent::StageChanged {
        key: e.key.clone(),
        stage: Stage::Publish,
        state: StageState::InProgress,
        error: None,
    });
    assert_eq!(e.status.publish, PublishState::Uploading);

    e.apply(&EntityEvent::PublishAdvanced { key: e.key.clone(), state: PublishState::Processing });
    assert_eq!(e.status.publish, PublishState::Processing);
}
