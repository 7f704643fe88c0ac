// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const NO_REASONS: &[String] = &[];

fn vector() -> StatusVector {
    StatusVector::default()
}

#[test]
fn happy_path_pending_in_progress_done() {
    let mut v = vector();

    v.begin(Stage::Selection, OverallStatus::Pending, NO_REASONS).unwrap();
    assert_eq!(v.selection, StageState::InProgress);

    v.finish(Stage::Selection).unwrap();
    assert_eq!(v.selection, StageState::Done);
}

#[test]
fn done_never_regresses_to_pending() {
    let mut v = vector();
    v.begin(Stage::Script, OverallStatus::Clean, NO_REASONS).unwrap();
    v.finish(Stage::Script).unwrap();

    let err = v.begin(Stage::Script, OverallStatus::Clean, NO_REASONS).unwrap_err();
    assert_eq!(
        err,
        TransitionError::Regression { stage: Stage::Script, from: StageState::Done }
    );
}

#[test]
fn double_begin_is_a_conflict() {
    let mut v = vector();
    v.begin(Stage::Selection, OverallStatus::Pending, NO_REASONS).unwrap();

    let err = v.begin(Stage::Selection, OverallStatus::Pending, NO_REASONS).unwrap_err();
    assert_eq!(err, TransitionError::AlreadyInProgress { stage: Stage::Selection });
}

#[test]
fn errored_stage_allows_manual_retry() {
    let mut v = vector();
    v.begin(Stage::Selection, OverallStatus::Pending, NO_REASONS).unwrap();
    v.fail(Stage::Selection).unwrap();
    assert_eq!(v.selection, StageState::Error);

    v.begin(Stage::Selection, OverallStatus::Pending, NO_REASONS).unwrap();
    assert_eq!(v.selection, StageState::InProgress);
}

#[test]
fn release_returns_to_pending() {
    let mut v = vector();
    v.begin(Stage::Render, OverallStatus::Clean, NO_REASONS).unwrap();
    v.release(Stage::Render).unwrap();
    assert_eq!(v.render, StageState::Pending);
}

#[yare::parameterized(
    asset = { Stage::Asset },
    publish = { Stage::Publish },
)]
fn block_refuses_gated_stages_with_reasons(stage: Stage) {
    let mut v = vector();
    v.render = StageState::Done; // satisfy the publish precondition
    let reasons = vec!["defamation".to_string()];

    let err = v.begin(stage, OverallStatus::Block, &reasons).unwrap_err();
    assert_eq!(err, TransitionError::PolicyBlocked { reasons });
}

#[yare::parameterized(
    selection = { Stage::Selection },
    script = { Stage::Script },
    render = { Stage::Render },
)]
fn block_does_not_gate_early_stages(stage: Stage) {
    let mut v = vector();
    v.begin(stage, OverallStatus::Block, NO_REASONS).unwrap();
}

#[yare::parameterized(
    clean = { OverallStatus::Clean },
    warn = { OverallStatus::Warn },
    review = { OverallStatus::Review },
)]
fn non_block_statuses_permit_publish(overall: OverallStatus) {
    let mut v = vector();
    v.render = StageState::Done;
    v.begin(Stage::Publish, overall, NO_REASONS).unwrap();
    assert_eq!(v.publish, PublishState::Uploading);
}

#[test]
fn publish_requires_render_done() {
    let mut v = vector();
    let err = v.begin(Stage::Publish, OverallStatus::Clean, NO_REASONS).unwrap_err();
    assert_eq!(err, TransitionError::RenderNotDone);
}

#[test]
fn finish_requires_in_progress() {
    let mut v = vector();
    let err = v.finish(Stage::Asset).unwrap_err();
    assert_eq!(
        err,
        TransitionError::NotInProgress { stage: Stage::Asset, from: StageState::Pending }
    );
}

#[test]
fn publish_substates_project_onto_progression() {
    assert_eq!(PublishState::Pending.progression(), StageState::Pending);
    assert_eq!(PublishState::Uploading.progression(), StageState::InProgress);
    assert_eq!(PublishState::Processing.progression(), StageState::InProgress);
    assert_eq!(PublishState::Live.progression(), StageState::Done);
    assert_eq!(PublishState::Error.progression(), StageState::Error);
}

#[test]
fn advance_publish_is_monotonic() {
    let mut v = vector();
    v.render = StageState::Done;
    v.begin(Stage::Publish, OverallStatus::Clean, NO_REASONS).unwrap();

    v.advance_publish(PublishState::Processing);
    assert_eq!(v.publish, PublishState::Processing);

    // Stale provider callback does not move the state backwards
    v.advance_publish(PublishState::Uploading);
    assert_eq!(v.publish, PublishState::Processing);

    v.advance_publish(PublishState::Live);
    assert_eq!(v.publish, PublishState::Live);
}

#[test]
fn publish_finish_maps_to_live() {
    let mut v = vector();
    v.render = StageState::Done;
    v.begin(Stage::Publish, OverallStatus::Clean, NO_REASONS).unwrap();
    v.finish(Stage::Publish).unwrap();
    assert_eq!(v.publish, PublishState::Live);
}
