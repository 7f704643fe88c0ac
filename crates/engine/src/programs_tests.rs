// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use loom_adapters::{BrowserError, GenerateError, Generation};
use loom_core::{natural_key, RunEvent, RunStatus, Stage, StageState};
use yare::parameterized;
use serde_json::Value;

use crate::programs::{
    AcquisitionReport, CaptureInput, ProgramKind, ScanReport, SelectionReport,
};
use crate::testutil::{harness, wait_terminal, Harness};

async fn run_acquisition(h: &Harness) -> AcquisitionReport {
    let id = h
        .runtime
        .create_run(ProgramKind::HeadlineAcquisition, Value::Null)
        .unwrap();
    let run = wait_terminal(&h.runtime, &id).await;
    assert_eq!(run.status, RunStatus::Complete, "error: {:?}", run.error);
    serde_json::from_value(run.output.unwrap()).unwrap()
}

#[tokio::test]
async fn acquisition_miss_refreshes_snapshots_and_fans_out() {
    let h = harness();
    h.browser.push_items(&[
        ("https://news.example/a", "Article A"),
        ("https://news.example/b", "Article B"),
    ]);

    let report = run_acquisition(&h).await;
    assert!(!report.cached);
    assert_eq!(report.total, 2);
    assert_eq!(report.new, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 0);

    // Front page plus one fetch per new article, serially.
    assert_eq!(
        h.browser.calls(),
        vec![
            "news-front".to_string(),
            "https://news.example/a".to_string(),
            "https://news.example/b".to_string(),
        ]
    );

    // Both entities registered under their natural keys.
    let key_a = natural_key("https://news.example/a");
    let entity = h.runtime.entity(&key_a).unwrap();
    assert_eq!(entity.title, "Article A");
    assert_eq!(entity.status.selection, StageState::Pending);

    // One snapshot written, fresh batch cached.
    assert_eq!(h.runtime.inner.snapshots.list().unwrap().len(), 1);
}

#[tokio::test]
async fn acquisition_within_ttl_is_served_from_cache() {
    let h = harness();
    h.browser
        .push_items(&[("https://news.example/a", "Article A")]);

    let first = run_acquisition(&h).await;
    assert!(!first.cached);
    let scrapes_after_first = h.browser.calls().len();

    let second = run_acquisition(&h).await;
    assert!(second.cached);
    assert_eq!(second.total, 1);
    assert_eq!(second.new, 0);
    // The refresh sub-run ran exactly once across both acquisitions.
    assert_eq!(h.browser.calls().len(), scrapes_after_first);
}

#[tokio::test]
async fn acquisition_after_eviction_rediscovers_nothing_new() {
    let h = harness();
    h.browser
        .push_items(&[("https://news.example/a", "Article A")]);
    run_acquisition(&h).await;

    h.cache.evict(&h.runtime.config().cache_key);
    h.browser
        .push_items(&[("https://news.example/a", "Article A")]);

    let report = run_acquisition(&h).await;
    assert!(!report.cached);
    // Already-known keys are filtered out by the diff.
    assert_eq!(report.new, 0);
    assert_eq!(report.succeeded, 0);
}

#[tokio::test]
async fn fanout_counts_partial_failures_and_keeps_going() {
    let h = harness();
    h.browser.push_items(&[
        ("https://news.example/a", "A"),
        ("https://news.example/b", "B"),
        ("https://news.example/c", "C"),
    ]);
    // First capture succeeds, second hits a malformed page (validation,
    // no retry), third must still execute.
    h.browser.push(Ok(Vec::new()));
    h.browser
        .push(Err(BrowserError::Malformed("truncated body".into())));
    h.browser.push(Ok(Vec::new()));

    let report = run_acquisition(&h).await;
    assert_eq!(report.new, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(h.browser.calls().len(), 4);

    // The failed capture registered nothing.
    assert!(h.runtime.entity(&natural_key("https://news.example/a")).is_some());
    assert!(h.runtime.entity(&natural_key("https://news.example/b")).is_none());
    assert!(h.runtime.entity(&natural_key("https://news.example/c")).is_some());
}

#[tokio::test]
async fn fanout_paces_between_items_but_not_after_the_last() {
    let h = harness();
    h.browser.push_items(&[
        ("https://news.example/a", "A"),
        ("https://news.example/b", "B"),
    ]);

    run_acquisition(&h).await;
    let delay = h.runtime.config().fanout_delay();
    let paces = h
        .pacer
        .pauses()
        .into_iter()
        .filter(|d| *d == delay)
        .count();
    // Two items, one inter-item delay.
    assert_eq!(paces, 1);
}

#[tokio::test]
async fn transient_scrape_error_is_retried() {
    let h = harness();
    h.browser
        .push(Err(BrowserError::Timeout("front page".into())));
    h.browser
        .push_items(&[("https://news.example/a", "Article A")]);

    let id = h
        .runtime
        .create_run(ProgramKind::HeadlineRefresh, Value::Null)
        .unwrap();
    let run = wait_terminal(&h.runtime, &id).await;
    assert_eq!(run.status, RunStatus::Complete);
    assert_eq!(h.browser.calls().len(), 2);
}

#[tokio::test]
async fn rescrape_scan_releases_errored_selection() {
    let h = harness();
    let key = natural_key("https://news.example/a");
    h.runtime
        .inner
        .entities
        .lock()
        .discover(&key, "https://news.example/a", "Article A", 0)
        .unwrap();
    h.runtime.begin_stage(&key, Stage::Selection).unwrap();
    h.runtime
        .fail_stage(&key, Stage::Selection, "model unavailable")
        .unwrap();

    let id = h
        .runtime
        .create_run(ProgramKind::RescrapeScan, Value::Null)
        .unwrap();
    let run = wait_terminal(&h.runtime, &id).await;
    assert_eq!(run.status, RunStatus::Complete);

    let report: ScanReport = serde_json::from_value(run.output.unwrap()).unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.rescraped, 1);
    assert_eq!(report.failed, 0);

    let entity = h.runtime.entity(&key).unwrap();
    assert_eq!(entity.status.selection, StageState::Pending);
    assert!(entity.stage_errors.is_empty());
}

#[tokio::test]
async fn rescrape_scan_with_nothing_stuck_is_empty() {
    let h = harness();
    let id = h
        .runtime
        .create_run(ProgramKind::RescrapeScan, Value::Null)
        .unwrap();
    let run = wait_terminal(&h.runtime, &id).await;
    let report: ScanReport = serde_json::from_value(run.output.unwrap()).unwrap();
    assert_eq!(report.scanned, 0);
    assert!(h.browser.calls().is_empty());
}

#[tokio::test]
async fn topic_selection_picks_oldest_pending_and_logs_cost() {
    let h = harness();
    for (i, url) in ["https://news.example/a", "https://news.example/b"]
        .iter()
        .enumerate()
    {
        h.runtime
            .inner
            .entities
            .lock()
            .discover(&natural_key(url), url, "Title", i as u64)
            .unwrap();
    }

    let id = h
        .runtime
        .create_run(ProgramKind::TopicSelection, Value::Null)
        .unwrap();
    let run = wait_terminal(&h.runtime, &id).await;
    assert_eq!(run.status, RunStatus::Complete);

    let report: SelectionReport = serde_json::from_value(run.output.unwrap()).unwrap();
    assert_eq!(report.considered, 2);
    assert_eq!(report.selected.len(), 2);
    assert_eq!(report.failed, 0);
    // Oldest discovery first.
    assert_eq!(report.selected[0], natural_key("https://news.example/a"));

    for url in ["https://news.example/a", "https://news.example/b"] {
        let entity = h.runtime.entity(&natural_key(url)).unwrap();
        assert_eq!(entity.status.selection, StageState::Done);
    }

    assert_eq!(h.generative.calls().len(), 2);
    let costs = h.runtime.inner.costs.lock().entries().unwrap();
    assert_eq!(costs.len(), 2);
    assert!(costs.iter().all(|c| c.cost_usd > 0.0));
}

#[tokio::test]
async fn topic_selection_failure_marks_the_stage_errored() {
    let h = harness();
    let key = natural_key("https://news.example/a");
    h.runtime
        .inner
        .entities
        .lock()
        .discover(&key, "https://news.example/a", "Title", 0)
        .unwrap();
    h.generative
        .fail_next(GenerateError::UnknownModel("flash".into()));

    let id = h
        .runtime
        .create_run(ProgramKind::TopicSelection, Value::Null)
        .unwrap();
    let run = wait_terminal(&h.runtime, &id).await;
    assert_eq!(run.status, RunStatus::Complete);

    let report: SelectionReport = serde_json::from_value(run.output.unwrap()).unwrap();
    assert_eq!(report.failed, 1);
    assert!(report.selected.is_empty());

    let entity = h.runtime.entity(&key).unwrap();
    assert_eq!(entity.status.selection, StageState::Error);
    assert!(entity.stage_errors.contains_key(&Stage::Selection));
}

#[tokio::test]
async fn redriven_selection_resumes_stage_transitions_without_refailing() {
    let h = harness();
    let key_a = natural_key("https://news.example/a");
    let key_b = natural_key("https://news.example/b");
    {
        let mut entities = h.runtime.inner.entities.lock();
        entities.discover(&key_a, "https://news.example/a", "A", 0).unwrap();
        entities.discover(&key_b, "https://news.example/b", "B", 1).unwrap();
    }
    // An earlier incarnation got partway through: a crashed mid-selection
    // with its generation committed, b finished entirely.
    h.runtime.begin_stage(&key_a, Stage::Selection).unwrap();
    h.runtime.begin_stage(&key_b, Stage::Selection).unwrap();
    h.runtime.finish_stage(&key_b, Stage::Selection).unwrap();

    let id = loom_core::RunId::new();
    let candidates: Vec<CaptureInput> = [(&key_a, "a"), (&key_b, "b")]
        .iter()
        .map(|(key, slug)| CaptureInput {
            key: (*key).clone(),
            url: format!("https://news.example/{slug}"),
            title: "Title".to_string(),
        })
        .collect();
    {
        let mut runs = h.runtime.inner.runs.lock();
        runs.create(id.clone(), ProgramKind::TopicSelection.as_str(), Value::Null, 0)
            .unwrap();
        runs.append(&RunEvent::StepCompleted {
            id: id.clone(),
            step: "pick-candidates".to_string(),
            attempt: 0,
            result: serde_json::to_value(&candidates).unwrap(),
            at_ms: 0,
        })
        .unwrap();
        runs.append(&RunEvent::StepCompleted {
            id: id.clone(),
            step: format!("generate:{key_a}"),
            attempt: 0,
            result: serde_json::to_value(Generation {
                content: "generated: earlier".to_string(),
                input_tokens: 40,
                output_tokens: 64,
            })
            .unwrap(),
            at_ms: 0,
        })
        .unwrap();
    }

    assert_eq!(h.runtime.resume_all(), 1);
    let run = wait_terminal(&h.runtime, &id).await;
    assert_eq!(run.status, RunStatus::Complete, "error: {:?}", run.error);

    let report: SelectionReport = serde_json::from_value(run.output.unwrap()).unwrap();
    assert_eq!(report.failed, 0);
    assert_eq!(report.selected, vec![key_a.clone(), key_b.clone()]);
    // Both committed results were replayed; the model was never re-asked.
    assert!(h.generative.calls().is_empty());
    for key in [&key_a, &key_b] {
        let entity = h.runtime.entity(key).unwrap();
        assert_eq!(entity.status.selection, StageState::Done);
        assert!(entity.stage_errors.is_empty());
    }
}

#[tokio::test]
async fn selection_respects_the_batch_limit() {
    let config = crate::config::EngineConfig {
        selection_batch: 2,
        ..Default::default()
    };
    let h = crate::testutil::harness_with(config);
    for i in 0..4u64 {
        let url = format!("https://news.example/{i}");
        h.runtime
            .inner
            .entities
            .lock()
            .discover(&natural_key(&url), &url, "Title", i)
            .unwrap();
    }

    let id = h
        .runtime
        .create_run(ProgramKind::TopicSelection, Value::Null)
        .unwrap();
    let run = wait_terminal(&h.runtime, &id).await;
    let report: SelectionReport = serde_json::from_value(run.output.unwrap()).unwrap();
    assert_eq!(report.considered, 2);
    assert_eq!(h.generative.calls().len(), 2);
}

#[parameterized(
    acquisition = { "headline-acquisition", ProgramKind::HeadlineAcquisition },
    refresh = { "headline-refresh", ProgramKind::HeadlineRefresh },
    capture = { "article-capture", ProgramKind::ArticleCapture },
    rescrape = { "rescrape-scan", ProgramKind::RescrapeScan },
    selection = { "topic-selection", ProgramKind::TopicSelection },
)]
fn program_kind_round_trips(name: &str, kind: ProgramKind) {
    assert_eq!(ProgramKind::parse(name), Some(kind));
    assert_eq!(kind.as_str(), name);
    assert_eq!(kind.to_string(), name);
}

#[test]
fn unrecognized_program_name_is_rejected() {
    assert_eq!(ProgramKind::parse("render-farm"), None);
}
