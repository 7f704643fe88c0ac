// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn entry(model: &str, cost: f64) -> CostEntry {
    CostEntry {
        at_ms: 1_000,
        run_id: RunId::from_string("run-test"),
        model: model.to_string(),
        input_tokens: 900,
        output_tokens: 150,
        cost_usd: cost,
    }
}

#[test]
fn append_and_read_back() {
    let dir = tempdir().unwrap();
    let mut log = CostLog::open(dir.path()).unwrap();

    log.append(&entry("flash", 0.002)).unwrap();
    log.append(&entry("pro", 0.015)).unwrap();

    let entries = log.entries().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].model, "flash");
    assert_eq!(entries[1].model, "pro");
}

#[test]
fn entries_survive_reopen() {
    let dir = tempdir().unwrap();
    {
        let mut log = CostLog::open(dir.path()).unwrap();
        log.append(&entry("flash", 0.002)).unwrap();
    }
    let log = CostLog::open(dir.path()).unwrap();
    assert_eq!(log.entries().unwrap().len(), 1);
}

#[test]
fn total_sums_all_entries() {
    let dir = tempdir().unwrap();
    let mut log = CostLog::open(dir.path()).unwrap();
    log.append(&entry("flash", 0.002)).unwrap();
    log.append(&entry("pro", 0.015)).unwrap();

    let total = log.total_usd().unwrap();
    assert!((total - 0.017).abs() < 1e-9);
}
