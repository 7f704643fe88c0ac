// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Timelike;

#[test]
fn fake_clock_advance() {
    let clock = FakeClock::new();
    let start = clock.epoch_ms();

    clock.advance(Duration::from_secs(90));

    assert_eq!(clock.epoch_ms(), start + 90_000);
}

#[test]
fn fake_clock_set_epoch_ms() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_700_000_000_000);
    assert_eq!(clock.epoch_ms(), 1_700_000_000_000);
}

#[test]
fn utc_derives_from_epoch_ms() {
    let clock = FakeClock::new();
    // 2024-01-15T16:00:00Z
    clock.set_epoch_ms(1_705_334_400_000);

    let utc = clock.utc();
    assert_eq!(utc.hour(), 16);
    assert_eq!(utc.minute(), 0);
}

#[test]
fn system_clock_is_nonzero() {
    let clock = SystemClock;
    assert!(clock.epoch_ms() > 0);
}
