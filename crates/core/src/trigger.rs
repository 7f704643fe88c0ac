// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler trigger decision.
//!
//! Pure mapping from a wall-clock instant to a pipeline-activation decision.
//! The scheduler tick always fires the lightweight stages (headline refresh,
//! rescrape scan); the heavier topic-selection stage additionally fires only
//! on ticks where [`TriggerDecision::should_trigger`] is true: odd hours on
//! the hour, evaluated in the target timezone.

use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Default target timezone offset: UTC+9.
pub const DEFAULT_OFFSET_HOURS: i32 = 9;

/// Diagnostic record of one trigger evaluation.
///
/// Pure and deterministic; no I/O. All fields are retained so scheduler
/// logs can explain why a tick did or did not fire selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDecision {
    pub utc_hour: u32,
    pub utc_minute: u32,
    pub local_hour: u32,
    pub local_minute: u32,
    pub is_odd_hour: bool,
    pub is_minute_zero: bool,
    pub should_trigger: bool,
}

impl TriggerDecision {
    /// Evaluate the trigger rule at `instant` for a target timezone
    /// `offset_hours` east of UTC.
    ///
    /// Falls back to UTC if the offset is out of chrono's representable
    /// range (±24h), which cannot happen for configured values.
    pub fn evaluate(instant: DateTime<Utc>, offset_hours: i32) -> Self {
        let offset = FixedOffset::east_opt(offset_hours * 3600).unwrap_or_else(|| Utc.fix());
        let local = instant.with_timezone(&offset);

        let is_odd_hour = local.hour() % 2 == 1;
        let is_minute_zero = local.minute() == 0;

        Self {
            utc_hour: instant.hour(),
            utc_minute: instant.minute(),
            local_hour: local.hour(),
            local_minute: local.minute(),
            is_odd_hour,
            is_minute_zero,
            should_trigger: is_odd_hour && is_minute_zero,
        }
    }
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
