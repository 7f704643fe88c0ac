// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for tests in this crate and downstream crates.

use crate::entity::{natural_key, Entity};
use crate::policy::{Finding, Severity};

/// Entity discovered from a URL, with defaults suitable for assertions.
pub fn sample_entity(url: &str) -> Entity {
    Entity::new(natural_key(url), url.to_string(), format!("Headline for {url}"), 1_000)
}

/// Shorthand finding constructor.
pub fn finding(code: &str, severity: Severity) -> Finding {
    Finding::new(code, severity)
}

/// Proptest strategy over all severities.
pub fn severity_strategy() -> impl proptest::strategy::Strategy<Value = Severity> {
    use proptest::prelude::*;
    prop_oneof![
        Just(Severity::Pass),
        Just(Severity::Warn),
        Just(Severity::Review),
        Just(Severity::Block),
    ]
}

/// Proptest strategy over all stage statuses.
pub fn stage_status_strategy() -> impl proptest::strategy::Strategy<Value = crate::StageStatus> {
    use proptest::prelude::*;
    prop_oneof![
        Just(crate::StageStatus::Clean),
        Just(crate::StageStatus::Warn),
        Just(crate::StageStatus::Review),
        Just(crate::StageStatus::Block),
    ]
}
