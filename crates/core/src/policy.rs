// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Policy severity engine.
//!
//! Aggregates per-check compliance findings into a per-stage status, and
//! per-stage statuses into an overall status, under a fixed severity order.
//! Both derivations are pure, total, and monotonic: adding a more severe
//! finding or stage never lowers the result.

use serde::{Deserialize, Serialize};

/// Severity of a single compliance finding.
///
/// Closed ordinal set; comparisons go through `Ord`, never through strings.
/// Order: Pass < Warn < Review < Block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Pass,
    Warn,
    Review,
    Block,
}

crate::simple_display! {
    Severity {
        Pass => "PASS",
        Warn => "WARN",
        Review => "REVIEW",
        Block => "BLOCK",
    }
}

/// A single compliance-check result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Check code (e.g. "defamation", "source-reliability")
    pub code: String,
    pub severity: Severity,
    /// Optional human-readable note for reviewers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Finding {
    pub fn new(code: impl Into<String>, severity: Severity) -> Self {
        Self {
            code: code.into(),
            severity,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Aggregated status of one compliance phase.
///
/// There is no Pass-only stage status: a phase whose worst finding is Pass
/// collapses to Clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    Clean,
    Warn,
    Review,
    Block,
}

crate::simple_display! {
    StageStatus {
        Clean => "CLEAN",
        Warn => "WARN",
        Review => "REVIEW",
        Block => "BLOCK",
    }
}

/// Aggregated status across all of an entity's compliance phases.
///
/// Pending only when no phase has reported yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallStatus {
    Pending,
    Clean,
    Warn,
    Review,
    Block,
}

crate::simple_display! {
    OverallStatus {
        Pending => "PENDING",
        Clean => "CLEAN",
        Warn => "WARN",
        Review => "REVIEW",
        Block => "BLOCK",
    }
}

/// Derive the status of one phase from its findings.
pub fn derive_stage_status(findings: &[Finding]) -> StageStatus {
    findings
        .iter()
        .map(|f| match f.severity {
            Severity::Pass => StageStatus::Clean,
            Severity::Warn => StageStatus::Warn,
            Severity::Review => StageStatus::Review,
            Severity::Block => StageStatus::Block,
        })
        .max()
        .unwrap_or(StageStatus::Clean)
}

/// Derive an entity's overall status from its phase statuses.
pub fn derive_overall_status(stages: &[StageStatus]) -> OverallStatus {
    stages
        .iter()
        .map(|s| match s {
            StageStatus::Clean => OverallStatus::Clean,
            StageStatus::Warn => OverallStatus::Warn,
            StageStatus::Review => OverallStatus::Review,
            StageStatus::Block => OverallStatus::Block,
        })
        .max()
        .unwrap_or(OverallStatus::Pending)
}

/// Codes of all blocking findings, for conflict responses to callers.
pub fn block_reasons(findings: &[Finding]) -> Vec<String> {
    findings
        .iter()
        .filter(|f| f.severity == Severity::Block)
        .map(|f| f.code.clone())
        .collect()
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
