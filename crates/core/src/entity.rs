// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content entities (articles queued for video production).
//!
//! Entities are keyed by natural identity (a digest of the canonical
//! article URL), never by run ID, so concurrent discovery of the same
//! article collapses to a single insert. State is derived from
//! [`EntityEvent`]s replayed from the durable entity log.

use crate::policy::{derive_overall_status, derive_stage_status, Finding, OverallStatus};
use crate::stage::{PublishState, Stage, StageState, StatusVector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Derive an entity's natural key from its canonical URL.
///
/// Truncated hex SHA-256; stable across processes so insert-if-absent
/// dedupes discovery races.
pub fn natural_key(url: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(url.as_bytes());
    let mut key = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        key.push_str(&format!("{byte:02x}"));
    }
    key
}

/// One article flowing through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Natural key (see [`natural_key`])
    pub key: String,
    pub url: String,
    pub title: String,
    pub discovered_at_ms: u64,
    pub status: StatusVector,
    /// Free-form error per stage, set when a stage fails
    #[serde(default)]
    pub stage_errors: HashMap<Stage, String>,
    /// Compliance findings per check phase
    #[serde(default)]
    pub findings: HashMap<String, Vec<Finding>>,
}

impl Entity {
    pub fn new(key: String, url: String, title: String, at_ms: u64) -> Self {
        Self {
            key,
            url,
            title,
            discovered_at_ms: at_ms,
            status: StatusVector::default(),
            stage_errors: HashMap::new(),
            findings: HashMap::new(),
        }
    }

    /// Overall policy status across all reported phases.
    ///
    /// Pending until the first phase reports.
    pub fn overall_status(&self) -> OverallStatus {
        let stages: Vec<_> = self.findings.values().map(|f| derive_stage_status(f)).collect();
        derive_overall_status(&stages)
    }

    /// Blocking check codes across all phases, for conflict responses.
    pub fn block_reasons(&self) -> Vec<String> {
        let mut reasons: Vec<String> = self
            .findings
            .values()
            .flat_map(|f| crate::policy::block_reasons(f))
            .collect();
        reasons.sort();
        reasons.dedup();
        reasons
    }

    /// Apply an event. Handlers are idempotent: assignment, not mutation.
    pub fn apply(&mut self, event: &EntityEvent) {
        match event {
            // Insert-if-absent is the store's concern
            EntityEvent::Discovered { .. } => {}
            EntityEvent::StageChanged { stage, state, error, .. } => {
                match stage {
                    Stage::Selection => self.status.selection = *state,
                    Stage::Script => self.status.script = *state,
                    Stage::Asset => self.status.asset = *state,
                    Stage::Render => self.status.render = *state,
                    Stage::Publish => {
                        self.status.publish = match state {
                            StageState::Pending => PublishState::Pending,
                            StageState::InProgress => PublishState::Uploading,
                            StageState::Done => PublishState::Live,
                            StageState::Error => PublishState::Error,
                        }
                    }
                }
                match error {
                    Some(message) => {
                        self.stage_errors.insert(*stage, message.clone());
                    }
                    None => {
                        self.stage_errors.remove(stage);
                    }
                }
            }
            EntityEvent::PublishAdvanced { state, .. } => {
                self.status.advance_publish(*state);
            }
            EntityEvent::FindingsRecorded { phase, findings, .. } => {
                self.findings.insert(phase.clone(), findings.clone());
            }
        }
    }
}

/// Events persisted to the entity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EntityEvent {
    #[serde(rename = "entity:discovered")]
    Discovered {
        key: String,
        url: String,
        title: String,
        at_ms: u64,
    },

    #[serde(rename = "entity:stage")]
    StageChanged {
        key: String,
        stage: Stage,
        state: StageState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Forward movement of the publish provider sub-state.
    #[serde(rename = "entity:publish")]
    PublishAdvanced { key: String, state: PublishState },

    #[serde(rename = "entity:findings")]
    FindingsRecorded {
        key: String,
        phase: String,
        findings: Vec<Finding>,
    },
}

impl EntityEvent {
    pub fn key(&self) -> &str {
        match self {
            EntityEvent::Discovered { key, .. }
            | EntityEvent::StageChanged { key, .. }
            | EntityEvent::PublishAdvanced { key, .. }
            | EntityEvent::FindingsRecorded { key, .. } => key,
        }
    }
}

#[cfg(test)]
#[path = "entity_tests.rs"]
mod tests;
