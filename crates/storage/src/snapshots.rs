// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Immutable snapshots of acquired data.
//!
//! Each fresh (cache-miss) acquisition is captured once as a
//! timestamp-named, zstd-compressed JSON file. Snapshots are never
//! modified; cleanup bulk-deletes those older than the retention window.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const NAME_PREFIX: &str = "headlines-";
const NAME_SUFFIX: &str = ".json.zst";
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
const ZSTD_LEVEL: i32 = 3;

/// Errors from snapshot operations
#[derive(Debug, Error)]
pub enum SnapshotStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown snapshot: {0}")]
    UnknownSnapshot(String),
}

/// Name and capture instant of one stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotMeta {
    pub name: String,
    pub captured_at: DateTime<Utc>,
}

/// Directory of immutable snapshot files.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, SnapshotStoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Derive the snapshot name from its capture instant.
    fn name_for(captured_at: DateTime<Utc>) -> String {
        format!("{NAME_PREFIX}{}{NAME_SUFFIX}", captured_at.format(TIMESTAMP_FORMAT))
    }

    /// Parse a capture instant back out of a file name. Non-snapshot files
    /// yield None and are left alone by cleanup.
    fn parse_name(name: &str) -> Option<DateTime<Utc>> {
        let stamp = name.strip_prefix(NAME_PREFIX)?.strip_suffix(NAME_SUFFIX)?;
        let naive = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
        Some(Utc.from_utc_datetime(&naive))
    }

    /// Persist `payload` captured at `captured_at`. Returns the metadata of
    /// the written snapshot.
    pub fn save(
        &self,
        payload: &Value,
        captured_at: DateTime<Utc>,
    ) -> Result<SnapshotMeta, SnapshotStoreError> {
        let name = Self::name_for(captured_at);
        let bytes = serde_json::to_vec(payload)?;
        let compressed = zstd::encode_all(bytes.as_slice(), ZSTD_LEVEL)?;
        std::fs::write(self.path_for(&name), compressed)?;

        tracing::info!(name = %name, bytes = bytes.len(), "snapshot saved");
        Ok(SnapshotMeta { name, captured_at })
    }

    /// Load a snapshot's payload by name.
    pub fn load(&self, name: &str) -> Result<Value, SnapshotStoreError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(SnapshotStoreError::UnknownSnapshot(name.to_string()));
        }
        let compressed = std::fs::read(path)?;
        let bytes = zstd::decode_all(compressed.as_slice())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// All snapshots, oldest first.
    pub fn list(&self) -> Result<Vec<SnapshotMeta>, SnapshotStoreError> {
        let mut metas = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else { continue };
            if let Some(captured_at) = Self::parse_name(name) {
                metas.push(SnapshotMeta { name: name.to_string(), captured_at });
            }
        }
        metas.sort_by_key(|m| m.captured_at);
        Ok(metas)
    }

    /// Bulk-delete snapshots captured before `now - retention`.
    /// Returns the number deleted.
    pub fn prune_older_than(
        &self,
        retention: Duration,
        now: DateTime<Utc>,
    ) -> Result<usize, SnapshotStoreError> {
        let cutoff = now - chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::MAX);
        let mut deleted = 0;
        for meta in self.list()? {
            if meta.captured_at < cutoff {
                std::fs::remove_file(self.path_for(&meta.name))?;
                deleted += 1;
            }
        }
        if deleted > 0 {
            tracing::info!(deleted, "pruned old snapshots");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
#[path = "snapshots_tests.rs"]
mod tests;
