// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable entity index.
//!
//! Single append-only event log (`entities.log`) materializing the map of
//! known entities, keyed by natural identity. Discovery is insert-if-absent:
//! concurrent runs discovering the same article converge on one record, and
//! replay after a crash reconstructs the same map.

use loom_core::{Entity, EntityEvent};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from entity store operations
#[derive(Debug, Error)]
pub enum EntityStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
}

/// Event-sourced store of all pipeline entities.
pub struct EntityStore {
    path: PathBuf,
    writer: BufWriter<File>,
    entities: HashMap<String, Entity>,
}

impl EntityStore {
    /// Open the store, replaying `entities.log` if present.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, EntityStoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("entities.log");

        let mut entities = HashMap::new();
        if path.exists() {
            for event in Self::replay(&path)? {
                Self::apply(&mut entities, &event);
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::debug!(path = %path.display(), entities = entities.len(), "entity store opened");
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            entities,
        })
    }

    fn replay(path: &Path) -> Result<Vec<EntityEvent>, EntityStoreError> {
        let reader = BufReader::new(File::open(path)?);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(event) => events.push(event),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping torn log line");
                    break;
                }
            }
        }
        Ok(events)
    }

    /// Idempotent application: discovery guarded by existence, everything
    /// else assignment-based inside [`Entity::apply`].
    fn apply(entities: &mut HashMap<String, Entity>, event: &EntityEvent) {
        match event {
            EntityEvent::Discovered { key, url, title, at_ms } => {
                entities.entry(key.clone()).or_insert_with(|| {
                    Entity::new(key.clone(), url.clone(), title.clone(), *at_ms)
                });
            }
            other => {
                if let Some(entity) = entities.get_mut(other.key()) {
                    entity.apply(other);
                }
            }
        }
    }

    fn commit(&mut self, event: &EntityEvent) -> Result<(), EntityStoreError> {
        let line = serde_json::to_string(event)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Self::apply(&mut self.entities, event);
        Ok(())
    }

    /// Record a discovery. Returns `true` if the entity was new; an
    /// already-known key is a durable no-op (last-writer-wins on
    /// insert-if-absent).
    pub fn discover(
        &mut self,
        key: &str,
        url: &str,
        title: &str,
        at_ms: u64,
    ) -> Result<bool, EntityStoreError> {
        if self.entities.contains_key(key) {
            return Ok(false);
        }
        self.commit(&EntityEvent::Discovered {
            key: key.to_string(),
            url: url.to_string(),
            title: title.to_string(),
            at_ms,
        })?;
        Ok(true)
    }

    /// Durably apply any non-discovery event to a known entity.
    pub fn record(&mut self, event: &EntityEvent) -> Result<(), EntityStoreError> {
        if !self.entities.contains_key(event.key()) {
            return Err(EntityStoreError::UnknownEntity(event.key().to_string()));
        }
        self.commit(event)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&Entity> {
        self.entities.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entities.contains_key(key)
    }

    /// Diff candidate keys against the store: returns only unknown keys,
    /// preserving input order.
    pub fn absent_keys<'a>(&self, candidates: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        candidates
            .into_iter()
            .filter(|k| !self.entities.contains_key(*k))
            .map(str::to_string)
            .collect()
    }

    pub fn all(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
#[path = "entities_tests.rs"]
mod tests;
