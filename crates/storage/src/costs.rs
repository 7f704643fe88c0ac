// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only log of generative-service spend.

use loom_core::RunId;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from cost log operations
#[derive(Debug, Error)]
pub enum CostLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One billed generative call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    pub at_ms: u64,
    pub run_id: RunId,
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
}

/// Append-only JSONL cost log.
pub struct CostLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl CostLog {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CostLogError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("costs.log");
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, writer: BufWriter::new(file) })
    }

    pub fn append(&mut self, entry: &CostEntry) -> Result<(), CostLogError> {
        let line = serde_json::to_string(entry)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Read back every entry (oldest first).
    pub fn entries(&self) -> Result<Vec<CostEntry>, CostLogError> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            entries.push(serde_json::from_str(&line)?);
        }
        Ok(entries)
    }

    /// Total spend across the log.
    pub fn total_usd(&self) -> Result<f64, CostLogError> {
        Ok(self.entries()?.iter().map(|e| e.cost_usd).sum())
    }
}

#[cfg(test)]
#[path = "costs_tests.rs"]
mod tests;
