// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only per-run event log.
//!
//! One JSONL file per run: each line is a serialized
//! [`RunEvent`](loom_core::RunEvent). Appends are buffered; [`RunLog::flush`]
//! pushes them to the OS and fsyncs, which is the durable-commit point the
//! executor relies on before starting the next step.

use loom_core::RunEvent;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from run log operations
#[derive(Debug, Error)]
pub enum RunLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Append-only event log for a single run.
pub struct RunLog {
    path: PathBuf,
    writer: BufWriter<File>,
    write_seq: u64,
}

impl RunLog {
    /// Open (creating if needed) the log at `path`, counting existing
    /// entries so `write_seq` continues where the previous process stopped.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RunLogError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let existing = if path.exists() { Self::replay(&path)?.len() as u64 } else { 0 };

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            write_seq: existing,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries written (existing + this session).
    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    /// Append an event. Not durable until [`RunLog::flush`].
    pub fn append(&mut self, event: &RunEvent) -> Result<u64, RunLogError> {
        let line = serde_json::to_string(event)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.write_seq += 1;
        Ok(self.write_seq)
    }

    /// Flush buffered entries and fsync file data.
    pub fn flush(&mut self) -> Result<(), RunLogError> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }

    /// Read back every committed event.
    ///
    /// A torn final line (crash mid-write before flush) is skipped rather
    /// than failing replay; everything before it was durably committed.
    pub fn replay(path: &Path) -> Result<Vec<RunEvent>, RunLogError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
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
}

#[cfg(test)]
#[path = "runlog_tests.rs"]
mod tests;
