//! JSONL trail writer.
//!
//! Appends revision records to per-period `{trail_dir}/{YYYY-MM}.jsonl` files.
//! Uses `serde_jsonlines::append_json_lines` for per-line appends.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use cap_core::entities::RevisionRecord;
use cap_core::period::Period;

use crate::error::DatabaseError;

/// Current trail line format version.
pub const TRAIL_VERSION: u32 = 1;

/// One line of a period trail file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrailLine {
    pub v: u32,
    #[serde(flatten)]
    pub revision: RevisionRecord,
}

/// Trail file lengths captured before an append.
///
/// Restoring a mark cuts off lines whose transaction never committed.
#[derive(Debug, Default)]
pub struct TrailMark {
    files: Vec<(PathBuf, Option<u64>)>,
}

/// Appends revision records to per-period JSONL files.
///
/// `WriteTxn::commit` marks the files, calls `append()` before committing the
/// DB transaction, and restores the mark if the append or the commit fails.
pub struct TrailWriter {
    trail_dir: PathBuf,
    enabled: bool,
}

impl TrailWriter {
    /// Create a new `TrailWriter` pointing at the given directory.
    ///
    /// Creates the directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the directory cannot be created.
    pub fn new(trail_dir: PathBuf) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(&trail_dir).map_err(|e| DatabaseError::Other(e.into()))?;
        Ok(Self {
            trail_dir,
            enabled: true,
        })
    }

    /// Create a disabled writer (for tests or when no trail directory is configured).
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            trail_dir: PathBuf::new(),
            enabled: false,
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Path of the trail file for `period`.
    #[must_use]
    pub fn period_path(&self, period: Period) -> PathBuf {
        self.trail_dir.join(format!("{period}.jsonl"))
    }

    /// Append `records` to the period's JSONL file.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the file write fails.
    pub fn append(&self, period: Period, records: &[RevisionRecord]) -> Result<(), DatabaseError> {
        if !self.enabled || records.is_empty() {
            return Ok(());
        }

        let lines = records.iter().map(|revision| TrailLine {
            v: TRAIL_VERSION,
            revision: revision.clone(),
        });
        serde_jsonlines::append_json_lines(self.period_path(period), lines)
            .map_err(|e| DatabaseError::Other(e.into()))?;
        Ok(())
    }

    /// Record the current length of each period's file. Absent files are
    /// recorded as such.
    #[must_use]
    pub fn mark(&self, periods: impl IntoIterator<Item = Period>) -> TrailMark {
        if !self.enabled {
            return TrailMark::default();
        }
        let mut files: Vec<(PathBuf, Option<u64>)> = Vec::new();
        for period in periods {
            let path = self.period_path(period);
            if files.iter().any(|(seen, _)| *seen == path) {
                continue;
            }
            let len = std::fs::metadata(&path)
                .ok()
                .filter(std::fs::Metadata::is_file)
                .map(|meta| meta.len());
            files.push((path, len));
        }
        TrailMark { files }
    }

    /// Truncate every marked file back to its recorded length and remove the
    /// ones that did not exist. Every file is attempted; the first error is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a file cannot be truncated or removed.
    pub fn restore(&self, mark: &TrailMark) -> Result<(), DatabaseError> {
        let mut first_err = None;
        for (path, len) in &mark.files {
            let result = match len {
                Some(len) => std::fs::OpenOptions::new()
                    .write(true)
                    .open(path)
                    .and_then(|file| file.set_len(*len)),
                None if path.is_file() => std::fs::remove_file(path),
                None => Ok(()),
            };
            if let Err(e) = result {
                first_err.get_or_insert(DatabaseError::Other(e.into()));
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Read every line recorded for `period`. A missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the file exists but cannot be parsed.
    pub fn read_period(&self, period: Period) -> Result<Vec<TrailLine>, DatabaseError> {
        let path = self.period_path(period);
        if !path.exists() {
            return Ok(Vec::new());
        }
        serde_jsonlines::json_lines(&path)
            .map_err(|e| DatabaseError::Other(e.into()))?
            .collect::<Result<Vec<TrailLine>, _>>()
            .map_err(|e| DatabaseError::Other(e.into()))
    }

    /// The directory where trail files are stored.
    #[must_use]
    pub fn trail_dir(&self) -> &Path {
        &self.trail_dir
    }
}
