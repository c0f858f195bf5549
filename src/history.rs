use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::Status;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("history csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// One finished game, as appended to `history.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub played_at: String,
    pub puzzle_date: NaiveDate,
    pub word: String,
    pub outcome: String,
    pub attempts: usize,
    pub elapsed_secs: u64,
    pub score: u32,
    pub hint_used: bool,
    pub archive: bool,
}

impl HistoryRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        played_at: DateTime<Local>,
        puzzle_date: NaiveDate,
        word: &str,
        status: Status,
        attempts: usize,
        elapsed_secs: u64,
        score: u32,
        hint_used: bool,
        archive: bool,
    ) -> Self {
        Self {
            played_at: played_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            puzzle_date,
            word: word.to_string(),
            outcome: status.to_string().to_lowercase(),
            attempts,
            elapsed_secs,
            score,
            hint_used,
            archive,
        }
    }

    pub fn won(&self) -> bool {
        self.outcome == "won"
    }
}

/// Append-only csv log of finished games.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &HistoryRecord) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let needs_header = fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    /// All records in file order; a missing file reads as empty.
    pub fn read_all(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let records = reader
            .deserialize()
            .collect::<Result<Vec<HistoryRecord>, _>>()?;
        Ok(records)
    }

    /// The `n` most recent records, newest first.
    pub fn recent(&self, n: usize) -> Result<Vec<HistoryRecord>, HistoryError> {
        let mut records = self.read_all()?;
        records.reverse();
        records.truncate(n);
        Ok(records)
    }
}
