use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::DATE_FORMAT;

pub const STATS_KEY: &str = "stats";
const COMPLETED_PREFIX: &str = "completed:";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to encode stats: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to prepare store directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Lifetime totals across all counted games.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregateStats {
    pub games_played: u32,
    pub games_won: u32,
    pub current_streak: u32,
    pub total_points: u64,
}

impl AggregateStats {
    /// Rounded win rate in percent, 0 when nothing has been played.
    pub fn win_percentage(&self) -> u32 {
        if self.games_played == 0 {
            return 0;
        }
        (f64::from(self.games_won) / f64::from(self.games_played) * 100.0).round() as u32
    }
}

pub fn completed_key(date: NaiveDate) -> String {
    format!("{COMPLETED_PREFIX}{}", date.format(DATE_FORMAT))
}

/// Minimal string key-value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// SQLite-backed key-value table.
#[derive(Debug)]
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, value],
        )?;
        Ok(())
    }
}

/// Process-local store used when no database can be opened.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    values: HashMap<String, String>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Per-date completion flags and aggregate stats.
///
/// Reads never fail: missing or unreadable data is reported as "not completed"
/// and zeroed stats.
pub trait CompletionStore {
    fn is_completed(&self, date: NaiveDate) -> bool;
    fn mark_completed(&mut self, date: NaiveDate) -> Result<(), StoreError>;
    fn read_stats(&self) -> AggregateStats;
    fn write_stats(&mut self, stats: &AggregateStats) -> Result<(), StoreError>;
}

/// [`CompletionStore`] over any [`KeyValueStore`], using the `stats` and
/// `completed:<date>` keys.
#[derive(Debug)]
pub struct KvCompletionStore<K> {
    kv: K,
}

impl<K: KeyValueStore> KvCompletionStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    pub fn into_inner(self) -> K {
        self.kv
    }
}

impl<K: KeyValueStore> CompletionStore for KvCompletionStore<K> {
    fn is_completed(&self, date: NaiveDate) -> bool {
        match self.kv.get(&completed_key(date)) {
            Ok(value) => value.is_some_and(|v| v.trim() == "true"),
            Err(err) => {
                log::warn!("could not read completion for {date}: {err}");
                false
            }
        }
    }

    fn mark_completed(&mut self, date: NaiveDate) -> Result<(), StoreError> {
        self.kv.set(&completed_key(date), "true")
    }

    fn read_stats(&self) -> AggregateStats {
        let raw = match self.kv.get(STATS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return AggregateStats::default(),
            Err(err) => {
                log::warn!("could not read stats: {err}");
                return AggregateStats::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            log::warn!("ignoring unreadable stats {raw:?}: {err}");
            AggregateStats::default()
        })
    }

    fn write_stats(&mut self, stats: &AggregateStats) -> Result<(), StoreError> {
        let json = serde_json::to_string(stats)?;
        self.kv.set(STATS_KEY, &json)
    }
}

/// How a finished session was accounted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsOutcome {
    /// Archive sessions never touch the store.
    Archive,
    Recorded(AggregateStats),
    /// Won a date that was already completed; nothing changed.
    NoPoints,
    /// Lost a date that was already completed; only the streak was reset.
    StreakReset(AggregateStats),
}

/// Apply the end-of-game update rule for one session.
pub fn record_outcome(
    store: &mut dyn CompletionStore,
    date: NaiveDate,
    is_archive_mode: bool,
    already_completed: bool,
    won: bool,
    score: u32,
) -> Result<StatsOutcome, StoreError> {
    if is_archive_mode {
        return Ok(StatsOutcome::Archive);
    }

    let mut stats = store.read_stats();

    if already_completed {
        if won {
            return Ok(StatsOutcome::NoPoints);
        }
        stats.current_streak = 0;
        store.write_stats(&stats)?;
        return Ok(StatsOutcome::StreakReset(stats));
    }

    stats.games_played += 1;
    if won {
        stats.games_won += 1;
        stats.current_streak += 1;
        stats.total_points += u64::from(score);
    } else {
        stats.current_streak = 0;
    }
    store.write_stats(&stats)?;
    if won {
        store.mark_completed(date)?;
    }

    Ok(StatsOutcome::Recorded(stats))
}
