use std::time::SystemTime;

use chrono::{Datelike, Duration, NaiveDate};
use itertools::Itertools;
use thiserror::Error;

use crate::catalog::{Catalog, PuzzleDefinition};
use crate::session::{Session, SessionConfig};
use crate::stats::CompletionStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no puzzle scheduled for {0}")]
    NotFound(NaiveDate),
    #[error("the puzzle for {0} is not available yet")]
    NotYetAvailable(NaiveDate),
}

/// A puzzle picked for play, with the mode it is played in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPuzzle {
    pub puzzle: PuzzleDefinition,
    pub is_archive_mode: bool,
    pub already_completed: bool,
}

impl ResolvedPuzzle {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(&self.puzzle, self.is_archive_mode, self.already_completed)
    }

    pub fn start_session(&self, started_at: SystemTime) -> Session {
        Session::new(self.session_config(), started_at)
    }
}

/// Pick the puzzle for `requested` (today when `None`).
pub fn resolve(
    catalog: &Catalog,
    requested: Option<NaiveDate>,
    today: NaiveDate,
    store: &dyn CompletionStore,
) -> Result<ResolvedPuzzle, ResolveError> {
    let date = requested.unwrap_or(today);
    if date > today {
        return Err(ResolveError::NotYetAvailable(date));
    }
    let puzzle = catalog.get(date).ok_or(ResolveError::NotFound(date))?;

    Ok(ResolvedPuzzle {
        puzzle: puzzle.clone(),
        is_archive_mode: date != today,
        already_completed: store.is_completed(date),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum DayStatus {
    Future,
    UnavailableBeforeStart,
    Available,
    Completed,
}

impl DayStatus {
    pub fn is_playable(self) -> bool {
        matches!(self, DayStatus::Available | DayStatus::Completed)
    }
}

pub fn day_status(
    date: NaiveDate,
    catalog_start: Option<NaiveDate>,
    today: NaiveDate,
    store: &dyn CompletionStore,
) -> DayStatus {
    if date > today {
        return DayStatus::Future;
    }
    match catalog_start {
        Some(start) if date >= start => {}
        _ => return DayStatus::UnavailableBeforeStart,
    }
    if store.is_completed(date) {
        DayStatus::Completed
    } else {
        DayStatus::Available
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub status: DayStatus,
}

/// One month laid out in Monday-first weeks; `None` pads the first and last week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<Vec<Option<CalendarDay>>>,
}

impl CalendarMonth {
    pub fn days(&self) -> impl Iterator<Item = &CalendarDay> {
        self.weeks.iter().flatten().flatten()
    }

    pub fn title(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_default()
    }
}

pub fn month_days(year: i32, month: u32) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .collect()
}

pub fn calendar_month(
    year: i32,
    month: u32,
    catalog_start: Option<NaiveDate>,
    today: NaiveDate,
    store: &dyn CompletionStore,
) -> Option<CalendarMonth> {
    let days = month_days(year, month);
    let first = *days.first()?;
    let leading = first.weekday().num_days_from_monday() as usize;

    let mut cells: Vec<Option<CalendarDay>> = vec![None; leading];
    cells.extend(days.into_iter().map(|date| {
        Some(CalendarDay {
            date,
            status: day_status(date, catalog_start, today, store),
        })
    }));
    while cells.len() % 7 != 0 {
        cells.push(None);
    }

    let weeks = cells
        .into_iter()
        .chunks(7)
        .into_iter()
        .map(|week| week.collect())
        .collect();

    Some(CalendarMonth { year, month, weeks })
}

/// `(year, month)` moved by `delta` months.
pub fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Clamp `(year, month)` between the catalog's first month and the current month.
pub fn clamp_month(
    year: i32,
    month: u32,
    catalog_start: Option<NaiveDate>,
    today: NaiveDate,
) -> (i32, u32) {
    let latest = (today.year(), today.month());
    let earliest = catalog_start
        .map(|d| (d.year(), d.month()))
        .unwrap_or(latest)
        .min(latest);
    (year, month).clamp(earliest, latest)
}

/// Move a calendar cursor by whole days, keeping it within the playable range.
pub fn step_day(cursor: NaiveDate, days: i64, catalog_start: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
    let moved = cursor + Duration::days(days);
    let earliest = catalog_start.unwrap_or(today).min(today);
    moved.clamp(earliest, today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{KvCompletionStore, MemoryKvStore};
    use assert_matches::assert_matches;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            PuzzleDefinition::new(date(2026, 10, 1), "piano", "has keys").unwrap(),
            PuzzleDefinition::new(date(2026, 10, 18), "llama", "andean").unwrap(),
            PuzzleDefinition::new(date(2026, 10, 19), "crane", "bird").unwrap(),
            PuzzleDefinition::new(date(2026, 10, 20), "sol", "star").unwrap(),
        ])
    }

    fn store() -> KvCompletionStore<MemoryKvStore> {
        KvCompletionStore::new(MemoryKvStore::new())
    }

    #[test]
    fn test_resolve_today() {
        let today = date(2026, 10, 19);
        let resolved = resolve(&catalog(), None, today, &store()).unwrap();
        assert_eq!(resolved.puzzle.word, "CRANE");
        assert!(!resolved.is_archive_mode);
        assert!(!resolved.already_completed);
    }

    #[test]
    fn test_resolve_archive_date() {
        let today = date(2026, 10, 19);
        let mut store = store();
        store.mark_completed(date(2026, 10, 18)).unwrap();

        let resolved = resolve(&catalog(), Some(date(2026, 10, 18)), today, &store).unwrap();
        assert!(resolved.is_archive_mode);
        assert!(resolved.already_completed);

        let explicit_today = resolve(&catalog(), Some(today), today, &store).unwrap();
        assert!(!explicit_today.is_archive_mode);
    }

    #[test]
    fn test_resolve_misses() {
        let today = date(2026, 10, 19);
        assert_eq!(
            resolve(&catalog(), Some(date(2026, 10, 5)), today, &store()),
            Err(ResolveError::NotFound(date(2026, 10, 5)))
        );
        assert_matches!(
            resolve(&catalog(), Some(date(2026, 10, 20)), today, &store()),
            Err(ResolveError::NotYetAvailable(_))
        );
        assert_matches!(
            resolve(&Catalog::default(), None, today, &store()),
            Err(ResolveError::NotFound(_))
        );
    }

    #[test]
    fn test_resolved_session_config() {
        let today = date(2026, 10, 19);
        let resolved = resolve(&catalog(), Some(date(2026, 10, 18)), today, &store()).unwrap();
        let config = resolved.session_config();
        assert_eq!(config.target_word, "LLAMA");
        assert_eq!(config.max_attempts, 6);
        assert!(config.is_archive_mode);
    }

    #[test]
    fn test_day_status() {
        let today = date(2026, 10, 19);
        let start = Some(date(2026, 10, 1));
        let mut store = store();
        store.mark_completed(date(2026, 10, 2)).unwrap();

        assert_eq!(day_status(date(2026, 10, 20), start, today, &store), DayStatus::Future);
        assert_eq!(
            day_status(date(2026, 9, 30), start, today, &store),
            DayStatus::UnavailableBeforeStart
        );
        assert_eq!(day_status(date(2026, 10, 2), start, today, &store), DayStatus::Completed);
        assert_eq!(day_status(today, start, today, &store), DayStatus::Available);
        assert_eq!(day_status(today, None, today, &store), DayStatus::UnavailableBeforeStart);
    }

    #[test]
    fn test_day_status_display() {
        assert_eq!(DayStatus::UnavailableBeforeStart.to_string(), "unavailable-before-start");
        assert_eq!(DayStatus::Future.to_string(), "future");
        assert!(DayStatus::Completed.is_playable());
        assert!(!DayStatus::Future.is_playable());
    }

    #[test]
    fn test_calendar_month_layout() {
        let today = date(2026, 10, 19);
        let month = calendar_month(2026, 10, Some(date(2026, 10, 1)), today, &store()).unwrap();
        // October 2026 starts on a Thursday.
        assert_eq!(month.weeks[0][..3], [None, None, None]);
        assert_eq!(month.weeks[0][3].unwrap().date, date(2026, 10, 1));
        assert!(month.weeks.iter().all(|w| w.len() == 7));
        assert_eq!(month.days().count(), 31);
        assert_eq!(month.title(), "October 2026");

        let future = month.days().filter(|d| d.status == DayStatus::Future).count();
        assert_eq!(future, 12);
    }

    #[test]
    fn test_month_days_lengths() {
        assert_eq!(month_days(2028, 2).len(), 29);
        assert_eq!(month_days(2026, 2).len(), 28);
        assert!(month_days(2026, 13).is_empty());
    }

    #[test]
    fn test_shift_and_clamp_month() {
        assert_eq!(shift_month(2026, 1, -1), (2025, 12));
        assert_eq!(shift_month(2026, 12, 1), (2027, 1));
        assert_eq!(shift_month(2026, 10, -22), (2024, 12));

        let today = date(2026, 10, 19);
        let start = Some(date(2026, 8, 15));
        assert_eq!(clamp_month(2026, 11, start, today), (2026, 10));
        assert_eq!(clamp_month(2026, 7, start, today), (2026, 8));
        assert_eq!(clamp_month(2026, 9, start, today), (2026, 9));
        assert_eq!(clamp_month(2020, 1, None, today), (2026, 10));
    }

    #[test]
    fn test_step_day_stays_in_range() {
        let today = date(2026, 10, 19);
        let start = Some(date(2026, 10, 1));
        assert_eq!(step_day(today, 1, start, today), today);
        assert_eq!(step_day(today, -7, start, today), date(2026, 10, 12));
        assert_eq!(step_day(date(2026, 10, 3), -7, start, today), date(2026, 10, 1));
    }
}
