use std::time::{Duration, SystemTime};

use assert_matches::assert_matches;
use chrono::NaiveDate;
use tempfile::tempdir;

use dailyword::catalog::Catalog;
use dailyword::checker::{AcceptAll, CheckError, DictionaryChecker, WordChecker};
use dailyword::evaluator::Verdict;
use dailyword::resolver::{resolve, ResolveError};
use dailyword::session::{Notice, Session, SessionEvent, Status};
use dailyword::stats::{CompletionStore, KvCompletionStore, SqliteKvStore, StatsOutcome};

const CATALOG: &str = r#"{
  "words": [
    { "date": "2026-10-17", "word": "sol", "hint": "our star" },
    { "date": "2026-10-18", "word": "llama", "hint": "woolly" },
    { "date": "2026-10-19", "word": "crane", "hint": "bird" },
    { "date": "2026-10-19", "word": "other", "hint": "shadowed by the first" },
    { "date": "2026-13-01", "word": "bogus", "hint": "bad date" },
    { "date": "2026-10-16", "word": "no way", "hint": "not letters" }
  ]
}"#;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

fn today() -> NaiveDate {
    date(19)
}

fn t0() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_792_000_000)
}

fn at(secs: u64) -> SystemTime {
    t0() + Duration::from_secs(secs)
}

fn start(
    catalog: &Catalog,
    requested: Option<NaiveDate>,
    store: &dyn CompletionStore,
) -> Session {
    resolve(catalog, requested, today(), store)
        .unwrap()
        .start_session(t0())
}

fn play(
    session: &mut Session,
    word: &str,
    store: &mut dyn CompletionStore,
    now: SystemTime,
) -> Vec<SessionEvent> {
    for c in word.chars() {
        session.add_letter(c);
    }
    session.submit_with(&AcceptAll, store, now)
}

#[test]
fn catalog_skips_bad_entries_and_keeps_first_duplicate() {
    let catalog = Catalog::from_json(CATALOG).unwrap();
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.get(today()).unwrap().word, "CRANE");
    assert_eq!(catalog.get(date(16)), None);
}

#[test]
fn daily_win_is_persisted_across_reopen() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("state").join("store.db");
    let catalog = Catalog::from_json(CATALOG).unwrap();

    {
        let mut store = KvCompletionStore::new(SqliteKvStore::open(&db).unwrap());
        let mut session = start(&catalog, None, &store);
        assert!(!session.config().is_archive_mode);

        play(&mut session, "slate", &mut store, at(5));
        let events = play(&mut session, "crane", &mut store, at(20));
        assert_eq!(session.status(), Status::Won);
        assert!(events.contains(&SessionEvent::Finished {
            status: Status::Won,
            score: 980,
            attempts: 2,
        }));
    }

    let mut store = KvCompletionStore::new(SqliteKvStore::open(&db).unwrap());
    let stats = store.read_stats();
    assert_eq!(stats.games_played, 1);
    assert_eq!(stats.games_won, 1);
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.total_points, 980);
    assert!(store.is_completed(today()));

    // Replaying a completed day awards nothing.
    let mut replay = start(&catalog, None, &store);
    assert!(replay.config().already_completed);
    let events = play(&mut replay, "crane", &mut store, at(3));
    assert!(events.contains(&SessionEvent::Notice(Notice::Congratulations)));
    assert!(events.contains(&SessionEvent::Notice(Notice::AlreadyCompletedNoPoints)));
    assert!(events.contains(&SessionEvent::StatsUpdated(StatsOutcome::NoPoints)));
    assert_eq!(store.read_stats(), stats);
}

#[test]
fn losing_a_completed_day_only_resets_streak() {
    let dir = tempdir().unwrap();
    let catalog = Catalog::from_json(CATALOG).unwrap();
    let mut store = KvCompletionStore::new(SqliteKvStore::open(dir.path().join("s.db")).unwrap());

    let mut first = start(&catalog, None, &store);
    play(&mut first, "crane", &mut store, at(1));
    let before = store.read_stats();

    let mut second = start(&catalog, None, &store);
    for _ in 0..6 {
        play(&mut second, "slate", &mut store, at(2));
    }
    assert_eq!(second.status(), Status::Lost);

    let after = store.read_stats();
    assert_eq!(after.current_streak, 0);
    assert_eq!(after.games_played, before.games_played);
    assert_eq!(after.games_won, before.games_won);
    assert_eq!(after.total_points, before.total_points);
}

#[test]
fn archive_play_never_touches_stats() {
    let catalog = Catalog::from_json(CATALOG).unwrap();
    let mut store = KvCompletionStore::new(SqliteKvStore::open_in_memory().unwrap());

    let mut session = start(&catalog, Some(date(18)), &store);
    assert!(session.config().is_archive_mode);

    let hint = session.use_hint(at(1));
    assert_eq!(hint[0], SessionEvent::HintRevealed("woolly".into()));
    assert!(session.hint_used());

    let events = play(&mut session, "llama", &mut store, at(10));
    assert!(events.contains(&SessionEvent::StatsUpdated(StatsOutcome::Archive)));
    assert_eq!(store.read_stats().games_played, 0);
    assert!(!store.is_completed(date(18)));
}

#[test]
fn future_and_missing_dates_do_not_resolve() {
    let catalog = Catalog::from_json(CATALOG).unwrap();
    let store = KvCompletionStore::new(SqliteKvStore::open_in_memory().unwrap());
    assert_matches!(
        resolve(&catalog, Some(date(20)), today(), &store),
        Err(ResolveError::NotYetAvailable(_))
    );
    assert_matches!(
        resolve(&catalog, Some(date(1)), today(), &store),
        Err(ResolveError::NotFound(_))
    );
}

#[test]
fn checker_failure_fails_open() {
    struct Offline;
    impl WordChecker for Offline {
        fn check(&self, _word: &str) -> Result<bool, CheckError> {
            Err(CheckError::Transport("dictionary unreachable".into()))
        }
    }

    let catalog = Catalog::from_json(CATALOG).unwrap();
    let mut store = KvCompletionStore::new(SqliteKvStore::open_in_memory().unwrap());
    let mut session = start(&catalog, None, &store);
    for c in "zzzzz".chars() {
        session.add_letter(c);
    }
    let events = session.submit_with(&Offline, &mut store, at(4));
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::RowScored { verdicts, .. } if verdicts == &vec![Verdict::Absent; 5])));
    assert_eq!(session.state().current_attempt, 1);
}

#[test]
fn split_submit_drops_stale_answers() {
    let catalog = Catalog::from_json(CATALOG).unwrap();
    let mut store = KvCompletionStore::new(SqliteKvStore::open_in_memory().unwrap());
    let dict = DictionaryChecker::from_text("crane\nslate");
    let mut session = start(&catalog, None, &store);

    for c in "slate".chars() {
        session.add_letter(c);
    }
    let events = session.submit_guess();
    assert!(events.contains(&SessionEvent::CheckRequested {
        word: "SLATE".into()
    }));
    assert!(session.is_checking());

    // Input and resubmits are ignored while the check is outstanding.
    assert!(session.delete_letter().is_empty());
    assert!(session.submit_guess().is_empty());

    let stale = session.resolve_check("CRANE", Ok(true), at(2), &mut store);
    assert!(stale.is_empty());
    assert!(session.is_checking());

    let answer = dict.check("SLATE");
    let events = session.resolve_check("SLATE", answer, at(2), &mut store);
    assert!(events
        .iter()
        .any(|e| matches!(e, SessionEvent::RowScored { row: 0, .. })));
    assert!(!session.is_checking());
}

#[test]
fn hint_then_win_scores_from_the_hint_base() {
    let catalog = Catalog::from_json(CATALOG).unwrap();
    let mut store = KvCompletionStore::new(SqliteKvStore::open_in_memory().unwrap());
    let mut session = start(&catalog, None, &store);

    session.use_hint(at(0));
    assert_eq!(session.score(), 900);
    play(&mut session, "crane", &mut store, at(125));
    assert_eq!(session.status(), Status::Won);
    assert_eq!(session.score(), 780);
    assert_eq!(store.read_stats().total_points, 780);
}
