use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::{Datelike, Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::catalog::Catalog;
use crate::checker::WordChecker;
use crate::config::DEFAULT_TICK_MS;
use crate::history::{HistoryLog, HistoryRecord};
use crate::resolver::{
    calendar_month, clamp_month, day_status, resolve, shift_month, step_day, CalendarMonth,
    ResolveError,
};
use crate::runtime::{spawn_check, GameEvent, TimerHandle};
use crate::session::{Notice, Session, SessionEvent};
use crate::stats::{AggregateStats, CompletionStore, StatsOutcome};

/// How long a notice stays up, except "checking…" which waits for the answer.
pub const NOTICE_TTL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Playing,
    Calendar,
    /// No puzzle could be opened for today.
    NoPuzzle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ShownNotice {
    text: String,
    shown_at: SystemTime,
    sticky: bool,
}

/// Owns the catalog, the store, the checker and whichever session is open.
pub struct App {
    catalog: Catalog,
    store: Box<dyn CompletionStore>,
    checker: Arc<dyn WordChecker>,
    history: Option<HistoryLog>,
    events: Sender<GameEvent>,
    tick_interval: Duration,
    generation: u64,
    today: NaiveDate,
    state: AppState,
    session: Option<Session>,
    unavailable: Option<ResolveError>,
    notice: Option<ShownNotice>,
    revealed_hint: Option<String>,
    calendar_cursor: NaiveDate,
    calendar_month: (i32, u32),
    stats: AggregateStats,
    last_outcome: Option<StatsOutcome>,
}

impl App {
    pub fn new(
        catalog: Catalog,
        store: Box<dyn CompletionStore>,
        checker: Arc<dyn WordChecker>,
        events: Sender<GameEvent>,
        today: NaiveDate,
    ) -> Self {
        let stats = store.read_stats();
        Self {
            catalog,
            store,
            checker,
            history: None,
            events,
            tick_interval: Duration::from_millis(DEFAULT_TICK_MS),
            generation: 0,
            today,
            state: AppState::NoPuzzle,
            session: None,
            unavailable: None,
            notice: None,
            revealed_hint: None,
            calendar_cursor: today,
            calendar_month: (today.year(), today.month()),
            stats,
            last_outcome: None,
        }
    }

    pub fn with_history(mut self, history: HistoryLog) -> Self {
        self.history = Some(history);
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stats(&self) -> AggregateStats {
        self.stats
    }

    pub fn last_outcome(&self) -> Option<StatsOutcome> {
        self.last_outcome
    }

    pub fn unavailable(&self) -> Option<&ResolveError> {
        self.unavailable.as_ref()
    }

    pub fn revealed_hint(&self) -> Option<&str> {
        self.revealed_hint.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_ref().map(|n| n.text.as_str())
    }

    pub fn calendar_cursor(&self) -> NaiveDate {
        self.calendar_cursor
    }

    pub fn calendar(&self) -> Option<CalendarMonth> {
        let (year, month) = self.calendar_month;
        calendar_month(
            year,
            month,
            self.catalog.earliest_date(),
            self.today,
            self.store.as_ref(),
        )
    }

    /// Open the puzzle for `date` (today when `None`), replacing the current session.
    ///
    /// On failure the current session is kept, unless it was today's that
    /// failed to open, in which case the app shows the no-puzzle placeholder.
    pub fn open_date(
        &mut self,
        date: Option<NaiveDate>,
        now: SystemTime,
    ) -> Result<(), ResolveError> {
        let resolved = match resolve(&self.catalog, date, self.today, self.store.as_ref()) {
            Ok(resolved) => resolved,
            Err(err) => {
                log::info!("cannot open puzzle: {err}");
                if self.session.is_none() {
                    self.state = AppState::NoPuzzle;
                    self.unavailable = Some(err.clone());
                }
                return Err(err);
            }
        };

        if let Some(old) = self.session.as_mut() {
            old.cancel_timer();
        }
        self.generation += 1;

        let mut session = resolved.start_session(now);
        session.attach_timer(TimerHandle::start(
            self.tick_interval,
            self.events.clone(),
            self.generation,
        ));
        self.session = Some(session);
        self.state = AppState::Playing;
        self.unavailable = None;
        self.notice = None;
        self.revealed_hint = None;
        self.last_outcome = None;
        Ok(())
    }

    pub fn handle_event(&mut self, event: GameEvent) -> Control {
        self.handle_event_at(event, SystemTime::now())
    }

    pub fn handle_event_at(&mut self, event: GameEvent, now: SystemTime) -> Control {
        match event {
            GameEvent::Key(key) => {
                let control = self.on_key(key, now);
                self.expire_notice(now);
                control
            }
            GameEvent::Tick { generation } => {
                if generation != self.generation {
                    log::debug!("dropping tick from generation {generation}");
                } else if let Some(session) = self.session.as_mut() {
                    let events = session.on_tick(now);
                    self.apply(events, now);
                }
                self.expire_notice(now);
                Control::Continue
            }
            GameEvent::WordChecked {
                generation,
                word,
                result,
            } => {
                if generation != self.generation {
                    log::debug!("dropping check of {word} from generation {generation}");
                    return Control::Continue;
                }
                if self.notice.as_ref().is_some_and(|n| n.sticky) {
                    self.notice = None;
                }
                if let Some(session) = self.session.as_mut() {
                    let events = session.resolve_check(&word, result, now, self.store.as_mut());
                    self.apply(events, now);
                }
                Control::Continue
            }
            GameEvent::Resize | GameEvent::Idle => {
                self.expire_notice(now);
                Control::Continue
            }
        }
    }

    pub fn expire_notice(&mut self, now: SystemTime) {
        let expired = self.notice.as_ref().is_some_and(|n| {
            !n.sticky && now.duration_since(n.shown_at).unwrap_or_default() >= NOTICE_TTL
        });
        if expired {
            self.notice = None;
        }
    }

    fn show_notice(&mut self, text: String, sticky: bool, now: SystemTime) {
        self.notice = Some(ShownNotice {
            text,
            shown_at: now,
            sticky,
        });
    }

    fn on_key(&mut self, key: KeyEvent, now: SystemTime) -> Control {
        if key.kind == KeyEventKind::Release {
            return Control::Continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Control::Quit;
        }

        match self.state {
            AppState::Playing | AppState::NoPuzzle => self.on_game_key(key, now),
            AppState::Calendar => {
                self.on_calendar_key(key, now);
                Control::Continue
            }
        }
    }

    fn on_game_key(&mut self, key: KeyEvent, now: SystemTime) -> Control {
        match key.code {
            KeyCode::Esc => return Control::Quit,
            KeyCode::F(2) => {
                self.open_calendar();
                return Control::Continue;
            }
            _ => {}
        }

        let Some(session) = self.session.as_mut() else {
            return Control::Continue;
        };
        let events = match key.code {
            KeyCode::Char(c) => session.add_letter(c),
            KeyCode::Backspace => session.delete_letter(),
            KeyCode::Enter => session.submit_guess(),
            KeyCode::Tab => session.use_hint(now),
            _ => Vec::new(),
        };
        self.apply(events, now);
        Control::Continue
    }

    pub fn open_calendar(&mut self) {
        self.calendar_cursor = self
            .session
            .as_ref()
            .map(|s| s.config().date)
            .unwrap_or(self.today);
        self.sync_calendar_month();
        self.state = AppState::Calendar;
    }

    fn close_calendar(&mut self) {
        self.state = if self.session.is_some() {
            AppState::Playing
        } else {
            AppState::NoPuzzle
        };
    }

    fn sync_calendar_month(&mut self) {
        self.calendar_month = (self.calendar_cursor.year(), self.calendar_cursor.month());
    }

    fn move_cursor(&mut self, days: i64) {
        self.calendar_cursor = step_day(
            self.calendar_cursor,
            days,
            self.catalog.earliest_date(),
            self.today,
        );
        self.sync_calendar_month();
    }

    fn move_month(&mut self, delta: i32) {
        let start = self.catalog.earliest_date();
        let (year, month) = self.calendar_month;
        let (year, month) = shift_month(year, month, delta);
        let (year, month) = clamp_month(year, month, start, self.today);

        let day = self.calendar_cursor.day();
        let cursor = (1..=day)
            .rev()
            .find_map(|d| NaiveDate::from_ymd_opt(year, month, d))
            .unwrap_or(self.calendar_cursor);
        self.calendar_cursor = step_day(cursor, 0, start, self.today);
        self.sync_calendar_month();
    }

    fn on_calendar_key(&mut self, key: KeyEvent, now: SystemTime) {
        match key.code {
            KeyCode::Left => self.move_cursor(-1),
            KeyCode::Right => self.move_cursor(1),
            KeyCode::Up => self.move_cursor(-7),
            KeyCode::Down => self.move_cursor(7),
            KeyCode::PageUp => self.move_month(-1),
            KeyCode::PageDown => self.move_month(1),
            KeyCode::Char('t') => {
                self.calendar_cursor = self.today;
                self.sync_calendar_month();
            }
            KeyCode::Enter => self.select_calendar_day(now),
            KeyCode::Esc | KeyCode::Char('b') => self.close_calendar(),
            _ => {}
        }
    }

    fn select_calendar_day(&mut self, now: SystemTime) {
        let date = self.calendar_cursor;
        let status = day_status(
            date,
            self.catalog.earliest_date(),
            self.today,
            self.store.as_ref(),
        );
        if !status.is_playable() {
            self.show_notice(format!("{date} is {status}"), false, now);
            return;
        }
        if let Err(err) = self.open_date(Some(date), now) {
            self.show_notice(err.to_string(), false, now);
        }
    }

    fn apply(&mut self, events: Vec<SessionEvent>, now: SystemTime) {
        let mut notices: Vec<Notice> = Vec::new();

        for event in events {
            match event {
                SessionEvent::CheckRequested { word } => spawn_check(
                    Arc::clone(&self.checker),
                    word,
                    self.generation,
                    self.events.clone(),
                ),
                SessionEvent::HintRevealed(hint) => self.revealed_hint = Some(hint),
                SessionEvent::Notice(notice) => notices.push(notice),
                SessionEvent::Finished { .. } => self.append_history(),
                SessionEvent::StatsUpdated(outcome) => {
                    self.last_outcome = Some(outcome);
                    self.stats = self.store.read_stats();
                }
                _ => {}
            }
        }

        if !notices.is_empty() {
            let sticky = notices.iter().all(|n| *n == Notice::Checking);
            let text = notices
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" · ");
            self.show_notice(text, sticky, now);
        }
    }

    fn append_history(&self) {
        let (Some(history), Some(session)) = (self.history.as_ref(), self.session.as_ref()) else {
            return;
        };
        let config = session.config();
        let state = session.state();
        let record = HistoryRecord::new(
            Local::now(),
            config.date,
            &config.target_word,
            state.status,
            session.attempts_used(),
            state.elapsed_secs,
            session.score(),
            session.hint_used(),
            config.is_archive_mode,
        );
        if let Err(err) = history.append(&record) {
            log::error!("failed to append to {}: {err}", history.path().display());
        }
    }
}
