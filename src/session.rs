//! One attempt at one dated puzzle, from the first letter to a win or loss.
//!
//! Every operation is a state transition that returns the [`SessionEvent`]s it
//! produced; rendering happens elsewhere. The dictionary check is split in two
//! halves ([`Session::submit_guess`] requests it, [`Session::resolve_check`]
//! applies the answer) so the caller decides where the check runs.

use std::fmt;
use std::time::SystemTime;

use chrono::NaiveDate;

use crate::catalog::PuzzleDefinition;
use crate::checker::{self, CheckError, WordChecker};
use crate::evaluator::{evaluate, KeyboardState, Verdict};
use crate::runtime::TimerHandle;
use crate::scoring::ScoreKeeper;
use crate::stats::{record_outcome, CompletionStore, StatsOutcome};
use crate::util::elapsed_secs;

/// Guesses allowed for a word of `word_len` letters.
pub fn max_attempts_for(word_len: usize) -> usize {
    match word_len {
        0..=3 => 8,
        4 => 7,
        _ => 6,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub date: NaiveDate,
    pub target_word: String,
    pub hint: String,
    pub max_attempts: usize,
    pub is_archive_mode: bool,
    pub already_completed: bool,
    target: Vec<char>,
}

impl SessionConfig {
    pub fn new(puzzle: &PuzzleDefinition, is_archive_mode: bool, already_completed: bool) -> Self {
        let target_word = puzzle.word.to_uppercase();
        let target: Vec<char> = target_word.chars().collect();
        Self {
            date: puzzle.date,
            max_attempts: max_attempts_for(target.len()),
            hint: puzzle.hint.clone(),
            target_word,
            is_archive_mode,
            already_completed,
            target,
        }
    }

    pub fn target(&self) -> &[char] {
        &self.target
    }

    pub fn word_len(&self) -> usize {
        self.target.len()
    }

    /// Archive and replayed sessions are played for fun only.
    pub fn awards_points(&self) -> bool {
        !self.is_archive_mode && !self.already_completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Status {
    InProgress,
    Won,
    Lost,
}

/// Transient message for the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    IncompleteWord,
    Checking,
    WordNotFound,
    Congratulations,
    WordWas(String),
    AlreadyCompletedNoPoints,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::IncompleteWord => write!(f, "incomplete word"),
            Notice::Checking => write!(f, "checking…"),
            Notice::WordNotFound => write!(f, "word not found"),
            Notice::Congratulations => write!(f, "congratulations"),
            Notice::WordWas(word) => write!(f, "the word was {word}"),
            Notice::AlreadyCompletedNoPoints => write!(f, "already completed — no points"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    LetterPlaced {
        row: usize,
        column: usize,
        letter: char,
    },
    LetterCleared {
        row: usize,
        column: usize,
    },
    /// The full row must be checked against the dictionary.
    CheckRequested {
        word: String,
    },
    RowScored {
        row: usize,
        letters: Vec<char>,
        verdicts: Vec<Verdict>,
    },
    HintRevealed(String),
    ScoreChanged(u32),
    ClockChanged(u64),
    Notice(Notice),
    Finished {
        status: Status,
        score: u32,
        attempts: usize,
    },
    StatsUpdated(StatsOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub letters: Vec<Option<char>>,
    pub verdicts: Option<Vec<Verdict>>,
}

impl Row {
    fn empty(len: usize) -> Self {
        Self {
            letters: vec![None; len],
            verdicts: None,
        }
    }

    pub fn is_full(&self) -> bool {
        self.letters.iter().all(Option::is_some)
    }

    pub fn word(&self) -> String {
        self.letters.iter().flatten().collect()
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub current_attempt: usize,
    pub current_column: usize,
    pub rows: Vec<Row>,
    pub status: Status,
    pub started_at: SystemTime,
    pub elapsed_secs: u64,
    pub score: ScoreKeeper,
    pub pending_check: Option<String>,
    pub keyboard: KeyboardState,
}

impl SessionState {
    fn new(config: &SessionConfig, started_at: SystemTime) -> Self {
        Self {
            current_attempt: 0,
            current_column: 0,
            rows: (0..config.max_attempts)
                .map(|_| Row::empty(config.word_len()))
                .collect(),
            status: Status::InProgress,
            started_at,
            elapsed_secs: 0,
            score: ScoreKeeper::new(),
            pending_check: None,
            keyboard: KeyboardState::new(),
        }
    }
}

#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    timer: Option<TimerHandle>,
}

impl Session {
    pub fn new(config: SessionConfig, started_at: SystemTime) -> Self {
        let state = SessionState::new(&config, started_at);
        log::info!(
            "session started for {} ({} letters, {} attempts, archive={}, completed={})",
            config.date,
            config.word_len(),
            config.max_attempts,
            config.is_archive_mode,
            config.already_completed
        );
        Self {
            config,
            state,
            timer: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn is_finished(&self) -> bool {
        self.state.status != Status::InProgress
    }

    pub fn score(&self) -> u32 {
        self.state.score.points()
    }

    pub fn hint_used(&self) -> bool {
        self.state.score.hint_used()
    }

    pub fn is_checking(&self) -> bool {
        self.state.pending_check.is_some()
    }

    /// Rows actually committed so far.
    pub fn attempts_used(&self) -> usize {
        self.state
            .rows
            .iter()
            .filter(|row| row.verdicts.is_some())
            .count()
    }

    /// Hand the session its tick timer. A finished session cancels it at once.
    pub fn attach_timer(&mut self, mut timer: TimerHandle) {
        if self.is_finished() {
            timer.cancel();
        }
        if let Some(mut previous) = self.timer.replace(timer) {
            previous.cancel();
        }
    }

    pub fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.cancel();
        }
    }

    pub fn timer_running(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    fn accepts_input(&self) -> bool {
        self.state.status == Status::InProgress && self.state.pending_check.is_none()
    }

    pub fn add_letter(&mut self, letter: char) -> Vec<SessionEvent> {
        if !self.accepts_input()
            || self.state.current_column >= self.config.word_len()
            || !letter.is_alphabetic()
        {
            return Vec::new();
        }
        let Some(letter) = letter.to_uppercase().next() else {
            return Vec::new();
        };

        let row = self.state.current_attempt;
        let column = self.state.current_column;
        self.state.rows[row].letters[column] = Some(letter);
        self.state.current_column += 1;

        vec![SessionEvent::LetterPlaced { row, column, letter }]
    }

    pub fn delete_letter(&mut self) -> Vec<SessionEvent> {
        if !self.accepts_input() || self.state.current_column == 0 {
            return Vec::new();
        }

        self.state.current_column -= 1;
        let row = self.state.current_attempt;
        let column = self.state.current_column;
        self.state.rows[row].letters[column] = None;

        vec![SessionEvent::LetterCleared { row, column }]
    }

    pub fn use_hint(&mut self, now: SystemTime) -> Vec<SessionEvent> {
        if self.state.status != Status::InProgress || self.state.score.hint_used() {
            return Vec::new();
        }

        let before = self.state.score.points();
        let elapsed = self.advance_clock(now);
        self.state
            .score
            .use_hint(elapsed, self.config.awards_points());
        log::info!("hint used for {}", self.config.date);

        let mut events = vec![SessionEvent::HintRevealed(self.config.hint.clone())];
        if self.state.score.points() != before {
            events.push(SessionEvent::ScoreChanged(self.state.score.points()));
        }
        events
    }

    /// Request a dictionary check for the current row.
    ///
    /// An incomplete row is rejected with a notice. While a check is pending,
    /// further submits are ignored.
    pub fn submit_guess(&mut self) -> Vec<SessionEvent> {
        if self.state.status != Status::InProgress || self.state.pending_check.is_some() {
            return Vec::new();
        }
        if self.state.current_column != self.config.word_len() {
            return vec![SessionEvent::Notice(Notice::IncompleteWord)];
        }

        let word = self.state.rows[self.state.current_attempt].word();
        self.state.pending_check = Some(word.clone());
        vec![
            SessionEvent::Notice(Notice::Checking),
            SessionEvent::CheckRequested { word },
        ]
    }

    /// Apply the answer to a check requested by [`Session::submit_guess`].
    ///
    /// Answers for any word other than the pending one are dropped. A failed
    /// check counts as a valid word.
    pub fn resolve_check(
        &mut self,
        word: &str,
        result: Result<bool, CheckError>,
        now: SystemTime,
        store: &mut dyn CompletionStore,
    ) -> Vec<SessionEvent> {
        if self.state.pending_check.as_deref() != Some(word) {
            log::debug!("dropping check result for {word}: not pending");
            return Vec::new();
        }
        self.state.pending_check = None;

        if !checker::accepts(&result) {
            log::debug!("rejected guess {word}");
            return vec![SessionEvent::Notice(Notice::WordNotFound)];
        }

        self.commit_row(now, store)
    }

    /// Submit and resolve in one step with a checker called inline.
    pub fn submit_with(
        &mut self,
        checker: &dyn WordChecker,
        store: &mut dyn CompletionStore,
        now: SystemTime,
    ) -> Vec<SessionEvent> {
        let mut events = self.submit_guess();
        let requested = events.iter().find_map(|event| match event {
            SessionEvent::CheckRequested { word } => Some(word.clone()),
            _ => None,
        });
        if let Some(word) = requested {
            let result = checker.check(&word);
            events.extend(self.resolve_check(&word, result, now, store));
        }
        events
    }

    pub fn on_tick(&mut self, now: SystemTime) -> Vec<SessionEvent> {
        if self.state.status != Status::InProgress {
            return Vec::new();
        }
        let mut events = Vec::new();
        self.tick_into(now, &mut events);
        events
    }

    fn advance_clock(&mut self, now: SystemTime) -> u64 {
        let elapsed = elapsed_secs(self.state.started_at, now).max(self.state.elapsed_secs);
        self.state.elapsed_secs = elapsed;
        elapsed
    }

    fn tick_into(&mut self, now: SystemTime, events: &mut Vec<SessionEvent>) {
        let previous_elapsed = self.state.elapsed_secs;
        let previous_points = self.state.score.points();

        let elapsed = self.advance_clock(now);
        let tick = self.state.score.tick(elapsed);
        if tick.minutes_charged > 0 {
            log::debug!(
                "charged {} minute(s) at {elapsed}s for {}",
                tick.minutes_charged,
                self.config.date
            );
        }

        if elapsed != previous_elapsed {
            events.push(SessionEvent::ClockChanged(elapsed));
        }
        if tick.points != previous_points {
            events.push(SessionEvent::ScoreChanged(tick.points));
        }
    }

    fn commit_row(&mut self, now: SystemTime, store: &mut dyn CompletionStore) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        self.tick_into(now, &mut events);

        let row = self.state.current_attempt;
        let letters: Vec<char> = self.state.rows[row].letters.iter().flatten().copied().collect();
        let verdicts = evaluate(self.config.target(), &letters);

        self.state.rows[row].verdicts = Some(verdicts.clone());
        self.state.keyboard.record_row(&letters, &verdicts);
        events.push(SessionEvent::RowScored {
            row,
            letters: letters.clone(),
            verdicts,
        });

        if letters.as_slice() == self.config.target() {
            self.finish(Status::Won, store, &mut events);
        } else if row + 1 >= self.config.max_attempts {
            self.finish(Status::Lost, store, &mut events);
        } else {
            self.state.current_attempt += 1;
            self.state.current_column = 0;
        }

        events
    }

    fn finish(
        &mut self,
        status: Status,
        store: &mut dyn CompletionStore,
        events: &mut Vec<SessionEvent>,
    ) {
        self.state.status = status;
        self.state.score.freeze();
        self.cancel_timer();

        let score = self.state.score.points();
        let attempts = self.attempts_used();
        log::info!(
            "session for {} finished: {status} after {attempts} attempt(s), score {score}",
            self.config.date
        );
        events.push(SessionEvent::Finished {
            status,
            score,
            attempts,
        });

        let won = status == Status::Won;
        events.push(SessionEvent::Notice(if won {
            Notice::Congratulations
        } else {
            Notice::WordWas(self.config.target_word.clone())
        }));

        match record_outcome(
            store,
            self.config.date,
            self.config.is_archive_mode,
            self.config.already_completed,
            won,
            score,
        ) {
            Ok(outcome) => {
                if outcome == StatsOutcome::NoPoints {
                    events.push(SessionEvent::Notice(Notice::AlreadyCompletedNoPoints));
                }
                events.push(SessionEvent::StatsUpdated(outcome));
            }
            Err(err) => log::error!("failed to record result for {}: {err}", self.config.date),
        }
    }
}
