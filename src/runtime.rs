use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::checker::{CheckError, WordChecker};

/// Unified event type consumed by the app runner.
///
/// Timer ticks and check results carry the generation of the session that asked
/// for them, so anything arriving after that session was replaced can be dropped.
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    Resize,
    Tick {
        generation: u64,
    },
    WordChecked {
        generation: u64,
        word: String,
        result: Result<bool, CheckError>,
    },
    /// Nothing arrived within the poll interval.
    Idle,
}

/// Source of game events (keyboard, timers, background checks).
pub trait GameEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError>;
}

/// Event source fed through an mpsc channel. Production code and tests share it;
/// they only differ in who holds the senders.
pub struct ChannelEventSource {
    rx: Receiver<GameEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl GameEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

pub fn event_channel() -> (Sender<GameEvent>, ChannelEventSource) {
    let (tx, rx) = mpsc::channel();
    (tx, ChannelEventSource::new(rx))
}

/// Forward crossterm key and resize events into `tx` from a background thread.
pub fn spawn_terminal_reader(tx: Sender<GameEvent>) {
    thread::spawn(move || loop {
        let forwarded = match event::read() {
            Ok(CtEvent::Key(key)) => tx.send(GameEvent::Key(key)),
            Ok(CtEvent::Resize(_, _)) => tx.send(GameEvent::Resize),
            Ok(_) => Ok(()),
            Err(err) => {
                log::error!("terminal input failed: {err}");
                break;
            }
        };
        if forwarded.is_err() {
            break;
        }
    });
}

/// Configurable poll interval.
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Runner that advances the application one event at a time
pub struct Runner<E: GameEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: GameEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to the poll interval and returns the next event, or Idle on timeout
    pub fn step(&self) -> GameEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                GameEvent::Idle
            }
        }
    }
}

/// Periodic tick source for one session.
///
/// Once [`TimerHandle::cancel`] returns no further tick is sent. Dropping the
/// handle cancels it.
#[derive(Debug)]
pub struct TimerHandle {
    cancelled: Arc<Mutex<bool>>,
    generation: u64,
}

impl TimerHandle {
    pub fn start(interval: Duration, tx: Sender<GameEvent>, generation: u64) -> Self {
        let cancelled = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&cancelled);

        thread::spawn(move || loop {
            thread::sleep(interval);
            let stopped = flag.lock().unwrap_or_else(PoisonError::into_inner);
            if *stopped || tx.send(GameEvent::Tick { generation }).is_err() {
                break;
            }
        });

        Self {
            cancelled,
            generation,
        }
    }

    pub fn cancel(&mut self) {
        let mut stopped = self.cancelled.lock().unwrap_or_else(PoisonError::into_inner);
        if !*stopped {
            log::debug!("tick timer for generation {} cancelled", self.generation);
        }
        *stopped = true;
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Run `checker` on a background thread and post the answer back as an event.
pub fn spawn_check(
    checker: Arc<dyn WordChecker>,
    word: String,
    generation: u64,
    tx: Sender<GameEvent>,
) {
    thread::spawn(move || {
        let result = checker.check(&word);
        let _ = tx.send(GameEvent::WordChecked {
            generation,
            word,
            result,
        });
    });
}
