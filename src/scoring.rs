//! Time-decaying puzzle score.
//!
//! The displayed score is `max(100, base + time_bonus)` where the base drops from
//! 600 to 500 once the hint has been used and the time bonus loses 10 points per
//! completed ten-second block, down to zero. [`ScoreKeeper`] layers the
//! running-score bookkeeping on top: a one-off hint deduction and a per-minute
//! charge, each applied to the running value before the tick's recompute
//! replaces it.

pub const INITIAL_SCORE: u32 = 1000;
pub const MIN_SCORE: u32 = 100;
pub const BASE_POINTS: u32 = 600;
pub const HINT_BASE_POINTS: u32 = 500;
pub const MAX_TIME_BONUS: u32 = 400;
pub const HINT_PENALTY: u32 = 100;
pub const MINUTE_PENALTY: u32 = 100;

pub fn time_bonus(elapsed_secs: u64) -> u32 {
    let decay = (elapsed_secs / 10).saturating_mul(10);
    u64::from(MAX_TIME_BONUS).saturating_sub(decay) as u32
}

/// Pure score for a given elapsed time and hint usage.
pub fn score(elapsed_secs: u64, hint_used: bool) -> u32 {
    let base = if hint_used {
        HINT_BASE_POINTS
    } else {
        BASE_POINTS
    };
    (base + time_bonus(elapsed_secs)).max(MIN_SCORE)
}

fn deduct(points: u32, amount: u64) -> u32 {
    let amount = amount.min(u64::from(u32::MAX)) as u32;
    points.saturating_sub(amount).max(MIN_SCORE)
}

/// Result of a single [`ScoreKeeper::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreTick {
    pub points: u32,
    /// Minute boundaries charged by this tick.
    pub minutes_charged: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreKeeper {
    points: u32,
    hint_used: bool,
    last_minute_bucket: u64,
    last_elapsed_secs: u64,
    frozen: bool,
}

impl Default for ScoreKeeper {
    fn default() -> Self {
        Self {
            points: INITIAL_SCORE,
            hint_used: false,
            last_minute_bucket: 0,
            last_elapsed_secs: 0,
            frozen: false,
        }
    }
}

impl ScoreKeeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> u32 {
        self.points
    }

    pub fn hint_used(&self) -> bool {
        self.hint_used
    }

    pub fn last_minute_bucket(&self) -> u64 {
        self.last_minute_bucket
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Advance the running score to `elapsed_secs` since the session started.
    ///
    /// Elapsed time never runs backwards here: a smaller value than one already
    /// seen is treated as the larger one, which keeps the score non-increasing.
    pub fn tick(&mut self, elapsed_secs: u64) -> ScoreTick {
        if self.frozen {
            return ScoreTick {
                points: self.points,
                minutes_charged: 0,
            };
        }

        let elapsed_secs = elapsed_secs.max(self.last_elapsed_secs);
        self.last_elapsed_secs = elapsed_secs;

        let minutes = elapsed_secs / 60;
        let mut minutes_charged = 0;
        if minutes > self.last_minute_bucket {
            minutes_charged = minutes - self.last_minute_bucket;
            self.points = deduct(
                self.points,
                minutes_charged.saturating_mul(u64::from(MINUTE_PENALTY)),
            );
            self.last_minute_bucket = minutes;
        }

        self.points = score(elapsed_secs, self.hint_used);

        ScoreTick {
            points: self.points,
            minutes_charged,
        }
    }

    /// Mark the hint as used and recompute. `deduct_points` is false for sessions
    /// that award no points. Returns false if the hint was already used or the
    /// score is frozen.
    pub fn use_hint(&mut self, elapsed_secs: u64, deduct_points: bool) -> bool {
        if self.hint_used || self.frozen {
            return false;
        }
        self.hint_used = true;
        if deduct_points {
            self.points = deduct(self.points, u64::from(HINT_PENALTY));
        }
        self.tick(elapsed_secs);
        true
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }
}
