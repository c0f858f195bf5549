use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Feedback for a single guessed letter.
///
/// Variants are ordered by strength so keyboard state can only upgrade.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
pub enum Verdict {
    Absent,
    Present,
    Correct,
}

/// Score `guess` against `target`, one verdict per position.
///
/// Exact matches are fixed first and consume their target letter. Remaining
/// guess letters then consume the leftmost unconsumed occurrence in the target,
/// so a repeated letter is never credited more times than it is still available.
///
/// Both slices must have the same length; use [`evaluate_words`] when that is not
/// already guaranteed.
pub fn evaluate(target: &[char], guess: &[char]) -> Vec<Verdict> {
    debug_assert_eq!(target.len(), guess.len());

    let mut remaining: Vec<Option<char>> = target.iter().copied().map(Some).collect();
    let mut verdicts = vec![Verdict::Absent; guess.len()];

    for (i, (&letter, slot)) in guess.iter().zip(remaining.iter_mut()).enumerate() {
        if *slot == Some(letter) {
            verdicts[i] = Verdict::Correct;
            *slot = None;
        }
    }

    for (i, &letter) in guess.iter().enumerate() {
        if verdicts[i] == Verdict::Correct {
            continue;
        }
        if let Some(slot) = remaining.iter_mut().find(|slot| **slot == Some(letter)) {
            *slot = None;
            verdicts[i] = Verdict::Present;
        }
    }

    verdicts
}

/// String front-end for [`evaluate`]. Compares case-insensitively and returns
/// `None` when the words differ in length.
pub fn evaluate_words(target: &str, guess: &str) -> Option<Vec<Verdict>> {
    let target: Vec<char> = target.to_uppercase().chars().collect();
    let guess: Vec<char> = guess.to_uppercase().chars().collect();
    if target.len() != guess.len() {
        return None;
    }
    Some(evaluate(&target, &guess))
}

/// Best verdict seen so far for every letter guessed in a session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyboardState {
    letters: BTreeMap<char, Verdict>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one scored row into the keyboard. Returns the letters whose state changed.
    pub fn record_row(&mut self, guess: &[char], verdicts: &[Verdict]) -> Vec<char> {
        let mut changed = Vec::new();
        for (&letter, &verdict) in guess.iter().zip(verdicts) {
            if self.record(letter, verdict) && !changed.contains(&letter) {
                changed.push(letter);
            }
        }
        changed
    }

    /// Upgrade-only update. Returns true when the stored state changed.
    pub fn record(&mut self, letter: char, verdict: Verdict) -> bool {
        match self.letters.get(&letter) {
            Some(existing) if *existing >= verdict => false,
            _ => {
                self.letters.insert(letter, verdict);
                true
            }
        }
    }

    pub fn get(&self, letter: char) -> Option<Verdict> {
        self.letters.get(&letter).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }
}
