//! Decision sources for the simulated PK opponent.

use std::collections::VecDeque;

use rand::rngs::ThreadRng;
use rand::Rng;

use super::PkQuestion;

/// Probability that the default simulated opponent answers correctly.
pub const DEFAULT_OPPONENT_ACCURACY: f64 = 0.6;

/// Decides whether the simulated opponent gets a question right.
pub trait OpponentModel {
    fn answers_correctly(&mut self, question: &PkQuestion) -> bool;
}

/// Opponent that answers correctly with a fixed probability.
#[derive(Debug, Clone)]
pub struct CoinFlipOpponent<R = ThreadRng> {
    accuracy: f64,
    rng: R,
}

impl CoinFlipOpponent<ThreadRng> {
    pub fn new(accuracy: f64) -> Self {
        Self::with_rng(accuracy, rand::thread_rng())
    }
}

impl Default for CoinFlipOpponent<ThreadRng> {
    fn default() -> Self {
        Self::new(DEFAULT_OPPONENT_ACCURACY)
    }
}

impl<R: Rng> CoinFlipOpponent<R> {
    /// Accuracy is clamped to `[0, 1]`; non-finite values fall back to the default.
    pub fn with_rng(accuracy: f64, rng: R) -> Self {
        let accuracy = if accuracy.is_finite() {
            accuracy.clamp(0.0, 1.0)
        } else {
            DEFAULT_OPPONENT_ACCURACY
        };
        Self { accuracy, rng }
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }
}

impl<R: Rng> OpponentModel for CoinFlipOpponent<R> {
    fn answers_correctly(&mut self, _question: &PkQuestion) -> bool {
        self.rng.gen_bool(self.accuracy)
    }
}

/// Opponent replaying a fixed script of outcomes, then a fallback.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOpponent {
    script: VecDeque<bool>,
    fallback: bool,
}

impl ScriptedOpponent {
    pub fn new(script: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback: false,
        }
    }

    /// Opponent that always gives the same outcome.
    pub fn always(correct: bool) -> Self {
        Self {
            script: VecDeque::new(),
            fallback: correct,
        }
    }

    /// Number of scripted outcomes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl OpponentModel for ScriptedOpponent {
    fn answers_correctly(&mut self, _question: &PkQuestion) -> bool {
        self.script.pop_front().unwrap_or(self.fallback)
    }
}
