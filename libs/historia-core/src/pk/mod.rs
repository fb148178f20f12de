//! PK (head-to-head quiz) match state machine.
//!
//! A match is `ongoing` from creation until `finish_match` moves it to
//! `completed`; nothing leaves `completed`. Each party owns one answer slot per
//! question, filled either by their own submission or by the simulated
//! opponent, so neither score can exceed the number of questions.

pub mod opponent;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MatchError;

pub use opponent::{CoinFlipOpponent, OpponentModel, ScriptedOpponent, DEFAULT_OPPONENT_ACCURACY};

/// Questions per match unless configured otherwise.
pub const DEFAULT_QUESTION_COUNT: usize = 5;

/// Snapshot of a catalog question frozen into a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkQuestion {
    pub id: String,
    pub content: String,
    pub options: Vec<String>,
    #[serde(alias = "correctAnswer")]
    pub correct_answer: usize,
    #[serde(alias = "lessonTitle")]
    pub lesson_title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Ongoing,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ongoing" => Some(Self::Ongoing),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Match result from one party's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    Win,
    Lose,
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    User1,
    User2,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkMatch {
    pub id: Uuid,
    pub user1_id: Uuid,
    pub user2_id: Uuid,
    pub user1_score: u32,
    pub user2_score: u32,
    pub status: MatchStatus,
    pub questions: Vec<PkQuestion>,
    /// `None` = unanswered, `Some(correct)` otherwise. One slot per question.
    pub user1_answers: Vec<Option<bool>>,
    pub user2_answers: Vec<Option<bool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Result of a single answer submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub is_correct: bool,
    pub correct_answer: usize,
    pub my_score: u32,
    pub opponent_score: u32,
    /// The opponent's recorded result for the same question.
    pub opponent_correct: bool,
}

/// Result of finishing a match, from the requester's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishOutcome {
    pub result: MatchResult,
    pub my_score: u32,
    pub opponent_score: u32,
    pub winner_id: Option<Uuid>,
}

impl PkMatch {
    fn side_of(&self, party: Uuid) -> Option<Side> {
        if party == self.user1_id {
            Some(Side::User1)
        } else if party == self.user2_id {
            Some(Side::User2)
        } else {
            None
        }
    }

    pub fn is_participant(&self, party: Uuid) -> bool {
        self.side_of(party).is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    /// The other party of the match, if `party` takes part in it.
    pub fn opponent_of(&self, party: Uuid) -> Option<Uuid> {
        match self.side_of(party)? {
            Side::User1 => Some(self.user2_id),
            Side::User2 => Some(self.user1_id),
        }
    }

    /// `(my_score, opponent_score)` for a participant.
    pub fn scores_for(&self, party: Uuid) -> Option<(u32, u32)> {
        match self.side_of(party)? {
            Side::User1 => Some((self.user1_score, self.user2_score)),
            Side::User2 => Some((self.user2_score, self.user1_score)),
        }
    }

    /// Result for a participant once the match is completed.
    pub fn result_for(&self, party: Uuid) -> Option<MatchResult> {
        if !self.is_completed() || !self.is_participant(party) {
            return None;
        }
        Some(match self.winner_id {
            Some(winner) if winner == party => MatchResult::Win,
            Some(_) => MatchResult::Lose,
            None => MatchResult::Draw,
        })
    }

    fn slots_mut(&mut self, side: Side) -> (&mut Vec<Option<bool>>, &mut u32) {
        match side {
            Side::User1 => (&mut self.user1_answers, &mut self.user1_score),
            Side::User2 => (&mut self.user2_answers, &mut self.user2_score),
        }
    }
}

/// Start a match between two distinct parties over a random sample of the pool.
///
/// Samples `min(count, pool.len())` questions without replacement; every subset
/// of that size is equally likely. The pool is never mutated.
pub fn start_match<R: Rng + ?Sized>(
    party_a: Uuid,
    party_b: Uuid,
    pool: &[PkQuestion],
    count: usize,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<PkMatch, MatchError> {
    if party_a == party_b {
        return Err(MatchError::SelfMatch);
    }
    if pool.is_empty() || count == 0 {
        return Err(MatchError::EmptyQuestionPool);
    }

    let questions: Vec<PkQuestion> = pool.choose_multiple(rng, count).cloned().collect();
    let len = questions.len();

    Ok(PkMatch {
        id: Uuid::new_v4(),
        user1_id: party_a,
        user2_id: party_b,
        user1_score: 0,
        user2_score: 0,
        status: MatchStatus::Ongoing,
        questions,
        user1_answers: vec![None; len],
        user2_answers: vec![None; len],
        winner_id: None,
        created_at: now,
        completed_at: None,
    })
}

/// Record `party`'s answer to one question and simulate the opponent's answer
/// to the same question.
///
/// The match is left untouched when any precondition fails.
pub fn submit_answer(
    pk: &mut PkMatch,
    party: Uuid,
    question_index: usize,
    answer: usize,
    opponent: &mut dyn OpponentModel,
) -> Result<AnswerOutcome, MatchError> {
    if pk.is_completed() {
        return Err(MatchError::MatchClosed);
    }
    let side = pk.side_of(party).ok_or(MatchError::NotParticipant)?;
    let len = pk.questions.len();
    if question_index >= len {
        return Err(MatchError::InvalidQuestionIndex {
            index: question_index,
            len,
        });
    }
    let other = match side {
        Side::User1 => Side::User2,
        Side::User2 => Side::User1,
    };
    {
        let (mine, _) = pk.slots_mut(side);
        if mine.get(question_index).copied().flatten().is_some() {
            return Err(MatchError::AlreadyAnswered {
                index: question_index,
            });
        }
    }

    let question = pk.questions[question_index].clone();
    let is_correct = question.correct_answer == answer;

    {
        let (mine, score) = pk.slots_mut(side);
        mine[question_index] = Some(is_correct);
        if is_correct {
            *score += 1;
        }
    }

    let opponent_correct = {
        let (theirs, score) = pk.slots_mut(other);
        match theirs[question_index] {
            Some(recorded) => recorded,
            None => {
                let correct = opponent.answers_correctly(&question);
                theirs[question_index] = Some(correct);
                if correct {
                    *score += 1;
                }
                correct
            }
        }
    };

    let (my_score, opponent_score) = match side {
        Side::User1 => (pk.user1_score, pk.user2_score),
        Side::User2 => (pk.user2_score, pk.user1_score),
    };

    Ok(AnswerOutcome {
        is_correct,
        correct_answer: question.correct_answer,
        my_score,
        opponent_score,
        opponent_correct,
    })
}

/// Close the match and report the result for `requesting_party`.
///
/// Finishing an already completed match recomputes the same outcome and keeps
/// the original `completed_at`.
pub fn finish_match(
    pk: &mut PkMatch,
    requesting_party: Uuid,
    now: DateTime<Utc>,
) -> Result<FinishOutcome, MatchError> {
    let (my_score, opponent_score) = pk
        .scores_for(requesting_party)
        .ok_or(MatchError::NotParticipant)?;

    if !pk.is_completed() {
        pk.winner_id = if pk.user1_score > pk.user2_score {
            Some(pk.user1_id)
        } else if pk.user2_score > pk.user1_score {
            Some(pk.user2_id)
        } else {
            None
        };
        pk.status = MatchStatus::Completed;
        pk.completed_at = Some(now);
    }

    let result = pk
        .result_for(requesting_party)
        .ok_or(MatchError::NotParticipant)?;

    Ok(FinishOutcome {
        result,
        my_score,
        opponent_score,
        winner_id: pk.winner_id,
    })
}
