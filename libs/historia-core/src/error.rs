//! Error types for historia-core.

use thiserror::Error;

/// Errors raised by the PK match engine.
///
/// All of them are caller-side validation failures: the match is left
/// untouched and retrying the same call cannot succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("match is already completed")]
    MatchClosed,

    #[error("not a participant in this match")]
    NotParticipant,

    #[error("invalid question index {index} (match has {len} questions)")]
    InvalidQuestionIndex { index: usize, len: usize },

    #[error("question {index} was already answered")]
    AlreadyAnswered { index: usize },

    #[error("a player cannot challenge themselves")]
    SelfMatch,

    #[error("no questions available to start a match")]
    EmptyQuestionPool,
}

/// Errors raised while evaluating a lesson completion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("correct count {correct} exceeds total count {total}")]
    CorrectExceedsTotal { correct: u32, total: u32 },
}

/// Errors raised by the friendship rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FriendshipError {
    #[error("cannot add yourself as friend")]
    SelfRequest,

    #[error("already friends")]
    AlreadyFriends,

    #[error("friend request already pending")]
    RequestPending,

    #[error("friend request is not pending")]
    NotPending,

    #[error("only the addressee can answer a friend request")]
    NotAddressee,
}

/// Errors that can occur while loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog has no lessons")]
    Empty,

    #[error("duplicate lesson id {0}")]
    DuplicateLesson(String),

    #[error("duplicate question id {0}")]
    DuplicateQuestion(String),

    #[error("duplicate figure id {0}")]
    DuplicateFigure(String),

    #[error("question {question} has correct answer {answer} but only {options} options")]
    AnswerOutOfRange {
        question: String,
        answer: usize,
        options: usize,
    },
}
