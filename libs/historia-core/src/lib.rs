//! Core game logic for the HistoriaQuest learning backend.
//!
//! Provides:
//! - Lesson / figure catalog (read-only configuration loaded once)
//! - Badge evaluation on lesson completion
//! - PK (head-to-head quiz) match state machine with a pluggable opponent
//! - Friendship request rules
//! - Shared types (UserStats, LessonProgress, PkMatch, etc.)
//!
//! Everything here is pure and synchronous; persistence belongs to the caller.

pub mod badges;
pub mod catalog;
pub mod error;
pub mod pk;
pub mod progress;
pub mod social;
pub mod types;

pub use badges::{evaluate_completion, Badge, BadgeRule, BadgeRules, CompletionOutcome};
pub use catalog::{Catalog, HistoricalFigure, Lesson, LessonQuestion};
pub use error::{CatalogError, CompletionError, FriendshipError, MatchError};
pub use pk::{
    finish_match, start_match, submit_answer, AnswerOutcome, CoinFlipOpponent, FinishOutcome,
    MatchResult, MatchStatus, OpponentModel, PkMatch, PkQuestion, ScriptedOpponent,
    DEFAULT_OPPONENT_ACCURACY, DEFAULT_QUESTION_COUNT,
};
pub use progress::record_completion;
pub use social::{Friendship, FriendshipStatus};
pub use types::{LessonProgress, QuizOutcome, UserStats};
