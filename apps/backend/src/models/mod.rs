//! Database rows and service result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{Result, ServiceError};

// Re-export shared types from historia-core
pub use historia_core::{
    AnswerOutcome, FinishOutcome, Friendship, FriendshipStatus, HistoricalFigure, Lesson,
    LessonProgress, MatchResult, MatchStatus, PkMatch, PkQuestion, UserStats,
};

/// Non-negative database integer to `u32`, saturating at the bounds.
pub(crate) fn to_u32(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

/// `u32` counter to a 4-byte database integer, saturating.
pub(crate) fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

// === Database Entity Types ===

/// User profile
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stats row with its optimistic-concurrency version
#[derive(Debug, Clone, FromRow)]
pub struct DbUserStats {
    pub user_id: Uuid,
    pub total_study_time: i64,
    pub correct_answers: i64,
    pub total_answers: i64,
    pub current_streak: i64,
    pub last_study_date: Option<DateTime<Utc>>,
    pub badges: Json<Vec<String>>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl DbUserStats {
    pub fn to_core_stats(&self) -> UserStats {
        UserStats {
            total_study_time: to_u32(self.total_study_time),
            correct_answers: to_u32(self.correct_answers),
            total_answers: to_u32(self.total_answers),
            current_streak: to_u32(self.current_streak),
            last_study_date: self.last_study_date,
            badges: self.badges.0.clone(),
        }
    }
}

/// Lesson progress row
#[derive(Debug, Clone, FromRow)]
pub struct DbLessonProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lesson_id: String,
    pub completed: bool,
    pub score: i32,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DbLessonProgress {
    pub fn to_core_progress(&self) -> LessonProgress {
        LessonProgress {
            lesson_id: self.lesson_id.clone(),
            completed: self.completed,
            score: self.score,
            completed_at: self.completed_at,
        }
    }
}

/// PK match row; questions and answer slots are JSONB columns
#[derive(Debug, Clone, FromRow)]
pub struct DbPkMatch {
    pub id: Uuid,
    pub user1_id: Uuid,
    pub user2_id: Uuid,
    pub user1_score: i32,
    pub user2_score: i32,
    pub winner_id: Option<Uuid>,
    pub status: String,
    pub questions: Json<Vec<PkQuestion>>,
    pub user1_answers: Json<Vec<Option<bool>>>,
    pub user2_answers: Json<Vec<Option<bool>>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DbPkMatch {
    /// Convert to the core match. Answer slots are padded or cut to one per
    /// question so rows written before slot tracking still load. An unknown
    /// status is an error rather than a reopened match.
    pub fn to_core_match(&self) -> Result<PkMatch> {
        let status = MatchStatus::from_str(&self.status).ok_or_else(|| {
            ServiceError::Internal(format!(
                "pk_match {} has unknown status {:?}",
                self.id, self.status
            ))
        })?;
        let len = self.questions.0.len();
        let slots = |answers: &[Option<bool>]| {
            let mut slots = answers.to_vec();
            slots.resize(len, None);
            slots
        };

        Ok(PkMatch {
            id: self.id,
            user1_id: self.user1_id,
            user2_id: self.user2_id,
            user1_score: to_u32(i64::from(self.user1_score)),
            user2_score: to_u32(i64::from(self.user2_score)),
            status,
            questions: self.questions.0.clone(),
            user1_answers: slots(&self.user1_answers.0),
            user2_answers: slots(&self.user2_answers.0),
            winner_id: self.winner_id,
            created_at: self.created_at,
            completed_at: self.completed_at,
        })
    }
}

/// Friendship row
#[derive(Debug, Clone, FromRow)]
pub struct DbFriendship {
    pub id: Uuid,
    pub user_id: Uuid,
    pub friend_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl DbFriendship {
    pub fn to_core_friendship(&self) -> Result<Friendship> {
        let status = FriendshipStatus::from_str(&self.status).ok_or_else(|| {
            ServiceError::Internal(format!(
                "friendship {} has unknown status {:?}",
                self.id, self.status
            ))
        })?;

        Ok(Friendship {
            id: self.id,
            user_id: self.user_id,
            friend_id: self.friend_id,
            status,
            created_at: self.created_at,
        })
    }
}

/// One chat turn as stored in history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat history row; `figure_id` is `None` for general chat
#[derive(Debug, Clone, FromRow)]
pub struct DbChatHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub figure_id: Option<String>,
    pub messages: Json<Vec<ChatMessage>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// === Service Request/Response Types ===

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub total_study_time: u32,
    pub correct_answers: u32,
    pub total_answers: u32,
    pub current_streak: u32,
    pub badges: Vec<String>,
    pub correct_rate: f64,
}

impl From<&UserStats> for StatsResponse {
    fn from(stats: &UserStats) -> Self {
        Self {
            total_study_time: stats.total_study_time,
            correct_answers: stats.correct_answers,
            total_answers: stats.total_answers,
            current_streak: stats.current_streak,
            badges: stats.badges.clone(),
            correct_rate: stats.correct_rate(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompleteLessonRequest {
    pub lesson_id: String,
    pub correct_count: u32,
    pub total_count: u32,
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionResponse {
    pub message: String,
    pub new_badges: Vec<String>,
    pub all_badges: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerCheckRequest {
    pub lesson_id: String,
    pub question_id: String,
    pub answer: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerCheckResponse {
    pub is_correct: bool,
    pub correct_answer: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PkAnswerRequest {
    pub match_id: Uuid,
    pub question_index: usize,
    pub answer: usize,
}

/// A freshly started match from the challenger's point of view
#[derive(Debug, Clone, Serialize)]
pub struct PkStartResponse {
    pub id: Uuid,
    pub opponent_id: Uuid,
    pub opponent_name: Option<String>,
    pub my_score: u32,
    pub opponent_score: u32,
    pub status: MatchStatus,
    pub questions: Vec<PkQuestion>,
    pub current_question: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpponentSummary {
    pub id: Uuid,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PkHistoryEntry {
    pub id: Uuid,
    pub opponent: OpponentSummary,
    pub my_score: u32,
    pub opponent_score: u32,
    pub result: MatchResult,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendSummary {
    pub id: Uuid,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<&UserProfile> for FriendSummary {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            username: profile.username.clone(),
            avatar_url: profile.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FriendRequestSummary {
    pub id: Uuid,
    pub from_user: FriendSummary,
    pub created_at: DateTime<Utc>,
}

/// Public figure listing entry; never carries the system prompt
#[derive(Debug, Clone, Serialize)]
pub struct FigureSummary {
    pub id: String,
    pub name: String,
    pub title: String,
    pub era: String,
    pub avatar: String,
    pub description: String,
    pub greeting: String,
}

impl From<&HistoricalFigure> for FigureSummary {
    fn from(figure: &HistoricalFigure) -> Self {
        Self {
            id: figure.id.clone(),
            name: figure.name.clone(),
            title: figure.title.clone(),
            era: figure.era.clone(),
            avatar: figure.avatar.clone(),
            description: figure.description.clone(),
            greeting: figure.greeting.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatHistoryResponse {
    pub id: Uuid,
    pub figure_id: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbChatHistory> for ChatHistoryResponse {
    fn from(row: DbChatHistory) -> Self {
        Self {
            id: row.id,
            figure_id: row.figure_id,
            messages: row.messages.0,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn question(id: &str) -> PkQuestion {
        PkQuestion {
            id: id.to_string(),
            content: "Who?".to_string(),
            options: vec!["A".to_string(), "B".to_string()],
            correct_answer: 1,
            lesson_title: "Lesson".to_string(),
        }
    }

    fn db_match(answers: Vec<Option<bool>>) -> DbPkMatch {
        DbPkMatch {
            id: Uuid::new_v4(),
            user1_id: Uuid::new_v4(),
            user2_id: Uuid::new_v4(),
            user1_score: 2,
            user2_score: -1,
            winner_id: None,
            status: "ongoing".to_string(),
            questions: Json(vec![question("q1"), question("q2"), question("q3")]),
            user1_answers: Json(answers),
            user2_answers: Json(vec![]),
            version: 0,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_to_u32_saturates() {
        assert_eq!(to_u32(-5), 0);
        assert_eq!(to_u32(42), 42);
        assert_eq!(to_u32(i64::MAX), u32::MAX);
        assert_eq!(to_i32(u32::MAX), i32::MAX);
    }

    #[test]
    fn test_match_answer_slots_match_question_count() {
        let pk = db_match(vec![Some(true)]).to_core_match().unwrap();
        assert_eq!(pk.user1_answers, vec![Some(true), None, None]);
        assert_eq!(pk.user2_answers, vec![None, None, None]);

        let pk = db_match(vec![Some(true); 5]).to_core_match().unwrap();
        assert_eq!(pk.user1_answers.len(), 3);
    }

    #[test]
    fn test_match_row_conversion() {
        let row = db_match(vec![]);
        let pk = row.to_core_match().unwrap();
        assert_eq!(pk.status, MatchStatus::Ongoing);
        assert_eq!((pk.user1_score, pk.user2_score), (2, 0));
        assert_eq!(pk.questions.len(), 3);
    }

    #[test]
    fn test_unknown_match_status_is_an_error() {
        let mut row = db_match(vec![Some(true)]);
        row.status = "complete".to_string();

        let err = row.to_core_match().unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
        assert_eq!(err.kind(), crate::error::ErrorKind::Internal);
    }

    #[test]
    fn test_unknown_friendship_status_is_an_error() {
        let row = DbFriendship {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            friend_id: Uuid::new_v4(),
            status: "blocked".to_string(),
            created_at: Utc::now(),
        };
        assert!(matches!(
            row.to_core_friendship().unwrap_err(),
            ServiceError::Internal(_)
        ));

        let row = DbFriendship {
            status: "rejected".to_string(),
            ..row
        };
        assert_eq!(
            row.to_core_friendship().unwrap().status,
            FriendshipStatus::Rejected
        );
    }

    #[test]
    fn test_stats_row_conversion() {
        let row = DbUserStats {
            user_id: Uuid::new_v4(),
            total_study_time: 120,
            correct_answers: 7,
            total_answers: 10,
            current_streak: 2,
            last_study_date: None,
            badges: Json(vec!["badge-1".to_string()]),
            version: 3,
            updated_at: Utc::now(),
        };
        let stats = row.to_core_stats();
        assert_eq!(stats.total_study_time, 120);
        assert_eq!(stats.correct_answers, 7);
        assert!(stats.has_badge("badge-1"));

        let response = StatsResponse::from(&stats);
        assert!((response.correct_rate - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_figure_summary_hides_prompt() {
        let figure = HistoricalFigure {
            id: "li-bai".to_string(),
            name: "Li Bai".to_string(),
            title: "Poet".to_string(),
            era: "Tang".to_string(),
            avatar: String::new(),
            description: String::new(),
            greeting: "Hello".to_string(),
            system_prompt: "secret persona".to_string(),
        };
        let json = serde_json::to_string(&FigureSummary::from(&figure)).unwrap();
        assert!(!json.contains("secret persona"));
        assert!(json.contains("Li Bai"));
    }
}
