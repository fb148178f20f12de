//! Error handling for the service layer

use historia_core::{CatalogError, CompletionError, FriendshipError, MatchError};
use thiserror::Error;
use uuid::Uuid;

/// Service error types
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Match error: {0}")]
    Match(#[from] MatchError),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Friendship error: {0}")]
    Friendship(#[from] FriendshipError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Match not found: {0}")]
    MatchNotFound(Uuid),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Lesson not found: {0}")]
    LessonNotFound(String),

    #[error("Question not found: {0}")]
    QuestionNotFound(String),

    #[error("Figure not found: {0}")]
    FigureNotFound(String),

    #[error("Friend request not found: {0}")]
    FriendRequestNotFound(Uuid),

    #[error("Progress not found: {0}")]
    ProgressNotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification a caller maps onto its own transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Match(MatchError::NotParticipant)
            | ServiceError::Friendship(FriendshipError::NotAddressee) => ErrorKind::Forbidden,
            ServiceError::Match(_)
            | ServiceError::Completion(_)
            | ServiceError::Friendship(_) => ErrorKind::Validation,
            ServiceError::MatchNotFound(_)
            | ServiceError::UserNotFound(_)
            | ServiceError::LessonNotFound(_)
            | ServiceError::QuestionNotFound(_)
            | ServiceError::FigureNotFound(_)
            | ServiceError::FriendRequestNotFound(_)
            | ServiceError::ProgressNotFound(_) => ErrorKind::NotFound,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::Database(_)
            | ServiceError::Catalog(_)
            | ServiceError::Config(_)
            | ServiceError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Only lost optimistic-concurrency races are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Conflict(_))
    }
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_closed_is_validation() {
        let error = ServiceError::from(MatchError::MatchClosed);
        assert_eq!(error.kind(), ErrorKind::Validation);
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_not_participant_is_forbidden() {
        let error = ServiceError::from(MatchError::NotParticipant);
        assert_eq!(error.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_invalid_index_is_validation() {
        let error = ServiceError::from(MatchError::InvalidQuestionIndex { index: 7, len: 5 });
        assert_eq!(error.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_lookup_failures_are_not_found() {
        let id = Uuid::nil();
        assert_eq!(ServiceError::MatchNotFound(id).kind(), ErrorKind::NotFound);
        assert_eq!(ServiceError::UserNotFound(id).kind(), ErrorKind::NotFound);
        assert_eq!(
            ServiceError::LessonNotFound("lesson-99".to_string()).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_conflict_is_retryable() {
        let error = ServiceError::Conflict("user_stats".to_string());
        assert_eq!(error.kind(), ErrorKind::Conflict);
        assert!(error.is_retryable());
    }

    #[test]
    fn test_internal_error_kind() {
        let error = ServiceError::Internal("unexpected error".to_string());
        assert_eq!(error.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_error_display_match_not_found() {
        let error = ServiceError::MatchNotFound(Uuid::nil());
        assert_eq!(
            error.to_string(),
            "Match not found: 00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_error_display_match_closed() {
        let error = ServiceError::from(MatchError::MatchClosed);
        assert_eq!(error.to_string(), "Match error: match is already completed");
    }

    #[test]
    fn test_error_display_friendship() {
        let error = ServiceError::from(FriendshipError::AlreadyFriends);
        assert_eq!(error.to_string(), "Friendship error: already friends");
    }

    #[test]
    fn test_error_display_config() {
        let error = ServiceError::Config("DATABASE_URL must be set".to_string());
        assert_eq!(error.to_string(), "Configuration error: DATABASE_URL must be set");
    }
}
