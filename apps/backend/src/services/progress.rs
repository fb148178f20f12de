//! Lesson catalog reads, lesson progress and lesson completion

use chrono::Utc;
use historia_core::{evaluate_completion, record_completion, CompletionError, QuizOutcome};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Result, ServiceError};
use crate::models::*;
use crate::services::MAX_WRITE_ATTEMPTS;
use crate::AppState;

pub fn list_lessons(state: &AppState) -> Vec<Lesson> {
    state.catalog.lessons().to_vec()
}

pub fn get_lesson(state: &AppState, lesson_id: &str) -> Result<Lesson> {
    state
        .catalog
        .lesson(lesson_id)
        .cloned()
        .ok_or_else(|| ServiceError::LessonNotFound(lesson_id.to_string()))
}

pub async fn list_progress(state: &AppState, user_id: Uuid) -> Result<Vec<LessonProgress>> {
    let rows = state.db.list_progress(user_id).await?;
    Ok(rows.iter().map(|p| p.to_core_progress()).collect())
}

pub async fn get_progress(
    state: &AppState,
    user_id: Uuid,
    lesson_id: &str,
) -> Result<LessonProgress> {
    state
        .db
        .get_progress(user_id, lesson_id)
        .await?
        .map(|p| p.to_core_progress())
        .ok_or_else(|| ServiceError::ProgressNotFound(lesson_id.to_string()))
}

/// Check one answer against the catalog without recording anything
pub fn check_answer(state: &AppState, payload: &AnswerCheckRequest) -> Result<AnswerCheckResponse> {
    let lesson = state
        .catalog
        .lesson(&payload.lesson_id)
        .ok_or_else(|| ServiceError::LessonNotFound(payload.lesson_id.clone()))?;
    let question = lesson
        .questions
        .iter()
        .find(|q| q.id == payload.question_id)
        .ok_or_else(|| ServiceError::QuestionNotFound(payload.question_id.clone()))?;

    Ok(AnswerCheckResponse {
        is_correct: question.is_correct(payload.answer),
        correct_answer: question.correct_answer,
    })
}

/// Record a finished lesson quiz and unlock any badges it earns.
///
/// Progress and stats are written in one transaction. Only catalog lessons
/// can be completed, and only catalog lessons count toward lesson badges.
pub async fn complete_lesson(
    state: &AppState,
    user_id: Uuid,
    payload: CompleteLessonRequest,
) -> Result<CompletionResponse> {
    if state.catalog.lesson(&payload.lesson_id).is_none() {
        return Err(ServiceError::LessonNotFound(payload.lesson_id));
    }
    let quiz = QuizOutcome::new(payload.correct_count, payload.total_count);
    // Also checked by evaluate_completion; failing here skips the lock and reads.
    if quiz.correct_count > quiz.total_count {
        return Err(CompletionError::CorrectExceedsTotal {
            correct: quiz.correct_count,
            total: quiz.total_count,
        }
        .into());
    }
    let lesson_ids: Vec<String> = state.catalog.lessons().iter().map(|l| l.id.clone()).collect();

    let _guard = state.locks.lock(user_id).await;

    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let stats_row = state.db.get_or_create_stats(user_id).await?;
        let completed_before = state
            .db
            .count_completed_lessons(user_id, &lesson_ids)
            .await?;
        let mut progress = state
            .db
            .get_progress(user_id, &payload.lesson_id)
            .await?
            .map(|p| p.to_core_progress())
            .unwrap_or_else(|| LessonProgress::new(payload.lesson_id.clone()));

        let is_first = record_completion(&mut progress, payload.score, Utc::now());
        let outcome = evaluate_completion(
            &state.badges,
            stats_row.to_core_stats(),
            is_first,
            completed_before,
            quiz,
        )?;

        let written = state
            .db
            .record_completion(user_id, &progress, &outcome.stats, stats_row.version)
            .await?;
        if !written {
            warn!(user_id = %user_id, attempt, "Stats version changed, retrying completion");
            continue;
        }

        info!(
            user_id = %user_id,
            lesson_id = %payload.lesson_id,
            first_completion = is_first,
            new_badges = ?outcome.newly_unlocked,
            "Lesson completed"
        );

        return Ok(CompletionResponse {
            message: format!(
                "Lesson {} completed with score {}",
                payload.lesson_id, payload.score
            ),
            new_badges: outcome.newly_unlocked,
            all_badges: outcome.stats.badges,
        });
    }

    Err(ServiceError::Conflict(format!("user_stats {}", user_id)))
}
