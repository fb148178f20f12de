//! Lesson progress, completion and badge tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL environment variable before running.

mod common;

use pretty_assertions::assert_eq;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

use historia_backend::error::{ErrorKind, ServiceError};
use historia_backend::services::{profile, progress};

use common::fixtures;
use common::TestContext;

/// First lesson completion unlocks the beginner badge.
#[tokio::test]
#[ignore = "requires database"]
async fn test_first_completion_unlocks_beginner_badge() {
    let ctx = TestContext::new().await;
    let user = ctx.create_test_user(Some("learner")).await;

    let response = assert_ok!(
        progress::complete_lesson(&ctx.state, user, fixtures::complete_request("lesson-1", 2, 3, 67))
            .await
    );

    assert_eq!(response.message, "Lesson lesson-1 completed with score 67");
    assert_eq!(response.new_badges, vec!["badge-1".to_string()]);
    assert_eq!(response.all_badges, vec!["badge-1".to_string()]);

    let stats = profile::get_stats(&ctx.state, user).await.unwrap();
    assert_eq!((stats.correct_answers, stats.total_answers), (2, 3));

    // Cleanup
    ctx.cleanup_user(user).await;
}

/// A perfect quiz unlocks the perfect-answer badge alongside the beginner badge.
#[tokio::test]
#[ignore = "requires database"]
async fn test_perfect_quiz_unlocks_badge() {
    let ctx = TestContext::new().await;
    let user = ctx.create_test_user(None).await;

    let response = progress::complete_lesson(
        &ctx.state,
        user,
        fixtures::complete_request("lesson-2", 3, 3, 100),
    )
    .await
    .unwrap();

    assert_eq!(
        response.new_badges,
        vec!["badge-1".to_string(), "badge-3".to_string()]
    );

    // Cleanup
    ctx.cleanup_user(user).await;
}

/// Completing the same lesson again does not advance the lesson count.
#[tokio::test]
#[ignore = "requires database"]
async fn test_repeat_completion_counts_once() {
    let ctx = TestContext::new().await;
    let user = ctx.create_test_user(None).await;

    for score in [40, 60, 80] {
        progress::complete_lesson(
            &ctx.state,
            user,
            fixtures::complete_request("lesson-1", 1, 3, score),
        )
        .await
        .unwrap();
    }

    let stats = profile::get_stats(&ctx.state, user).await.unwrap();
    assert_eq!(stats.badges, vec!["badge-1".to_string()]);
    assert_eq!(stats.total_answers, 9);

    let lesson = progress::get_progress(&ctx.state, user, "lesson-1").await.unwrap();
    assert!(lesson.completed);
    assert_eq!(lesson.score, 80);

    // Cleanup
    ctx.cleanup_user(user).await;
}

/// Three distinct lessons unlock the explorer badge exactly once.
#[tokio::test]
#[ignore = "requires database"]
async fn test_three_lessons_unlock_explorer_badge() {
    let ctx = TestContext::new().await;
    let user = ctx.create_test_user(None).await;

    let mut unlocked = Vec::new();
    for lesson in ["lesson-1", "lesson-2", "lesson-3", "lesson-4"] {
        let response = progress::complete_lesson(
            &ctx.state,
            user,
            fixtures::complete_request(lesson, 1, 3, 33),
        )
        .await
        .unwrap();
        unlocked.extend(response.new_badges);
    }

    assert_eq!(unlocked, vec!["badge-1".to_string(), "badge-2".to_string()]);
    assert_eq!(progress::list_progress(&ctx.state, user).await.unwrap().len(), 4);

    // Cleanup
    ctx.cleanup_user(user).await;
}

/// Accumulated study time unlocks the time badge on the next completion.
#[tokio::test]
#[ignore = "requires database"]
async fn test_study_time_badge() {
    let ctx = TestContext::new().await;
    let user = ctx.create_test_user(None).await;

    profile::add_study_time(&ctx.state, user, 400).await.unwrap();
    let stats = profile::add_study_time(&ctx.state, user, 200).await.unwrap();
    assert_eq!(stats.total_study_time, 600);

    let response = progress::complete_lesson(
        &ctx.state,
        user,
        fixtures::complete_request("lesson-5", 0, 3, 0),
    )
    .await
    .unwrap();
    assert!(response.new_badges.contains(&"badge-6".to_string()));

    // Cleanup
    ctx.cleanup_user(user).await;
}

/// More correct answers than questions is rejected without writing progress.
#[tokio::test]
#[ignore = "requires database"]
async fn test_correct_exceeding_total_is_rejected() {
    let ctx = TestContext::new().await;
    let user = ctx.create_test_user(None).await;

    let err = assert_err!(
        progress::complete_lesson(&ctx.state, user, fixtures::complete_request("lesson-1", 4, 3, 100))
            .await
    );
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = progress::get_progress(&ctx.state, user, "lesson-1")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ProgressNotFound(_)));

    // Cleanup
    ctx.cleanup_user(user).await;
}

/// Concurrent completions of different lessons all land in the stats.
#[tokio::test]
#[ignore = "requires database"]
async fn test_concurrent_completions_are_serialized() {
    let ctx = TestContext::new().await;
    let user = ctx.create_test_user(None).await;

    let tasks: Vec<_> = (1..=6)
        .map(|i| {
            let state = ctx.state.clone();
            tokio::spawn(async move {
                progress::complete_lesson(
                    &state,
                    user,
                    fixtures::complete_request(&format!("lesson-{i}"), 1, 2, 50),
                )
                .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let stats = profile::get_stats(&ctx.state, user).await.unwrap();
    assert_eq!((stats.correct_answers, stats.total_answers), (6, 12));
    assert_eq!(
        stats.badges,
        vec!["badge-1".to_string(), "badge-2".to_string(), "badge-4".to_string()]
    );

    // Cleanup
    ctx.cleanup_user(user).await;
}

/// Single answers are checked against the catalog.
#[tokio::test]
#[ignore = "requires database"]
async fn test_check_answer() {
    let ctx = TestContext::new().await;

    let right = progress::check_answer(&ctx.state, &fixtures::answer_check("lesson-5", "l5-q1", 1))
        .unwrap();
    assert!(right.is_correct);

    let wrong = progress::check_answer(&ctx.state, &fixtures::answer_check("lesson-5", "l5-q1", 0))
        .unwrap();
    assert!(!wrong.is_correct);
    assert_eq!(wrong.correct_answer, 1);

    let err = progress::check_answer(&ctx.state, &fixtures::answer_check("lesson-99", "x", 0))
        .unwrap_err();
    assert!(matches!(err, ServiceError::LessonNotFound(_)));

    let err = progress::check_answer(&ctx.state, &fixtures::answer_check("lesson-5", "l1-q1", 0))
        .unwrap_err();
    assert!(matches!(err, ServiceError::QuestionNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

/// Lessons outside the catalog cannot be completed and earn nothing.
#[tokio::test]
#[ignore = "requires database"]
async fn test_unknown_lessons_are_rejected() {
    let ctx = TestContext::new().await;
    let user = ctx.create_test_user(None).await;

    for i in 0..14 {
        let lesson_id = format!("bogus-{i}");
        let err = assert_err!(
            progress::complete_lesson(
                &ctx.state,
                user,
                fixtures::complete_request(&lesson_id, 3, 3, 100),
            )
            .await
        );
        assert!(matches!(err, ServiceError::LessonNotFound(ref id) if *id == lesson_id));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    assert!(progress::list_progress(&ctx.state, user).await.unwrap().is_empty());
    let stats = profile::get_stats(&ctx.state, user).await.unwrap();
    assert!(stats.badges.is_empty());
    assert_eq!(stats.total_answers, 0);

    // Cleanup
    ctx.cleanup_user(user).await;
}

/// Stored progress for lessons no longer in the catalog does not count
/// toward the mastery badge.
#[tokio::test]
#[ignore = "requires database"]
async fn test_stale_lessons_do_not_count_toward_mastery() {
    let ctx = TestContext::new().await;
    let user = ctx.create_test_user(None).await;

    for i in 0..14 {
        sqlx::query(
            r#"
            INSERT INTO lesson_progress (id, user_id, lesson_id, completed, score, completed_at)
            VALUES ($1, $2, $3, TRUE, 100, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user)
        .bind(format!("retired-{i}"))
        .execute(ctx.state.db.pool())
        .await
        .unwrap();
    }

    let response = progress::complete_lesson(
        &ctx.state,
        user,
        fixtures::complete_request("lesson-1", 1, 3, 33),
    )
    .await
    .unwrap();
    assert_eq!(response.new_badges, vec!["badge-1".to_string()]);
    assert!(!response.all_badges.contains(&"badge-5".to_string()));

    // Cleanup
    ctx.cleanup_user(user).await;
}

/// Finishing every catalog lesson unlocks the mastery badge on the last one.
#[tokio::test]
#[ignore = "requires database"]
async fn test_every_lesson_unlocks_mastery() {
    let ctx = TestContext::new().await;
    let user = ctx.create_test_user(None).await;
    let lessons = progress::list_lessons(&ctx.state);

    let mut responses = Vec::new();
    for lesson in &lessons {
        let response = progress::complete_lesson(
            &ctx.state,
            user,
            fixtures::complete_request(&lesson.id, 1, 3, 33),
        )
        .await
        .unwrap();
        responses.push(response);
    }

    let (last, earlier) = responses.split_last().unwrap();
    assert!(last.new_badges.contains(&"badge-5".to_string()));
    assert!(earlier
        .iter()
        .all(|r| !r.all_badges.contains(&"badge-5".to_string())));

    // Cleanup
    ctx.cleanup_user(user).await;
}

/// Lesson reads come straight from the catalog.
#[tokio::test]
#[ignore = "requires database"]
async fn test_lesson_catalog_reads() {
    let ctx = TestContext::new().await;

    let lessons = progress::list_lessons(&ctx.state);
    assert_eq!(lessons.len(), 14);
    assert_eq!(lessons[0].id, "lesson-1");

    let lesson = progress::get_lesson(&ctx.state, "lesson-5").unwrap();
    assert_eq!(lesson, lessons[4]);
    assert!(!lesson.questions.is_empty());

    let err = progress::get_lesson(&ctx.state, "lesson-99").unwrap_err();
    assert!(matches!(err, ServiceError::LessonNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
