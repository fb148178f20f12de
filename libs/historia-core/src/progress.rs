//! Lesson completion bookkeeping.

use chrono::{DateTime, Utc};

use crate::types::LessonProgress;

/// Mark a lesson as completed and report whether this was its first completion.
///
/// Re-completions refresh score and timestamp but are not first completions,
/// so they never count twice toward lesson-count badges.
pub fn record_completion(progress: &mut LessonProgress, score: i32, now: DateTime<Utc>) -> bool {
    let first = !progress.completed;
    progress.completed = true;
    progress.score = score;
    progress.completed_at = Some(now);
    first
}
