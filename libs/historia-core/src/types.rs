//! Core types for the learning application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accumulated learning statistics for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    /// Total study time in minutes.
    #[serde(default)]
    pub total_study_time: u32,
    #[serde(default)]
    pub correct_answers: u32,
    #[serde(default)]
    pub total_answers: u32,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_study_date: Option<DateTime<Utc>>,
    /// Unlocked badge ids in unlock order. Never shrinks.
    #[serde(default)]
    pub badges: Vec<String>,
}

impl UserStats {
    /// Whether the badge has already been unlocked.
    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.badges.iter().any(|b| b == badge_id)
    }

    /// Cumulative correct rate over every recorded answer, 0.0 with no answers.
    pub fn correct_rate(&self) -> f64 {
        if self.total_answers == 0 {
            0.0
        } else {
            self.correct_answers as f64 / self.total_answers as f64
        }
    }

    /// Add study minutes, saturating at `u32::MAX`.
    pub fn add_study_time(&mut self, minutes: u32, now: DateTime<Utc>) {
        self.total_study_time = self.total_study_time.saturating_add(minutes);
        self.last_study_date = Some(now);
    }
}

/// Per-user completion record for one lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgress {
    pub lesson_id: String,
    pub completed: bool,
    pub score: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl LessonProgress {
    /// Fresh, not yet completed progress for a lesson.
    pub fn new(lesson_id: impl Into<String>) -> Self {
        Self {
            lesson_id: lesson_id.into(),
            completed: false,
            score: 0,
            completed_at: None,
        }
    }
}

/// Answer counts of a single quiz run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOutcome {
    pub correct_count: u32,
    pub total_count: u32,
}

impl QuizOutcome {
    pub fn new(correct_count: u32, total_count: u32) -> Self {
        Self {
            correct_count,
            total_count,
        }
    }

    /// Correct rate of this quiz only; 0.0 when no question was asked.
    pub fn correct_rate(&self) -> f64 {
        if self.total_count == 0 {
            0.0
        } else {
            self.correct_count as f64 / self.total_count as f64
        }
    }

    /// True only for a non-empty quiz answered without mistakes.
    pub fn is_perfect(&self) -> bool {
        self.total_count > 0 && self.correct_count == self.total_count
    }
}
