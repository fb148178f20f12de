//! Achievement badges and their unlock evaluation.
//!
//! Badges are catalog data: each one pairs an id with an immutable rule over
//! three derived quantities (effective completed-lesson count, the correct
//! rate of the quiz that triggered the evaluation, cumulative study time).

use serde::{Deserialize, Serialize};

use crate::error::CompletionError;
use crate::types::{QuizOutcome, UserStats};

/// Number of lessons in the built-in catalog.
pub const DEFAULT_CATALOG_SIZE: u32 = 14;

/// Study minutes required for the time badge.
pub const STUDY_TIME_BADGE_MINUTES: u32 = 600;

/// Unlock predicate of a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BadgeRule {
    /// Effective completed-lesson count reaches the threshold.
    LessonsCompleted { at_least: u32 },
    /// The triggering quiz was answered without a single mistake.
    PerfectQuiz,
    /// Cumulative study time (minutes) reaches the threshold.
    StudyMinutes { at_least: u32 },
}

/// Quantities a rule is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct BadgeContext {
    pub completed_lessons: u32,
    pub quiz: QuizOutcome,
    pub total_study_time: u32,
}

impl BadgeRule {
    pub fn is_met(&self, ctx: &BadgeContext) -> bool {
        match *self {
            Self::LessonsCompleted { at_least } => ctx.completed_lessons >= at_least,
            Self::PerfectQuiz => ctx.quiz.is_perfect(),
            Self::StudyMinutes { at_least } => ctx.total_study_time >= at_least,
        }
    }
}

/// A named achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub rule: BadgeRule,
}

impl Badge {
    fn new(id: &str, name: &str, description: &str, rule: BadgeRule) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            rule,
        }
    }
}

/// The badge catalog, evaluated in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeRules {
    badges: Vec<Badge>,
}

impl Default for BadgeRules {
    fn default() -> Self {
        Self::for_catalog_size(DEFAULT_CATALOG_SIZE)
    }
}

impl BadgeRules {
    /// Standard six badges; the mastery badge requires every catalog lesson.
    pub fn for_catalog_size(lesson_count: u32) -> Self {
        Self {
            badges: vec![
                Badge::new(
                    "badge-1",
                    "History Beginner",
                    "Complete your first lesson",
                    BadgeRule::LessonsCompleted { at_least: 1 },
                ),
                Badge::new(
                    "badge-2",
                    "Curious Explorer",
                    "Complete 3 lessons",
                    BadgeRule::LessonsCompleted { at_least: 3 },
                ),
                Badge::new(
                    "badge-3",
                    "Perfect Answerer",
                    "Answer every question of a quiz correctly",
                    BadgeRule::PerfectQuiz,
                ),
                Badge::new(
                    "badge-4",
                    "Dedicated Scholar",
                    "Complete 5 lessons",
                    BadgeRule::LessonsCompleted { at_least: 5 },
                ),
                Badge::new(
                    "badge-5",
                    "History Master",
                    "Complete every lesson",
                    BadgeRule::LessonsCompleted {
                        at_least: lesson_count,
                    },
                ),
                Badge::new(
                    "badge-6",
                    "Time Traveler",
                    "Study for 600 minutes in total",
                    BadgeRule::StudyMinutes {
                        at_least: STUDY_TIME_BADGE_MINUTES,
                    },
                ),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Badge> {
        self.badges.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Badge> {
        self.badges.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }
}

/// Result of evaluating one lesson completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub stats: UserStats,
    /// Badges unlocked by this event, in evaluation order.
    pub newly_unlocked: Vec<String>,
}

/// Fold a lesson-completion event into the user's stats and unlock badges.
///
/// `completed_lesson_count` is the number of distinct lessons completed
/// before this event; one is added when `is_first_completion` is set.
/// Badges already held are never re-reported and never removed.
pub fn evaluate_completion(
    rules: &BadgeRules,
    mut stats: UserStats,
    is_first_completion: bool,
    completed_lesson_count: u32,
    quiz: QuizOutcome,
) -> Result<CompletionOutcome, CompletionError> {
    if quiz.correct_count > quiz.total_count {
        return Err(CompletionError::CorrectExceedsTotal {
            correct: quiz.correct_count,
            total: quiz.total_count,
        });
    }

    stats.correct_answers = stats.correct_answers.saturating_add(quiz.correct_count);
    stats.total_answers = stats.total_answers.saturating_add(quiz.total_count);

    let ctx = BadgeContext {
        completed_lessons: completed_lesson_count.saturating_add(u32::from(is_first_completion)),
        quiz,
        total_study_time: stats.total_study_time,
    };

    let mut newly_unlocked = Vec::new();
    for badge in rules.iter() {
        if badge.rule.is_met(&ctx) && !stats.has_badge(&badge.id) {
            stats.badges.push(badge.id.clone());
            newly_unlocked.push(badge.id.clone());
        }
    }

    Ok(CompletionOutcome {
        stats,
        newly_unlocked,
    })
}
