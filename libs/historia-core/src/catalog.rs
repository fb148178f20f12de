//! Read-only lesson and historical-figure catalog.
//!
//! The catalog is loaded once at startup (from JSON) and shared by reference;
//! nothing in the crate mutates it afterwards.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::badges::BadgeRules;
use crate::error::CatalogError;
use crate::pk::PkQuestion;

/// Multiple-choice question inside a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonQuestion {
    pub id: String,
    pub content: String,
    pub options: Vec<String>,
    /// Index into `options`.
    #[serde(alias = "correctAnswer")]
    pub correct_answer: usize,
}

impl LessonQuestion {
    pub fn is_correct(&self, answer: usize) -> bool {
        answer == self.correct_answer
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<LessonQuestion>,
}

/// A historical figure users can chat with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalFigure {
    pub id: String,
    pub name: String,
    pub title: String,
    pub era: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub greeting: String,
    /// Persona prompt for the chat service. Not meant for public listings.
    #[serde(alias = "systemPrompt", default)]
    pub system_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    lessons: Vec<Lesson>,
    #[serde(default)]
    figures: Vec<HistoricalFigure>,
}

impl Catalog {
    /// Build a catalog from parts, validating ids and answer indices.
    pub fn new(lessons: Vec<Lesson>, figures: Vec<HistoricalFigure>) -> Result<Self, CatalogError> {
        let catalog = Self { lessons, figures };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate a JSON catalog document.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.lessons.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut lesson_ids = HashSet::new();
        let mut question_ids = HashSet::new();
        for lesson in &self.lessons {
            if !lesson_ids.insert(lesson.id.as_str()) {
                return Err(CatalogError::DuplicateLesson(lesson.id.clone()));
            }
            for q in &lesson.questions {
                if !question_ids.insert(q.id.as_str()) {
                    return Err(CatalogError::DuplicateQuestion(q.id.clone()));
                }
                if q.correct_answer >= q.options.len() {
                    return Err(CatalogError::AnswerOutOfRange {
                        question: q.id.clone(),
                        answer: q.correct_answer,
                        options: q.options.len(),
                    });
                }
            }
        }

        let mut figure_ids = HashSet::new();
        for figure in &self.figures {
            if !figure_ids.insert(figure.id.as_str()) {
                return Err(CatalogError::DuplicateFigure(figure.id.clone()));
            }
        }

        Ok(())
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn lesson(&self, id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }

    pub fn lesson_count(&self) -> u32 {
        self.lessons.len() as u32
    }

    pub fn question(&self, lesson_id: &str, question_id: &str) -> Option<&LessonQuestion> {
        self.lesson(lesson_id)?
            .questions
            .iter()
            .find(|q| q.id == question_id)
    }

    /// Every question of every lesson, tagged with its lesson title.
    pub fn question_pool(&self) -> Vec<PkQuestion> {
        self.lessons
            .iter()
            .flat_map(|lesson| {
                lesson.questions.iter().map(move |q| PkQuestion {
                    id: q.id.clone(),
                    content: q.content.clone(),
                    options: q.options.clone(),
                    correct_answer: q.correct_answer,
                    lesson_title: lesson.title.clone(),
                })
            })
            .collect()
    }

    pub fn figures(&self) -> &[HistoricalFigure] {
        &self.figures
    }

    pub fn figure(&self, id: &str) -> Option<&HistoricalFigure> {
        self.figures.iter().find(|f| f.id == id)
    }

    /// Badge catalog whose mastery badge requires every lesson here.
    pub fn badge_rules(&self) -> BadgeRules {
        BadgeRules::for_catalog_size(self.lesson_count())
    }
}
