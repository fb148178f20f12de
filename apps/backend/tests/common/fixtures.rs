//! Test fixtures and factory functions for creating requests.

use uuid::Uuid;

use historia_backend::models::{
    AnswerCheckRequest, ChatMessage, CompleteLessonRequest, PkAnswerRequest,
};

/// Lesson completion request.
pub fn complete_request(
    lesson_id: &str,
    correct_count: u32,
    total_count: u32,
    score: i32,
) -> CompleteLessonRequest {
    CompleteLessonRequest {
        lesson_id: lesson_id.to_string(),
        correct_count,
        total_count,
        score,
    }
}

/// Single answer check against the catalog.
pub fn answer_check(lesson_id: &str, question_id: &str, answer: usize) -> AnswerCheckRequest {
    AnswerCheckRequest {
        lesson_id: lesson_id.to_string(),
        question_id: question_id.to_string(),
        answer,
    }
}

/// PK answer submission.
pub fn pk_answer(match_id: Uuid, question_index: usize, answer: usize) -> PkAnswerRequest {
    PkAnswerRequest {
        match_id,
        question_index,
        answer,
    }
}

/// Alternating user/assistant conversation of `turns` messages.
pub fn chat_messages(turns: usize) -> Vec<ChatMessage> {
    (0..turns)
        .map(|i| ChatMessage {
            role: if i % 2 == 0 { "user" } else { "assistant" }.to_string(),
            content: format!("Message {}", i + 1),
        })
        .collect()
}

/// Generate a unique username to avoid collisions.
pub fn unique_username(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().to_string()[..8])
}
