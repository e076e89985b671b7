// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// One recorded answer to one question. Immutable once appended to a
/// session's answer log; labels are stored in normalized (lower-case) form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub question_id: i64,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    /// Client-reported seconds spent on the question.
    pub time_spent: i64,
}

/// DTO for submitting one answer. `index` is the 0-based question position
/// within the session's snapshot.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    pub index: usize,
    #[validate(length(min = 1, max = 16))]
    pub answer: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub time_spent: i64,
}

/// Immediate feedback for a submitted answer. The correct label is shown
/// upper-cased; `explanation` carries the correct option's display text.
#[derive(Debug, Serialize)]
pub struct SubmitAnswerResponse {
    #[serde(rename = "correct")]
    pub is_correct: bool,
    pub correct_answer: String,
    pub explanation: String,
}
