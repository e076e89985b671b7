// src/models/question.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One multiple-choice question as loaded from the question bank.
///
/// Options are keyed by a short label ("a".."d"); `correct_answer` must be
/// one of those labels. Both are normalized to lower case by
/// [`Question::normalize_and_validate`] before a bank is accepted, so every
/// read path can compare labels without case juggling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub subject: String,
    pub grade: String,

    /// The text content of the question.
    #[serde(rename = "question")]
    pub text: String,

    /// Option label -> display text.
    pub options: BTreeMap<String, String>,

    /// The label of the correct option.
    pub correct_answer: String,
}

impl Question {
    /// Load-time validation: lower-case all labels, require single-letter
    /// labels, a non-empty option map, and a correct answer that is actually
    /// one of the options. Invalid questions reject the whole bank rather
    /// than surfacing later on the answer path.
    pub fn normalize_and_validate(&mut self) -> Result<(), AppError> {
        let mut options = BTreeMap::new();
        for (label, text) in std::mem::take(&mut self.options) {
            let label = label.trim().to_lowercase();
            if label.len() != 1 || !label.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(AppError::Internal(format!(
                    "question {}: invalid option label '{label}'",
                    self.id
                )));
            }
            if options.insert(label.clone(), text).is_some() {
                return Err(AppError::Internal(format!(
                    "question {}: duplicate option label '{label}'",
                    self.id
                )));
            }
        }
        if options.is_empty() {
            return Err(AppError::Internal(format!(
                "question {} has no options",
                self.id
            )));
        }

        self.correct_answer = self.correct_answer.trim().to_lowercase();
        if !options.contains_key(&self.correct_answer) {
            return Err(AppError::Internal(format!(
                "question {}: correct answer '{}' is not among its options",
                self.id, self.correct_answer
            )));
        }

        self.options = options;
        Ok(())
    }
}

/// DTO for sending a question to the client. Deliberately has no
/// `correct_answer` field: the question-fetch path can never leak the key.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub subject: String,
    pub grade: String,
    #[serde(rename = "question")]
    pub text: String,
    pub options: BTreeMap<String, String>,
}

impl From<&Question> for PublicQuestion {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id,
            subject: question.subject.clone(),
            grade: question.grade.clone(),
            text: question.text.clone(),
            options: question.options.clone(),
        }
    }
}

/// Response for the question-fetch operation. `question_number` is 1-based
/// for display.
#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub question: PublicQuestion,
    pub question_number: usize,
    pub total_questions: usize,
}
