// src/models/session.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

fn all_scope() -> String {
    "all".to_string()
}

fn default_question_count() -> u32 {
    10
}

/// DTO for starting a quiz. Subject and grade default to the "all" sentinel;
/// the question count is capped at 50 per session.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StartQuizRequest {
    #[validate(length(max = 100), custom(function = validate_user_name))]
    pub user_name: String,

    #[serde(default = "all_scope")]
    pub subject: String,

    #[serde(default = "all_scope")]
    pub grade: String,

    #[serde(default = "default_question_count")]
    #[validate(range(min = 1, max = 50))]
    pub num_questions: u32,
}

fn validate_user_name(name: &str) -> Result<(), validator::ValidationError> {
    if name.trim().is_empty() {
        return Err(validator::ValidationError::new("user_name_empty"));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct StartQuizResponse {
    pub total_questions: usize,
}
