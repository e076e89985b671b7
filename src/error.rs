// src/error.rs

use std::fmt;

/// Global Application Error Enum.
/// Every operation on the quiz core reports failures through this type;
/// none of the variants are process-fatal.
#[derive(Debug)]
pub enum AppError {
    /// Bad caller input: empty user name, out-of-range question count,
    /// resubmission for an already-answered question, ...
    Validation(String),

    /// The subject/grade filter matched nothing (strict policy only).
    NoQuestionsFound(String),

    /// Operation against a missing or already-finished session.
    NoActiveSession,

    /// Question index outside the session's snapshot.
    IndexOutOfRange { index: usize, total: usize },

    /// Durable write or read failed, after the bounded retry.
    Persistence(String),

    /// Server-side defect: unreadable or invalid question bank.
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "{msg}"),
            AppError::NoQuestionsFound(msg) => write!(f, "{msg}"),
            AppError::NoActiveSession => write!(f, "no active quiz session"),
            AppError::IndexOutOfRange { index, total } => {
                write!(f, "question index {index} out of range (0..{total})")
            }
            AppError::Persistence(msg) => write!(f, "persistence failure: {msg}"),
            AppError::Internal(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `sqlx::Error` into `AppError::Persistence`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
