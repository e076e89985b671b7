// src/models/result.rs

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::attempt::Attempt;

/// Outcome of one finished session, produced by the scoring engine and never
/// mutated afterwards. `score_percentage` holds the unrounded value (the
/// letter grade is decided on it); serialization rounds to one decimal.
#[derive(Debug, Clone, Serialize)]
pub struct FinishedResult {
    pub user_name: String,
    pub subject: String,
    pub grade: String,
    pub total_questions: usize,
    pub correct_count: usize,
    #[serde(serialize_with = "super::round_one_decimal")]
    pub score_percentage: f64,
    pub time_taken_seconds: i64,
    pub letter_grade: char,
}

/// Response for the finish operation.
///
/// `result_id` is `None` when the durable write failed after its retry; the
/// computed outcome is still returned and the failure is surfaced in
/// `storage_error` instead of discarding the score.
#[derive(Debug, Serialize)]
pub struct FinishResponse {
    pub result_id: Option<i64>,
    pub results: FinishedResult,
    pub answers: Vec<Attempt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_error: Option<String>,
}

/// Read-only aggregation over every recorded session summary.
/// Averages are pre-rounded to one decimal; 0.0 when nothing is recorded.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateStats {
    pub total_sessions: i64,
    pub average_score: f64,
    pub per_subject_average: BTreeMap<String, f64>,
}

/// Stats surface exposed to the request layer: the stored aggregates plus
/// the size of the in-memory question bank.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: AggregateStats,
    pub total_questions: usize,
}
