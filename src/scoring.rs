// src/scoring.rs

use crate::models::attempt::Attempt;
use crate::models::result::FinishedResult;

/// Maps a score percentage to a letter grade. Lower bounds are inclusive
/// and the decision is made on the unrounded value, so display rounding can
/// never flip a grade across a boundary.
pub fn letter_grade(percentage: f64) -> char {
    if percentage >= 90.0 {
        'A'
    } else if percentage >= 80.0 {
        'B'
    } else if percentage >= 70.0 {
        'C'
    } else if percentage >= 60.0 {
        'D'
    } else {
        'F'
    }
}

/// Scores a finished session's answer log. Pure: reads the log, touches no
/// state. An empty log scores 0% (grade F) with no division by zero.
pub fn score(
    user_name: &str,
    subject: &str,
    grade: &str,
    log: &[Attempt],
    time_taken_seconds: i64,
) -> FinishedResult {
    let total = log.len();
    let correct = log.iter().filter(|a| a.is_correct).count();
    let percentage = if total > 0 {
        correct as f64 * 100.0 / total as f64
    } else {
        0.0
    };

    FinishedResult {
        user_name: user_name.to_string(),
        subject: subject.to_string(),
        grade: grade.to_string(),
        total_questions: total,
        correct_count: correct,
        score_percentage: percentage,
        time_taken_seconds,
        letter_grade: letter_grade(percentage),
    }
}
