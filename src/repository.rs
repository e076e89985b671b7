// src/repository.rs

use std::collections::BTreeSet;
use std::path::Path;

use rand::seq::SliceRandom;

use crate::config::FilterPolicy;
use crate::error::AppError;
use crate::models::question::Question;

/// Sentinel meaning "do not filter on this field".
pub const ALL: &str = "all";

/// Immutable in-memory question bank, shared read-only across sessions.
/// Built once at startup; sessions snapshot the questions they select, so
/// the bank itself is never touched by in-flight quizzes.
#[derive(Debug)]
pub struct QuestionRepository {
    questions: Vec<Question>,
}

impl QuestionRepository {
    /// Loads and validates a JSON question bank.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Internal(format!(
                "failed to read question bank {}: {e}",
                path.display()
            ))
        })?;
        let questions: Vec<Question> = serde_json::from_str(&raw)?;
        Self::from_questions(questions)
    }

    /// Builds a repository from prepared questions, normalizing and
    /// validating each one. A single invalid question rejects the bank.
    pub fn from_questions(mut questions: Vec<Question>) -> Result<Self, AppError> {
        for question in &mut questions {
            question.normalize_and_validate()?;
        }
        Ok(Self { questions })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Selects up to `limit` questions matching the subject/grade filters,
    /// randomly sampled without replacement and shuffled per call.
    ///
    /// Each field is matched in two stages: case-insensitive exact match
    /// first, then case-insensitive substring match if nothing was exact.
    /// `None`, empty, or the "all" sentinel skips a field entirely. An empty
    /// combined result is handled per `policy`: `Strict` reports
    /// `NoQuestionsFound`, `Fallback` samples the unfiltered bank instead.
    pub fn filter(
        &self,
        subject: Option<&str>,
        grade: Option<&str>,
        limit: usize,
        policy: FilterPolicy,
    ) -> Result<Vec<Question>, AppError> {
        let mut matched: Vec<&Question> = self.questions.iter().collect();

        if let Some(subject) = active_filter(subject) {
            matched = narrow(matched, subject, |q| &q.subject);
        }
        if let Some(grade) = active_filter(grade) {
            matched = narrow(matched, grade, |q| &q.grade);
        }

        if matched.is_empty() {
            match policy {
                FilterPolicy::Strict => {
                    return Err(AppError::NoQuestionsFound(no_match_message(
                        subject, grade,
                    )));
                }
                FilterPolicy::Fallback => {
                    tracing::warn!(
                        subject = subject.unwrap_or(ALL),
                        grade = grade.unwrap_or(ALL),
                        "filter matched nothing, falling back to the whole bank"
                    );
                    matched = self.questions.iter().collect();
                }
            }
        }

        // An empty bank has nothing to fall back to either.
        if matched.is_empty() {
            return Err(AppError::NoQuestionsFound(no_match_message(subject, grade)));
        }

        let mut rng = rand::thread_rng();
        let mut picked: Vec<Question> = matched
            .choose_multiple(&mut rng, limit)
            .map(|&q| q.clone())
            .collect();
        // choose_multiple does not guarantee a random order.
        picked.shuffle(&mut rng);
        Ok(picked)
    }

    /// Distinct subjects, sorted, with the "all" sentinel first.
    pub fn subjects(&self) -> Vec<String> {
        distinct_with_sentinel(self.questions.iter().map(|q| q.subject.as_str()))
    }

    /// Distinct grades, sorted, with the "all" sentinel first.
    pub fn grades(&self) -> Vec<String> {
        distinct_with_sentinel(self.questions.iter().map(|q| q.grade.as_str()))
    }
}

fn active_filter(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty() && !v.trim().eq_ignore_ascii_case(ALL))
}

/// Two-stage narrowing on one field: exact match wins; substring match is
/// the fallback when no exact match exists.
fn narrow<'a, F>(pool: Vec<&'a Question>, needle: &str, field: F) -> Vec<&'a Question>
where
    F: Fn(&Question) -> &str,
{
    let needle = needle.trim().to_lowercase();

    let exact: Vec<&Question> = pool
        .iter()
        .copied()
        .filter(|q| field(q).eq_ignore_ascii_case(&needle))
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    pool.into_iter()
        .filter(|q| field(q).to_lowercase().contains(&needle))
        .collect()
}

fn no_match_message(subject: Option<&str>, grade: Option<&str>) -> String {
    format!(
        "no questions found for subject='{}', grade='{}'",
        subject.unwrap_or(ALL),
        grade.unwrap_or(ALL)
    )
}

fn distinct_with_sentinel<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    // A bank value literally named "all" must not duplicate the sentinel.
    let distinct: BTreeSet<&str> = values.filter(|v| !v.eq_ignore_ascii_case(ALL)).collect();
    let mut out = Vec::with_capacity(distinct.len() + 1);
    out.push(ALL.to_string());
    out.extend(distinct.into_iter().map(str::to_string));
    out
}
