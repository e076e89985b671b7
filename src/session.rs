// src/session.rs

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::attempt::Attempt;
use crate::models::question::Question;

/// Lifecycle of one quiz session. `Finished` is terminal; the manager drops
/// the session as soon as the result has been extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    InProgress,
    Finished,
}

/// One user's in-progress quiz: a snapshot of the selected questions plus an
/// append-only answer log. Later changes to the repository never affect a
/// running session, and each question position accepts exactly one answer.
#[derive(Debug)]
pub struct QuizSession {
    pub user_name: String,
    pub subject: String,
    pub grade: String,
    questions: Vec<Question>,
    answers: Vec<Attempt>,
    answered: HashSet<usize>,
    start_time: DateTime<Utc>,
    state: SessionState,
}

impl QuizSession {
    pub fn new(
        user_name: String,
        subject: String,
        grade: String,
        questions: Vec<Question>,
    ) -> Self {
        Self {
            user_name,
            subject,
            grade,
            questions,
            answers: Vec::new(),
            answered: HashSet::new(),
            start_time: Utc::now(),
            state: SessionState::Created,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn question(&self, index: usize) -> Result<&Question, AppError> {
        self.questions.get(index).ok_or(AppError::IndexOutOfRange {
            index,
            total: self.questions.len(),
        })
    }

    /// Records one answer. The submitted label is normalized (trimmed,
    /// lower-cased) before comparison; correctness is decided here, against
    /// the snapshot, never re-derived later. Answering the same position
    /// twice is rejected: the log is append-only.
    pub fn submit(
        &mut self,
        index: usize,
        answer: &str,
        time_spent: i64,
    ) -> Result<Attempt, AppError> {
        if self.state == SessionState::Finished {
            return Err(AppError::NoActiveSession);
        }
        if index >= self.questions.len() {
            return Err(AppError::IndexOutOfRange {
                index,
                total: self.questions.len(),
            });
        }
        if !self.answered.insert(index) {
            return Err(AppError::Validation(format!(
                "question {} has already been answered",
                index + 1
            )));
        }

        let question = &self.questions[index];
        let user_answer = answer.trim().to_lowercase();
        let attempt = Attempt {
            question_id: question.id,
            is_correct: user_answer == question.correct_answer,
            user_answer,
            correct_answer: question.correct_answer.clone(),
            time_spent,
        };

        self.answers.push(attempt.clone());
        if self.state == SessionState::Created {
            self.state = SessionState::InProgress;
        }
        Ok(attempt)
    }

    pub fn answers(&self) -> &[Attempt] {
        &self.answers
    }

    /// Whole seconds since the session was started.
    pub fn elapsed_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }

    /// Terminal transition. Valid from any state: finishing with zero
    /// answers is allowed and scores as 0%.
    pub fn mark_finished(&mut self) {
        self.state = SessionState::Finished;
    }
}

/// Explicit session-id -> session map, replacing ambient per-process state.
/// Keys are opaque correlation handles issued by the surrounding request
/// layer; distinct handles touch disjoint sessions.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<String, QuizSession>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a session, replacing any prior active session for the same
    /// handle: at most one active quiz per handle.
    pub fn insert(&mut self, session_id: &str, session: QuizSession) {
        self.sessions.insert(session_id.to_string(), session);
    }

    pub fn get(&self, session_id: &str) -> Result<&QuizSession, AppError> {
        self.sessions.get(session_id).ok_or(AppError::NoActiveSession)
    }

    pub fn get_mut(&mut self, session_id: &str) -> Result<&mut QuizSession, AppError> {
        self.sessions
            .get_mut(session_id)
            .ok_or(AppError::NoActiveSession)
    }

    /// Removes and returns a session; a second call for the same handle
    /// reports `NoActiveSession` rather than recomputing anything.
    pub fn remove(&mut self, session_id: &str) -> Result<QuizSession, AppError> {
        self.sessions
            .remove(session_id)
            .ok_or(AppError::NoActiveSession)
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}
