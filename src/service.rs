// src/service.rs

use std::sync::Arc;

use validator::Validate;

use crate::config::FilterPolicy;
use crate::error::AppError;
use crate::models::attempt::{SubmitAnswerRequest, SubmitAnswerResponse};
use crate::models::question::{PublicQuestion, QuestionResponse};
use crate::models::result::{FinishResponse, StatsResponse};
use crate::models::session::{StartQuizRequest, StartQuizResponse};
use crate::repository::QuestionRepository;
use crate::scoring;
use crate::session::{QuizSession, SessionManager};
use crate::store::ResultsStore;

/// The operation surface the surrounding request layer consumes: start,
/// fetch, answer, finish, stats. Owns the session map; the repository and
/// the results store are shared collaborators behind narrow interfaces.
///
/// Sessions are keyed by an opaque handle issued by the caller. Two requests
/// with different handles touch disjoint sessions; concurrent requests with
/// the *same* handle race (last write wins). That is accepted: realistic
/// usage is one client per handle.
pub struct QuizService {
    repository: Arc<QuestionRepository>,
    sessions: SessionManager,
    store: Arc<dyn ResultsStore>,
    filter_policy: FilterPolicy,
}

impl QuizService {
    pub fn new(
        repository: Arc<QuestionRepository>,
        store: Arc<dyn ResultsStore>,
        filter_policy: FilterPolicy,
    ) -> Self {
        Self {
            repository,
            sessions: SessionManager::new(),
            store,
            filter_policy,
        }
    }

    /// Starts a new quiz for the given handle, replacing any quiz already
    /// active under it. Questions are snapshotted into the session; the
    /// repository can change afterwards without affecting it.
    pub fn start_session(
        &mut self,
        session_id: &str,
        req: StartQuizRequest,
    ) -> Result<StartQuizResponse, AppError> {
        req.validate()?;

        let questions = self.repository.filter(
            Some(&req.subject),
            Some(&req.grade),
            req.num_questions as usize,
            self.filter_policy,
        )?;

        let session = QuizSession::new(
            req.user_name.trim().to_string(),
            req.subject,
            req.grade,
            questions,
        );
        let total_questions = session.total_questions();

        tracing::info!(
            user_name = %session.user_name,
            subject = %session.subject,
            grade = %session.grade,
            total_questions,
            "quiz session started"
        );
        self.sessions.insert(session_id, session);

        Ok(StartQuizResponse { total_questions })
    }

    /// Fetches one question by 0-based position. The response is built from
    /// `PublicQuestion`, which has no correct-answer field to leak.
    pub fn get_question(
        &self,
        session_id: &str,
        index: usize,
    ) -> Result<QuestionResponse, AppError> {
        let session = self.sessions.get(session_id)?;
        let question = session.question(index)?;

        Ok(QuestionResponse {
            question: PublicQuestion::from(question),
            question_number: index + 1,
            total_questions: session.total_questions(),
        })
    }

    /// Submits one answer and returns immediate feedback with the correct
    /// option's text. Each position accepts a single answer.
    pub fn submit_answer(
        &mut self,
        session_id: &str,
        req: SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse, AppError> {
        req.validate()?;

        let session = self.sessions.get_mut(session_id)?;
        let attempt = session.submit(req.index, &req.answer, req.time_spent)?;

        let display_label = attempt.correct_answer.to_uppercase();
        let question = session.question(req.index)?;
        // Validated banks always have the label; fall back to the bare
        // label rather than failing the whole submission if they don't.
        let explanation = match question.options.get(&attempt.correct_answer) {
            Some(text) => format!("The correct answer is {display_label}: {text}"),
            None => {
                tracing::warn!(
                    question_id = question.id,
                    label = %attempt.correct_answer,
                    "correct answer label missing from options"
                );
                format!("The correct answer is {display_label}")
            }
        };

        Ok(SubmitAnswerResponse {
            is_correct: attempt.is_correct,
            correct_answer: display_label,
            explanation,
        })
    }

    /// Finishes the quiz: scores the answer log, persists the outcome, and
    /// clears the session. A second finish for the same handle reports
    /// `NoActiveSession`.
    ///
    /// When the durable write fails (after its one retry) the session state
    /// is not restored; the computed result is still returned, with
    /// `result_id: None` and the failure in `storage_error`.
    pub async fn finish_session(&mut self, session_id: &str) -> Result<FinishResponse, AppError> {
        let mut session = self.sessions.remove(session_id)?;
        session.mark_finished();

        let time_taken = session.elapsed_seconds();
        let result = scoring::score(
            &session.user_name,
            &session.subject,
            &session.grade,
            session.answers(),
            time_taken,
        );

        // Bounded retry: one more write attempt on failure, then the
        // outcome is reported as a partial success instead of being lost.
        let recorded = match self.store.record(&result, session.answers()).await {
            Ok(id) => Ok(id),
            Err(first) => {
                tracing::warn!("result write failed, retrying once: {first}");
                self.store.record(&result, session.answers()).await
            }
        };

        let (result_id, storage_error) = match recorded {
            Ok(id) => (Some(id), None),
            Err(e) => {
                tracing::error!("failed to persist finished session: {e}");
                (None, Some(e.to_string()))
            }
        };

        tracing::info!(
            user_name = %result.user_name,
            correct = result.correct_count,
            total = result.total_questions,
            letter_grade = %result.letter_grade,
            persisted = result_id.is_some(),
            "quiz session finished"
        );

        Ok(FinishResponse {
            result_id,
            results: result,
            answers: session.answers().to_vec(),
            storage_error,
        })
    }

    /// Aggregate statistics over everything ever recorded, plus the size of
    /// the question bank.
    pub async fn aggregate_stats(&self) -> Result<StatsResponse, AppError> {
        let stats = self.store.aggregate_stats().await?;
        Ok(StatsResponse {
            stats,
            total_questions: self.repository.len(),
        })
    }

    pub fn subjects(&self) -> Vec<String> {
        self.repository.subjects()
    }

    pub fn grades(&self) -> Vec<String> {
        self.repository.grades()
    }
}
