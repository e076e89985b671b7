// tests/session_tests.rs

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use quizcore::config::FilterPolicy;
use quizcore::error::AppError;
use quizcore::models::attempt::{Attempt, SubmitAnswerRequest};
use quizcore::models::question::Question;
use quizcore::models::result::{AggregateStats, FinishedResult};
use quizcore::models::session::StartQuizRequest;
use quizcore::repository::QuestionRepository;
use quizcore::service::QuizService;
use quizcore::session::{QuizSession, SessionManager, SessionState};
use quizcore::store::{ResultsStore, SqliteResultsStore};

fn question(id: i64, subject: &str, grade: &str, correct: &str) -> Question {
    let options: BTreeMap<String, String> = ["a", "b", "c", "d"]
        .iter()
        .map(|label| (label.to_string(), format!("Option {}", label.to_uppercase())))
        .collect();

    Question {
        id,
        subject: subject.to_string(),
        grade: grade.to_string(),
        text: format!("Question {id}?"),
        options,
        correct_answer: correct.to_string(),
    }
}

/// Correct label for a fixture question, by id.
fn correct_label(question_id: i64) -> &'static str {
    match question_id {
        1 => "a",
        2 => "b",
        3 => "c",
        other => panic!("unknown fixture question {other}"),
    }
}

fn wrong_label(question_id: i64) -> &'static str {
    if correct_label(question_id) == "a" { "b" } else { "a" }
}

/// Builds a service over a three-question Math bank and a fresh in-memory
/// results store.
async fn spawn_service() -> QuizService {
    let store = SqliteResultsStore::connect("sqlite::memory:")
        .await
        .expect("in-memory store must open");
    spawn_service_with_store(Arc::new(store)).await
}

/// Store stub whose first `fail_writes` record calls fail. Counts every
/// write attempt so tests can check the bounded retry.
struct FlakyStore {
    fail_writes: usize,
    write_calls: AtomicUsize,
}

impl FlakyStore {
    fn failing(fail_writes: usize) -> Self {
        Self {
            fail_writes,
            write_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ResultsStore for FlakyStore {
    async fn record(
        &self,
        _result: &FinishedResult,
        _attempts: &[Attempt],
    ) -> Result<i64, AppError> {
        let call = self.write_calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_writes {
            return Err(AppError::Persistence("disk full".to_string()));
        }
        Ok(7)
    }

    async fn aggregate_stats(&self) -> Result<AggregateStats, AppError> {
        Ok(AggregateStats {
            total_sessions: 0,
            average_score: 0.0,
            per_subject_average: BTreeMap::new(),
        })
    }
}

async fn spawn_service_with_store(store: Arc<dyn ResultsStore>) -> QuizService {
    let repository = QuestionRepository::from_questions(vec![
        question(1, "Math", "10th", "a"),
        question(2, "Math", "10th", "b"),
        question(3, "Math", "8th", "c"),
    ])
    .expect("fixture bank must validate");

    QuizService::new(Arc::new(repository), store, FilterPolicy::Strict)
}

fn start_request(user_name: &str, num_questions: u32) -> StartQuizRequest {
    StartQuizRequest {
        user_name: user_name.to_string(),
        subject: "Math".to_string(),
        grade: "all".to_string(),
        num_questions,
    }
}

fn submit(index: usize, answer: &str, time_spent: i64) -> SubmitAnswerRequest {
    SubmitAnswerRequest {
        index,
        answer: answer.to_string(),
        time_spent,
    }
}

#[tokio::test]
async fn start_rejects_blank_user_name() {
    let mut service = spawn_service().await;

    let err = service
        .start_session("s1", start_request("   ", 3))
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn start_rejects_out_of_range_question_count() {
    let mut service = spawn_service().await;

    for count in [0, 51] {
        let err = service
            .start_session("s1", start_request("gemma", count))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "count {count}");
    }
}

#[tokio::test]
async fn start_reports_selected_question_count() {
    let mut service = spawn_service().await;

    // Limit above the pool size: all three Math questions are selected.
    let started = service
        .start_session("s1", start_request("gemma", 50))
        .unwrap();
    assert_eq!(started.total_questions, 3);
}

#[tokio::test]
async fn operations_without_a_session_report_not_found() {
    let mut service = spawn_service().await;

    assert!(matches!(
        service.get_question("ghost", 0).unwrap_err(),
        AppError::NoActiveSession
    ));
    assert!(matches!(
        service.submit_answer("ghost", submit(0, "a", 1)).unwrap_err(),
        AppError::NoActiveSession
    ));
    assert!(matches!(
        service.finish_session("ghost").await.unwrap_err(),
        AppError::NoActiveSession
    ));
}

#[tokio::test]
async fn get_question_checks_the_index() {
    let mut service = spawn_service().await;
    service
        .start_session("s1", start_request("gemma", 3))
        .unwrap();

    let err = service.get_question("s1", 3).unwrap_err();
    assert!(matches!(
        err,
        AppError::IndexOutOfRange { index: 3, total: 3 }
    ));
}

#[tokio::test]
async fn question_response_never_leaks_the_answer() {
    let mut service = spawn_service().await;
    service
        .start_session("s1", start_request("gemma", 3))
        .unwrap();

    for index in 0..3 {
        let fetched = service.get_question("s1", index).unwrap();
        assert_eq!(fetched.question_number, index + 1);
        assert_eq!(fetched.total_questions, 3);

        let json = serde_json::to_value(&fetched).unwrap();
        let question = json["question"].as_object().unwrap();
        assert!(!question.contains_key("correct_answer"));
    }
}

#[tokio::test]
async fn answers_are_normalized_before_comparison() {
    let mut service = spawn_service().await;
    service
        .start_session("s1", start_request("gemma", 3))
        .unwrap();

    let question_id = service.get_question("s1", 0).unwrap().question.id;
    let shouting = correct_label(question_id).to_uppercase();

    let feedback = service
        .submit_answer("s1", submit(0, &format!("  {shouting} "), 4))
        .unwrap();
    assert!(feedback.is_correct);
    assert_eq!(feedback.correct_answer, shouting);
}

#[tokio::test]
async fn feedback_includes_the_correct_option_text() {
    let mut service = spawn_service().await;
    service
        .start_session("s1", start_request("gemma", 3))
        .unwrap();

    let question_id = service.get_question("s1", 0).unwrap().question.id;
    let feedback = service
        .submit_answer("s1", submit(0, wrong_label(question_id), 4))
        .unwrap();

    let label = correct_label(question_id).to_uppercase();
    assert!(!feedback.is_correct);
    assert_eq!(
        feedback.explanation,
        format!("The correct answer is {label}: Option {label}")
    );
}

#[tokio::test]
async fn resubmission_for_an_answered_position_is_rejected() {
    let mut service = spawn_service().await;
    service
        .start_session("s1", start_request("gemma", 3))
        .unwrap();

    service.submit_answer("s1", submit(0, "a", 2)).unwrap();
    let err = service.submit_answer("s1", submit(0, "b", 2)).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn full_quiz_round_trip_scores_and_persists() {
    let mut service = spawn_service().await;
    service
        .start_session("s1", start_request("gemma", 3))
        .unwrap();

    // Answer correctly for positions 0 and 2, wrongly for position 1,
    // with client-reported time deltas of 5, 10 and 7 seconds.
    for (index, correct, time_spent) in [(0, true, 5), (1, false, 10), (2, true, 7)] {
        let question_id = service.get_question("s1", index).unwrap().question.id;
        let answer = if correct {
            correct_label(question_id)
        } else {
            wrong_label(question_id)
        };
        let feedback = service
            .submit_answer("s1", submit(index, answer, time_spent))
            .unwrap();
        assert_eq!(feedback.is_correct, correct);
    }

    let finished = service.finish_session("s1").await.unwrap();
    let results = &finished.results;

    assert_eq!(results.correct_count, 2);
    assert_eq!(results.total_questions, 3);
    assert!((results.score_percentage - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(results.letter_grade, 'D');
    assert!(results.time_taken_seconds >= 0);

    assert!(finished.result_id.is_some());
    assert!(finished.storage_error.is_none());
    assert_eq!(finished.answers.len(), 3);
    assert_eq!(
        finished.answers.iter().filter(|a| a.is_correct).count(),
        results.correct_count
    );
    let time_spents: Vec<i64> = finished.answers.iter().map(|a| a.time_spent).collect();
    assert_eq!(time_spents, [5, 10, 7]);

    let json = serde_json::to_value(&finished).unwrap();
    assert_eq!(json["results"]["score_percentage"], serde_json::json!(66.7));
}

#[tokio::test]
async fn finishing_with_no_answers_scores_zero() {
    let mut service = spawn_service().await;
    service
        .start_session("s1", start_request("gemma", 3))
        .unwrap();

    let finished = service.finish_session("s1").await.unwrap();
    assert_eq!(finished.results.correct_count, 0);
    assert_eq!(finished.results.total_questions, 0);
    assert_eq!(finished.results.score_percentage, 0.0);
    assert_eq!(finished.results.letter_grade, 'F');
}

#[tokio::test]
async fn finish_clears_the_session_and_is_not_recomputed() {
    let mut service = spawn_service().await;
    service
        .start_session("s1", start_request("gemma", 3))
        .unwrap();

    service.finish_session("s1").await.unwrap();
    let err = service.finish_session("s1").await.unwrap_err();
    assert!(matches!(err, AppError::NoActiveSession));
}

#[tokio::test]
async fn starting_again_replaces_the_active_session() {
    let mut service = spawn_service().await;
    service
        .start_session("s1", start_request("gemma", 3))
        .unwrap();
    service.submit_answer("s1", submit(0, "a", 2)).unwrap();

    // A second start under the same handle discards the in-flight quiz.
    service
        .start_session("s1", start_request("gemma", 2))
        .unwrap();

    let finished = service.finish_session("s1").await.unwrap();
    assert_eq!(finished.answers.len(), 0);
}

#[tokio::test]
async fn sessions_under_different_handles_are_disjoint() {
    let mut service = spawn_service().await;
    service
        .start_session("s1", start_request("ada", 3))
        .unwrap();
    service
        .start_session("s2", start_request("grace", 3))
        .unwrap();

    service.submit_answer("s1", submit(0, "a", 1)).unwrap();

    // s2 has its own untouched log for the same position.
    service.submit_answer("s2", submit(0, "a", 1)).unwrap();
    let finished = service.finish_session("s2").await.unwrap();
    assert_eq!(finished.answers.len(), 1);
}

#[tokio::test]
async fn aggregate_stats_average_recorded_sessions() {
    let mut service = spawn_service().await;

    // Before anything is recorded: explicit zero guards.
    let empty = service.aggregate_stats().await.unwrap();
    assert_eq!(empty.stats.total_sessions, 0);
    assert_eq!(empty.stats.average_score, 0.0);
    assert!(empty.stats.per_subject_average.is_empty());
    assert_eq!(empty.total_questions, 3);

    // One perfect single-question quiz, one failed one: average is 50.0.
    for (handle, correct) in [("s1", true), ("s2", false)] {
        service
            .start_session(handle, start_request("gemma", 1))
            .unwrap();
        let question_id = service.get_question(handle, 0).unwrap().question.id;
        let answer = if correct {
            correct_label(question_id)
        } else {
            wrong_label(question_id)
        };
        service.submit_answer(handle, submit(0, answer, 3)).unwrap();
        service.finish_session(handle).await.unwrap();
    }

    let stats = service.aggregate_stats().await.unwrap();
    assert_eq!(stats.stats.total_sessions, 2);
    assert_eq!(stats.stats.average_score, 50.0);
    assert_eq!(stats.stats.per_subject_average.get("Math"), Some(&50.0));
}

#[tokio::test]
async fn finish_survives_persistence_failure_as_partial_success() {
    let store = Arc::new(FlakyStore::failing(usize::MAX));
    let mut service = spawn_service_with_store(store.clone()).await;

    service
        .start_session("s1", start_request("gemma", 3))
        .unwrap();
    let question_id = service.get_question("s1", 0).unwrap().question.id;
    service
        .submit_answer("s1", submit(0, correct_label(question_id), 4))
        .unwrap();

    // The write fails both times, but the computed outcome still comes back.
    let finished = service.finish_session("s1").await.unwrap();
    assert_eq!(finished.result_id, None);
    let storage_error = finished.storage_error.expect("failure must be surfaced");
    assert!(storage_error.contains("disk full"));
    assert_eq!(finished.results.correct_count, 1);
    assert_eq!(finished.results.total_questions, 1);
    assert_eq!(finished.results.letter_grade, 'A');

    // Exactly two attempts: the retry is bounded.
    assert_eq!(store.write_calls.load(Ordering::SeqCst), 2);

    // The session is cleared even though nothing was stored.
    assert!(matches!(
        service.finish_session("s1").await.unwrap_err(),
        AppError::NoActiveSession
    ));
}

#[tokio::test]
async fn finish_retry_recovers_from_a_single_write_failure() {
    let store = Arc::new(FlakyStore::failing(1));
    let mut service = spawn_service_with_store(store.clone()).await;

    service
        .start_session("s1", start_request("gemma", 1))
        .unwrap();

    let finished = service.finish_session("s1").await.unwrap();
    assert_eq!(finished.result_id, Some(7));
    assert!(finished.storage_error.is_none());
    assert_eq!(store.write_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn manager_keeps_one_session_per_handle() {
    let questions = vec![question(1, "Math", "10th", "a")];
    let session = |name: &str| {
        QuizSession::new(
            name.to_string(),
            "Math".to_string(),
            "all".to_string(),
            questions.clone(),
        )
    };

    let mut manager = SessionManager::new();
    assert_eq!(manager.active_count(), 0);

    manager.insert("s1", session("ada"));
    manager.insert("s1", session("grace"));
    assert_eq!(manager.active_count(), 1);
    assert_eq!(manager.get("s1").unwrap().user_name, "grace");

    manager.insert("s2", session("ada"));
    assert_eq!(manager.active_count(), 2);

    manager.remove("s1").unwrap();
    assert_eq!(manager.active_count(), 1);
}

#[tokio::test]
async fn session_state_machine_transitions() {
    let questions = vec![question(1, "Math", "10th", "a")];
    let repository = QuestionRepository::from_questions(questions).unwrap();
    let snapshot = repository
        .filter(None, None, 1, FilterPolicy::Strict)
        .unwrap();

    let mut session = QuizSession::new(
        "gemma".to_string(),
        "Math".to_string(),
        "all".to_string(),
        snapshot,
    );
    assert_eq!(session.state(), SessionState::Created);

    session.submit(0, "a", 1).unwrap();
    assert_eq!(session.state(), SessionState::InProgress);

    session.mark_finished();
    assert_eq!(session.state(), SessionState::Finished);
    assert!(matches!(
        session.submit(0, "a", 1).unwrap_err(),
        AppError::NoActiveSession
    ));
}
