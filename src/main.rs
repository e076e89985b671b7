// src/main.rs

use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dotenvy::dotenv;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use quizcore::config::Config;
use quizcore::error::AppError;
use quizcore::models::attempt::SubmitAnswerRequest;
use quizcore::models::session::StartQuizRequest;
use quizcore::repository::QuestionRepository;
use quizcore::service::QuizService;
use quizcore::store::SqliteResultsStore;

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Open the results store with a bounded retry on a busy database file
    let mut retry_count = 0;
    let store = loop {
        match SqliteResultsStore::connect(&config.database_url).await {
            Ok(store) => break store,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to open results store after 5 retries: {}", e);
                }
                tracing::warn!(
                    "Results store not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };
    tracing::info!("Results store ready ({})", config.database_url);

    // Load and validate the question bank
    let repository = match QuestionRepository::from_json_file(&config.questions_path) {
        Ok(repository) => repository,
        Err(e) => {
            tracing::error!("Failed to load question bank: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Question bank loaded: {} questions, {} subjects, {} grades (filter policy: {})",
        repository.len(),
        repository.subjects().len() - 1,
        repository.grades().len() - 1,
        config.filter_policy
    );

    let mut service = QuizService::new(
        Arc::new(repository),
        Arc::new(store),
        config.filter_policy,
    );

    loop {
        if let Err(e) = run_quiz(&mut service).await {
            eprintln!("quiz aborted: {e}");
        }
        let again = prompt("\nPlay again? [y/N] ").unwrap_or_default();
        if !again.eq_ignore_ascii_case("y") {
            break;
        }
    }
}

/// Drives one full quiz over stdin/stdout, standing in for the request
/// layer: every service operation is exercised end to end.
async fn run_quiz(service: &mut QuizService) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n=== Quiz ===");
    println!("Subjects: {}", service.subjects().join(", "));
    println!("Grades:   {}", service.grades().join(", "));

    let user_name = prompt("Your name: ")?;
    let subject = or_all(prompt("Subject [all]: ")?);
    let grade = or_all(prompt("Grade [all]: ")?);
    let num_questions = prompt("Number of questions [10]: ")?
        .parse::<u32>()
        .unwrap_or(10);

    // The opaque per-user handle normally issued by the request layer.
    let session_id = Uuid::new_v4().to_string();

    let started = match service.start_session(
        &session_id,
        StartQuizRequest {
            user_name,
            subject,
            grade,
            num_questions,
        },
    ) {
        Ok(started) => started,
        Err(e @ (AppError::Validation(_) | AppError::NoQuestionsFound(_))) => {
            println!("{e}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    println!("\n{} questions selected. Good luck!\n", started.total_questions);

    for index in 0..started.total_questions {
        let fetched = service.get_question(&session_id, index)?;
        println!(
            "Question {}/{}: {}",
            fetched.question_number, fetched.total_questions, fetched.question.text
        );
        for (label, text) in &fetched.question.options {
            println!("  {}) {}", label, text);
        }

        let asked_at = Instant::now();
        let answer = loop {
            let answer = prompt("Your answer: ")?;
            if !answer.is_empty() {
                break answer;
            }
        };
        let time_spent = asked_at.elapsed().as_secs() as i64;

        let feedback = service.submit_answer(
            &session_id,
            SubmitAnswerRequest {
                index,
                answer,
                time_spent,
            },
        )?;
        if feedback.is_correct {
            println!("Correct!\n");
        } else {
            println!("Wrong. {}\n", feedback.explanation);
        }
    }

    let finished = service.finish_session(&session_id).await?;
    let results = &finished.results;
    println!("=== Results for {} ===", results.user_name);
    println!(
        "Score: {}/{} ({:.1}%) - grade {}",
        results.correct_count,
        results.total_questions,
        results.score_percentage,
        results.letter_grade
    );
    println!("Time taken: {}s", results.time_taken_seconds);
    match finished.result_id {
        Some(result_id) => println!("Saved as result #{result_id}"),
        None => println!("Result could not be saved, but your score stands."),
    }

    let stats = service.aggregate_stats().await?;
    println!(
        "\nAll-time: {} sessions, average score {:.1}% ({} questions in the bank)",
        stats.stats.total_sessions, stats.stats.average_score, stats.total_questions
    );

    Ok(())
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn or_all(value: String) -> String {
    if value.is_empty() {
        "all".to_string()
    } else {
        value
    }
}
