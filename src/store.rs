// src/store.rs

use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::AppError;
use crate::models::attempt::Attempt;
use crate::models::result::{AggregateStats, FinishedResult};

/// Durable, append-only persistence for finished sessions. The narrow seam
/// between the session core and storage: the core never sees SQL.
#[async_trait]
pub trait ResultsStore: Send + Sync {
    /// Appends one summary row plus one row per attempt, atomically, and
    /// returns the new result id. One write attempt; the finish path owns
    /// the bounded retry.
    async fn record(&self, result: &FinishedResult, attempts: &[Attempt])
    -> Result<i64, AppError>;

    /// Read-only aggregation over every recorded summary.
    async fn aggregate_stats(&self) -> Result<AggregateStats, AppError>;
}

/// SQLite-backed results store.
pub struct SqliteResultsStore {
    pool: SqlitePool,
}

impl SqliteResultsStore {
    /// Connects (creating the database file if missing) and applies
    /// migrations. A single connection is used throughout: SQLite is
    /// single-writer, and in-memory databases exist per connection.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Persistence(e.to_string()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl ResultsStore for SqliteResultsStore {
    async fn record(
        &self,
        result: &FinishedResult,
        attempts: &[Attempt],
    ) -> Result<i64, AppError> {
        // One transaction for the summary and its attempts: a crash between
        // the writes leaves neither visible.
        let mut tx = self.pool.begin().await?;

        let summary = sqlx::query(
            "INSERT INTO quiz_sessions \
             (user_name, subject, grade, total_questions, correct_answers, score_percentage, time_taken) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&result.user_name)
        .bind(&result.subject)
        .bind(&result.grade)
        .bind(result.total_questions as i64)
        .bind(result.correct_count as i64)
        .bind(result.score_percentage)
        .bind(result.time_taken_seconds)
        .execute(&mut *tx)
        .await?;

        let result_id = summary.last_insert_rowid();

        for attempt in attempts {
            sqlx::query(
                "INSERT INTO question_attempts \
                 (session_id, question_id, user_answer, correct_answer, is_correct, time_spent) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(result_id)
            .bind(attempt.question_id)
            .bind(&attempt.user_answer)
            .bind(&attempt.correct_answer)
            .bind(attempt.is_correct)
            .bind(attempt.time_spent)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(result_id)
    }

    async fn aggregate_stats(&self) -> Result<AggregateStats, AppError> {
        let (total_sessions, average): (i64, Option<f64>) =
            sqlx::query_as("SELECT COUNT(*), AVG(score_percentage) FROM quiz_sessions")
                .fetch_one(&self.pool)
                .await?;

        let rows: Vec<(String, Option<f64>)> = sqlx::query_as(
            "SELECT subject, AVG(score_percentage) FROM quiz_sessions GROUP BY subject",
        )
        .fetch_all(&self.pool)
        .await?;

        let per_subject_average: BTreeMap<String, f64> = rows
            .into_iter()
            .map(|(subject, avg)| (subject, round1(avg.unwrap_or(0.0))))
            .collect();

        Ok(AggregateStats {
            total_sessions,
            // AVG over zero rows is NULL; an empty store averages 0.
            average_score: round1(average.unwrap_or(0.0)),
            per_subject_average,
        })
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
