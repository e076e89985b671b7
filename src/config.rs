// src/config.rs

use std::env;
use std::fmt;
use std::str::FromStr;

use dotenvy::dotenv;

/// What `QuestionRepository::filter` does when subject/grade match nothing.
///
/// `Strict` reports `NoQuestionsFound`; `Fallback` silently serves a random
/// sample of the whole bank instead. Both behaviors exist in the wild, so the
/// choice is configuration rather than a hard-coded policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPolicy {
    Strict,
    Fallback,
}

impl FromStr for FilterPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(FilterPolicy::Strict),
            "fallback" => Ok(FilterPolicy::Fallback),
            other => Err(format!(
                "invalid filter policy '{other}' (expected 'strict' or 'fallback')"
            )),
        }
    }
}

impl fmt::Display for FilterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterPolicy::Strict => write!(f, "strict"),
            FilterPolicy::Fallback => write!(f, "fallback"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub questions_path: String,
    pub filter_policy: FilterPolicy,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let questions_path = env::var("QUESTIONS_PATH")
            .unwrap_or_else(|_| "data/questions.json".to_string());

        let filter_policy = match env::var("QUIZ_FILTER_POLICY") {
            Ok(raw) => raw
                .parse()
                .expect("QUIZ_FILTER_POLICY must be 'strict' or 'fallback'"),
            Err(_) => FilterPolicy::Strict,
        };

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            questions_path,
            filter_policy,
            rust_log,
        }
    }
}
