// src/lib.rs

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod scoring;
pub mod service;
pub mod session;
pub mod store;

// Re-export specific items for convenience if needed
pub use error::AppError;
pub use service::QuizService;
