//! Error types for the QBrush question bank.

use thiserror::Error;

use crate::question::QuestionId;

/// Input rejected before any store call. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Content is empty or whitespace only.
    #[error("Question content must not be empty")]
    EmptyContent,

    /// Unknown question type key.
    #[error("Invalid question type: {0}")]
    InvalidType(String),

    /// Unknown difficulty key.
    #[error("Invalid difficulty: {0}")]
    InvalidDifficulty(String),
}

/// Failure reported by a question store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No question with this id.
    #[error("Question not found: {0}")]
    NotFound(QuestionId),

    /// Underlying persistence failure.
    #[error("Storage error: {0}")]
    Backend(String),
}

/// Errors surfaced by the list engine - shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config directory found.
    #[error("Config directory not found")]
    NoConfigDir,

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),
}
