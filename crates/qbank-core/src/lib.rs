//! Core types for the QBrush question bank.
//!
//! This crate contains shared data structures that are used across all QBrush crates:
//! - The `Question` entity and its identifier
//! - Question type and difficulty enumerations
//! - Create/update field sets
//! - Configuration types
//! - Error types

mod config;
mod error;
mod question;

pub use config::{config_dir, config_path, EngineConfig};
pub use error::{ConfigError, EngineError, StoreError, ValidationError};
pub use question::{
    split_tags, Difficulty, NewQuestion, Question, QuestionChanges, QuestionId, QuestionType,
};
