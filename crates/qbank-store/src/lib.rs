//! Question store contract for the QBrush question bank.
//!
//! This crate provides:
//! - The `QuestionStore` trait the list engine consumes
//! - `InMemoryStore`, a reference store for tests and the CLI
//! - `QuestionService`, the validation layer in front of a store

pub mod memory;
pub mod service;
pub mod store;

pub use memory::InMemoryStore;
pub use service::QuestionService;
pub use store::{ListQuery, QuestionStore};
