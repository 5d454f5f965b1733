//! The store contract.
//!
//! The trait is runtime-independent and returns boxed futures, allowing the
//! caller to spawn them however it wants. This keeps it mockable for testing.

use futures::future::BoxFuture;
use qbank_core::{
    Difficulty, NewQuestion, Question, QuestionChanges, QuestionId, QuestionType, StoreError,
};

/// Page and filter parameters for `QuestionStore::list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// 1-based page number.
    pub page: usize,
    pub page_size: usize,
    pub question_type: Option<QuestionType>,
    pub difficulty: Option<Difficulty>,
    /// Case-insensitive substring of the content.
    pub keyword: Option<String>,
}

impl ListQuery {
    /// First page, no filters.
    pub fn first_page(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size,
            question_type: None,
            difficulty: None,
            keyword: None,
        }
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self::first_page(20)
    }
}

/// Persistence collaborator for questions.
///
/// Any call may fail with a `StoreError`. Implementations own timestamps:
/// `create` sets both, `update` refreshes `updated_at`.
pub trait QuestionStore: Send + Sync {
    /// List questions for one page, newest first.
    fn list(&self, query: ListQuery) -> BoxFuture<'static, Result<Vec<Question>, StoreError>>;

    /// Fetch one question. Fails if the id is unknown.
    fn get(&self, id: QuestionId) -> BoxFuture<'static, Result<Question, StoreError>>;

    /// Persist a new question and return it with id and timestamps assigned.
    fn create(&self, fields: NewQuestion) -> BoxFuture<'static, Result<Question, StoreError>>;

    /// Apply changes to an existing question. Fails if the id is unknown.
    fn update(
        &self,
        id: QuestionId,
        changes: QuestionChanges,
    ) -> BoxFuture<'static, Result<Question, StoreError>>;

    /// Delete a question. Fails if the id is unknown.
    fn delete(&self, id: QuestionId) -> BoxFuture<'static, Result<(), StoreError>>;
}
