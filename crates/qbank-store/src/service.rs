//! Validation layer in front of a `QuestionStore`.
//!
//! Rejects bad input before the store is touched and passes storage
//! failures through unchanged.

use std::sync::Arc;

use qbank_core::{
    EngineError, NewQuestion, Question, QuestionChanges, QuestionId, StoreError, ValidationError,
};

use crate::store::{ListQuery, QuestionStore};

/// Author recorded when a new question does not name one.
const DEFAULT_AUTHOR: &str = "admin";

/// Business rules for question CRUD.
#[derive(Clone)]
pub struct QuestionService {
    store: Arc<dyn QuestionStore>,
}

impl QuestionService {
    pub fn new(store: Arc<dyn QuestionStore>) -> Self {
        Self { store }
    }

    /// Validate and create a question.
    pub async fn create(&self, mut fields: NewQuestion) -> Result<Question, EngineError> {
        fields.content = validate_content(&fields.content)?;
        if fields.created_by.is_none() {
            fields.created_by = Some(DEFAULT_AUTHOR.to_string());
        }
        Ok(self.store.create(fields).await?)
    }

    /// Validate and apply a partial update.
    pub async fn update(
        &self,
        id: QuestionId,
        mut changes: QuestionChanges,
    ) -> Result<Question, EngineError> {
        if let Some(content) = &changes.content {
            changes.content = Some(validate_content(content)?);
        }
        Ok(self.store.update(id, changes).await?)
    }

    pub async fn get(&self, id: QuestionId) -> Result<Question, StoreError> {
        self.store.get(id).await
    }

    pub async fn list(&self, query: ListQuery) -> Result<Vec<Question>, StoreError> {
        self.store.list(query).await
    }

    pub async fn delete(&self, id: QuestionId) -> Result<(), StoreError> {
        self.store.delete(id).await
    }
}

/// Trimmed content, or `EmptyContent` if nothing is left.
fn validate_content(content: &str) -> Result<String, ValidationError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    fn service() -> (QuestionService, InMemoryStore) {
        let store = InMemoryStore::new();
        (QuestionService::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_create_rejects_blank_content() {
        let (service, store) = service();

        let err = service.create(NewQuestion::new("  \n\t")).await.unwrap_err();
        assert_eq!(err, EngineError::Validation(ValidationError::EmptyContent));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_create_trims_and_defaults_author() {
        let (service, _store) = service();

        let q = service.create(NewQuestion::new("  Capital of France?  ")).await.unwrap();
        assert_eq!(q.content, "Capital of France?");
        assert_eq!(q.created_by.as_deref(), Some("admin"));
    }

    #[tokio::test]
    async fn test_update_rejects_empty_content() {
        let (service, _store) = service();
        let q = service.create(NewQuestion::new("Original")).await.unwrap();

        let err = service
            .update(
                q.id,
                QuestionChanges {
                    content: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Validation(ValidationError::EmptyContent));
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_storage_error() {
        let (service, _store) = service();
        let id = QuestionId::new();

        let err = service
            .update(id, QuestionChanges::default())
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Storage(StoreError::NotFound(id)));
    }

    #[tokio::test]
    async fn test_get_returns_stored_question() {
        let (service, _store) = service();
        let q = service.create(NewQuestion::new("Boiling point of water?")).await.unwrap();

        let fetched = service.get(q.id).await.unwrap();
        assert_eq!(fetched.content, "Boiling point of water?");

        let missing = QuestionId::new();
        assert_eq!(
            service.get(missing).await.unwrap_err(),
            StoreError::NotFound(missing)
        );
    }
}
