//! In-memory question store.
//!
//! Backs the CLI and the engine tests. Supports simulated latency and
//! failure injection so optimistic paths can be exercised.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use parking_lot::Mutex;
use qbank_core::{NewQuestion, Question, QuestionChanges, QuestionId, StoreError};

use crate::store::{ListQuery, QuestionStore};

/// A `QuestionStore` holding everything in a `Vec`.
///
/// Clones share the same data, so a test can keep a handle while the engine
/// owns another.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    questions: Arc<Mutex<Vec<Question>>>,
    latency: Arc<Mutex<Duration>>,
    fail_list: Arc<Mutex<Option<String>>>,
    failing_deletes: Arc<Mutex<HashSet<QuestionId>>>,
    list_calls: Arc<AtomicUsize>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store.
    pub fn with_questions(self, questions: Vec<Question>) -> Self {
        *self.questions.lock() = questions;
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(latency);
        self
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Make `list` fail with `message` until cleared with `None`.
    pub fn set_list_failure(&self, message: Option<&str>) {
        *self.fail_list.lock() = message.map(str::to_string);
    }

    /// Make `delete(id)` fail with a backend error.
    pub fn fail_delete_of(&self, id: QuestionId) {
        self.failing_deletes.lock().insert(id);
    }

    /// Snapshot of everything stored, in insertion order.
    pub fn questions(&self) -> Vec<Question> {
        self.questions.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.questions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.lock().is_empty()
    }

    /// Number of `list` calls served so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn page(questions: &[Question], query: &ListQuery) -> Vec<Question> {
        let keyword = query
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase);

        let mut matched: Vec<Question> = questions
            .iter()
            .filter(|q| query.question_type.is_none() || q.question_type == query.question_type)
            .filter(|q| query.difficulty.is_none() || q.difficulty == query.difficulty)
            .filter(|q| match &keyword {
                Some(k) => q.content.to_lowercase().contains(k),
                None => true,
            })
            .cloned()
            .collect();

        matched.sort_by_key(|q| std::cmp::Reverse(q.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC)));

        matched
            .into_iter()
            .skip(query.offset())
            .take(query.page_size)
            .collect()
    }
}

async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

impl QuestionStore for InMemoryStore {
    fn list(&self, query: ListQuery) -> BoxFuture<'static, Result<Vec<Question>, StoreError>> {
        let store = self.clone();
        let latency = *self.latency.lock();

        Box::pin(async move {
            simulate_latency(latency).await;
            store.list_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = store.fail_list.lock().clone() {
                return Err(StoreError::Backend(message));
            }
            let questions = store.questions.lock();
            Ok(Self::page(&questions, &query))
        })
    }

    fn get(&self, id: QuestionId) -> BoxFuture<'static, Result<Question, StoreError>> {
        let store = self.clone();
        let latency = *self.latency.lock();

        Box::pin(async move {
            simulate_latency(latency).await;
            store
                .questions
                .lock()
                .iter()
                .find(|q| q.id == id)
                .cloned()
                .ok_or(StoreError::NotFound(id))
        })
    }

    fn create(&self, fields: NewQuestion) -> BoxFuture<'static, Result<Question, StoreError>> {
        let store = self.clone();
        let latency = *self.latency.lock();

        Box::pin(async move {
            simulate_latency(latency).await;
            let now = Utc::now();
            let question = Question {
                id: QuestionId::new(),
                content: fields.content,
                question_type: fields.question_type,
                difficulty: Some(fields.difficulty),
                options: fields.options,
                correct_answer: fields.correct_answer,
                analysis: fields.analysis,
                tags: fields.tags,
                created_by: fields.created_by,
                created_at: Some(now),
                updated_at: Some(now),
            };
            store.questions.lock().push(question.clone());
            Ok(question)
        })
    }

    fn update(
        &self,
        id: QuestionId,
        changes: QuestionChanges,
    ) -> BoxFuture<'static, Result<Question, StoreError>> {
        let store = self.clone();
        let latency = *self.latency.lock();

        Box::pin(async move {
            simulate_latency(latency).await;
            let mut questions = store.questions.lock();
            let question = questions
                .iter_mut()
                .find(|q| q.id == id)
                .ok_or(StoreError::NotFound(id))?;
            changes.apply_to(question);
            question.updated_at = Some(Utc::now());
            Ok(question.clone())
        })
    }

    fn delete(&self, id: QuestionId) -> BoxFuture<'static, Result<(), StoreError>> {
        let store = self.clone();
        let latency = *self.latency.lock();

        Box::pin(async move {
            simulate_latency(latency).await;
            if store.failing_deletes.lock().contains(&id) {
                return Err(StoreError::Backend(format!("delete of {id} rejected")));
            }
            let mut questions = store.questions.lock();
            let index = questions
                .iter()
                .position(|q| q.id == id)
                .ok_or(StoreError::NotFound(id))?;
            questions.remove(index);
            tracing::debug!(%id, "Deleted question");
            Ok(())
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use qbank_core::{Difficulty, QuestionType};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn seeded() -> InMemoryStore {
        let mut questions = Vec::new();
        for i in 0..10 {
            questions.push(
                Question::new(format!("Choice {i} - keyword A"))
                    .of_type(QuestionType::SingleChoice)
                    .of_difficulty(Difficulty::Easy)
                    .created(at(i)),
            );
        }
        for i in 0..10 {
            questions.push(
                Question::new(format!("Blank {i} - keyword B"))
                    .of_type(QuestionType::FillBlank)
                    .of_difficulty(Difficulty::Medium)
                    .created(at(100 + i)),
            );
        }
        for i in 0..10 {
            questions.push(
                Question::new(format!("Judgment {i} - keyword A"))
                    .of_type(QuestionType::Judgment)
                    .of_difficulty(Difficulty::Hard)
                    .created(at(200 + i)),
            );
        }
        InMemoryStore::new().with_questions(questions)
    }

    fn query(page_size: usize) -> ListQuery {
        ListQuery::first_page(page_size)
    }

    #[tokio::test]
    async fn test_pagination() {
        let store = seeded();

        let page1 = store.list(query(20)).await.unwrap();
        assert_eq!(page1.len(), 20);

        let page2 = store
            .list(ListQuery {
                page: 2,
                ..query(20)
            })
            .await
            .unwrap();
        assert_eq!(page2.len(), 10);
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_newest_first() {
        let store = seeded();
        let page = store.list(query(5)).await.unwrap();
        assert_eq!(page[0].content, "Judgment 9 - keyword A");
    }

    #[tokio::test]
    async fn test_filters_compose() {
        let store = seeded();

        let choices = store
            .list(ListQuery {
                question_type: Some(QuestionType::SingleChoice),
                ..query(100)
            })
            .await
            .unwrap();
        assert_eq!(choices.len(), 10);
        assert!(choices
            .iter()
            .all(|q| q.question_type == Some(QuestionType::SingleChoice)));

        let hard = store
            .list(ListQuery {
                difficulty: Some(Difficulty::Hard),
                ..query(100)
            })
            .await
            .unwrap();
        assert_eq!(hard.len(), 10);

        let keyword = store
            .list(ListQuery {
                keyword: Some("KEYWORD a".to_string()),
                ..query(100)
            })
            .await
            .unwrap();
        assert_eq!(keyword.len(), 20);

        let combined = store
            .list(ListQuery {
                question_type: Some(QuestionType::SingleChoice),
                keyword: Some("keyword A".to_string()),
                ..query(100)
            })
            .await
            .unwrap();
        assert_eq!(combined.len(), 10);
    }

    #[tokio::test]
    async fn test_crud_workflow() {
        let store = InMemoryStore::new();

        let created = store
            .create(NewQuestion {
                content: "What is 2+2?".to_string(),
                question_type: Some(QuestionType::SingleChoice),
                correct_answer: Some("A".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(created.difficulty, Some(Difficulty::Medium));
        assert!(created.created_at.is_some());
        assert_eq!(store.len(), 1);

        let updated = store
            .update(
                created.id,
                QuestionChanges {
                    correct_answer: Some("B".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.correct_answer.as_deref(), Some("B"));
        assert!(updated.updated_at >= created.updated_at);

        let fetched = store.get(created.id).await.unwrap();
        assert_eq!(fetched, updated);

        store.delete(created.id).await.unwrap();
        assert!(store.is_empty());
        assert_eq!(
            store.get(created.id).await.unwrap_err(),
            StoreError::NotFound(created.id)
        );

        let err = store.delete(created.id).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound(created.id));
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let store = InMemoryStore::new();
        let id = QuestionId::new();
        let err = store
            .update(id, QuestionChanges::default())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound(id));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let q = Question::new("Keep me");
        let store = InMemoryStore::new().with_questions(vec![q.clone()]);

        store.fail_delete_of(q.id);
        assert!(matches!(
            store.delete(q.id).await,
            Err(StoreError::Backend(_))
        ));
        assert_eq!(store.len(), 1);

        store.set_list_failure(Some("disk on fire"));
        assert_eq!(
            store.list(query(20)).await.unwrap_err(),
            StoreError::Backend("disk on fire".to_string())
        );

        store.set_list_failure(None);
        assert_eq!(store.list(query(20)).await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency() {
        let store = InMemoryStore::new().with_latency(Duration::from_millis(50));

        let start = tokio::time::Instant::now();
        store.list(query(20)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
