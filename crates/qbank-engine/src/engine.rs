//! Question List Engine
//!
//! The `QuestionListEngine` owns the in-memory question list and turns user
//! intents into state transitions:
//! - Reload with change detection
//! - Debounced search text, immediate type/difficulty/tag/sort filters
//! - Multi-selection
//! - Optimistic single and batch delete with reconciliation on failure
//!
//! ## Delete Flow
//!
//! ```text
//! delete intent
//!      │
//!      ▼
//! remove from cache ──► recompute ──► broadcast   (UI updates now)
//!      │
//!      ▼
//! store.delete(id) for each id, in order
//!      │
//!   ┌──┴───────┐
//!   ▼          ▼
//! all ok     any failure
//!   │          │
//!   ▼          ▼
//! transient  last_error + full reload
//! notice
//! ```
//!
//! ## Reactive State
//!
//! All state lives in an `ObservableState`; subscribe via `subscribe()`.
//! Store calls run without holding the state lock and only their results
//! are applied back, so overlapping requests are tolerated.
//!
//! Timers (search debounce, notification expiry) are spawned onto the
//! ambient Tokio runtime, so intents must be issued from within one.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use qbank_core::{
    Difficulty, EngineConfig, EngineError, NewQuestion, Question, QuestionChanges, QuestionId,
    QuestionType, StoreError,
};
use qbank_store::{ListQuery, QuestionService, QuestionStore};
use tokio::sync::watch;

use crate::observable::ObservableState;
use crate::pipeline::{Section, SortOption};
use crate::state::{EngineSnapshot, EngineState, Notification, NotificationKind, ReloadOutcome};

// =============================================================================
// Question List Engine
// =============================================================================

/// Cheaply cloneable handle to the list engine.
///
/// Clones share state; timers hold a clone until they fire.
#[derive(Clone)]
pub struct QuestionListEngine {
    inner: Arc<Inner>,
}

struct Inner {
    service: QuestionService,
    config: EngineConfig,
    state: ObservableState,
}

impl QuestionListEngine {
    /// Create an engine over `store`. Nothing is loaded until `reload()`.
    pub fn new(store: Arc<dyn QuestionStore>, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                service: QuestionService::new(store),
                config,
                state: ObservableState::new(EngineState::new()),
            }),
        }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Subscribe to state snapshots.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.inner.state.subscribe()
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.inner.state.current()
    }

    pub fn visible_questions(&self) -> Vec<Question> {
        self.inner.state.read(|s| s.visible.clone())
    }

    /// The unfiltered cache, in store order.
    pub fn all_questions(&self) -> Vec<Question> {
        self.inner.state.read(|s| s.all.clone())
    }

    pub fn sections(&self) -> Vec<Section> {
        self.inner.state.read(|s| s.sections.clone())
    }

    pub fn available_tags(&self) -> Vec<String> {
        self.inner.state.read(|s| s.available_tags.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.read(EngineState::is_loading)
    }

    pub fn last_error(&self) -> Option<EngineError> {
        self.inner.state.read(|s| s.last_error.clone())
    }

    pub fn notification(&self) -> Option<Notification> {
        self.inner.state.read(|s| s.notification.clone())
    }

    pub fn is_multi_selection_mode(&self) -> bool {
        self.inner.state.read(|s| s.selection.is_multi())
    }

    pub fn selected_ids(&self) -> BTreeSet<QuestionId> {
        self.inner.state.read(|s| s.selection.ids().clone())
    }

    pub fn is_selected(&self, id: &QuestionId) -> bool {
        self.inner.state.read(|s| s.selection.is_selected(id))
    }

    pub fn selected_count(&self) -> usize {
        self.inner.state.read(|s| s.selection.len())
    }

    /// Number of pipeline runs so far.
    pub fn revision(&self) -> u64 {
        self.inner.state.read(|s| s.revision)
    }

    /// Clear `last_error` once the user has seen it.
    pub fn dismiss_error(&self) {
        self.inner.state.update_if(|s| s.last_error.take().is_some());
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetch the first page from the store and adopt it if it changed.
    ///
    /// On failure the cached list is kept and the error is recorded.
    pub async fn reload(&self) -> Result<ReloadOutcome, EngineError> {
        let epoch = self.inner.state.update(EngineState::begin_reload);
        let query = ListQuery::first_page(self.inner.config.page_size);

        match self.inner.service.list(query).await {
            Ok(questions) => Ok(self
                .inner
                .state
                .update(|s| s.finish_reload(epoch, questions))),
            Err(e) => {
                tracing::warn!("Reload failed: {}", e);
                let error = EngineError::from(e);
                self.inner
                    .state
                    .update(|s| s.fail_reload(epoch, error.clone()));
                Err(error)
            }
        }
    }

    // =========================================================================
    // Filters
    // =========================================================================

    /// Set the search text. Applied after the debounce quiet period; only
    /// the last of a burst of calls takes effect.
    pub fn set_search_text(&self, text: impl Into<String>) {
        let text = text.into();
        let delay = self.inner.config.search_debounce();
        let generation = self.inner.state.update_quiet(|s| {
            s.search_generation += 1;
            s.search_generation
        });

        if delay.is_zero() {
            self.apply_search_text(generation, text);
            return;
        }

        let engine = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.apply_search_text(generation, text);
        });
    }

    fn apply_search_text(&self, generation: u64, text: String) {
        self.inner.state.update_if(|s| {
            if s.search_generation != generation {
                return false;
            }
            s.set_filters(|f| f.search_text = text)
        });
    }

    /// Filter by type; `None` shows all types.
    pub fn set_type_filter(&self, question_type: Option<QuestionType>) {
        self.inner
            .state
            .update_if(|s| s.set_filters(|f| f.question_type = question_type));
    }

    /// Filter by difficulty; `None` shows all difficulties.
    pub fn set_difficulty_filter(&self, difficulty: Option<Difficulty>) {
        self.inner
            .state
            .update_if(|s| s.set_filters(|f| f.difficulty = difficulty));
    }

    /// Add `tag` to the tag filter, or remove it if already there.
    pub fn toggle_tag(&self, tag: impl Into<String>) {
        let tag = tag.into();
        self.inner.state.update_if(|s| {
            s.set_filters(|f| {
                if !f.tags.remove(&tag) {
                    f.tags.insert(tag);
                }
            })
        });
    }

    pub fn set_sort_option(&self, sort: SortOption) {
        self.inner.state.update_if(|s| s.set_filters(|f| f.sort = sort));
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn enter_multi_selection(&self) {
        self.inner.state.update_if(|s| s.selection.enter());
    }

    /// Toggle `id`. Ignored outside multi-selection.
    pub fn toggle_selection(&self, id: QuestionId) -> bool {
        self.inner.state.update_if(|s| s.selection.toggle(id))
    }

    /// Leave multi-selection; clears every selected id.
    pub fn exit_multi_selection(&self) {
        self.inner.state.update_if(|s| {
            let was_multi = s.selection.is_multi();
            s.selection.exit();
            was_multi
        });
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Optimistically delete one question.
    pub async fn delete_one(&self, id: QuestionId) -> Result<(), EngineError> {
        self.inner
            .state
            .update(|s| s.remove_optimistically(&BTreeSet::from([id])));

        match self.inner.service.delete(id).await {
            Ok(()) => {
                tracing::info!(%id, "Question deleted");
                self.notify(NotificationKind::Deleted { count: 1 });
                Ok(())
            }
            Err(e) => Err(self.reconcile(e).await),
        }
    }

    /// Optimistically delete every selected question and leave multi-selection.
    ///
    /// Returns how many were deleted; zero if nothing was selected. Deletes
    /// run in order and stop at the first failure.
    pub async fn delete_selected(&self) -> Result<usize, EngineError> {
        let mut captured = None;
        self.inner.state.update_if(|s| {
            captured = s.take_selection_for_delete();
            captured.is_some()
        });
        let Some(ids) = captured else {
            return Ok(0);
        };

        for id in &ids {
            if let Err(e) = self.inner.service.delete(*id).await {
                return Err(self.reconcile(e).await);
            }
        }

        tracing::info!(count = ids.len(), "Batch delete complete");
        self.notify(NotificationKind::Deleted { count: ids.len() });
        Ok(ids.len())
    }

    /// Surface a failed write and resynchronize with the store.
    async fn reconcile(&self, e: StoreError) -> EngineError {
        tracing::warn!("Delete failed, reloading: {}", e);
        let error = EngineError::from(e);
        self.record_error(error.clone());
        if let Err(reload_error) = self.reload().await {
            tracing::warn!("Reconciliation reload failed: {}", reload_error);
        }
        error
    }

    fn record_error(&self, error: EngineError) {
        self.inner.state.update(|s| s.last_error = Some(error));
    }

    /// Show a notification and schedule its expiry.
    fn notify(&self, kind: NotificationKind) {
        let id = self.inner.state.update(|s| s.show_notification(kind));
        let duration: Duration = self.inner.config.notification_duration();

        let engine = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            engine
                .inner
                .state
                .update_if(|s| s.expire_notification(id));
        });
    }

    // =========================================================================
    // Create / Update
    // =========================================================================

    /// Validate and create a question, then reload.
    pub async fn create_question(&self, fields: NewQuestion) -> Result<Question, EngineError> {
        let created = self.inner.service.create(fields).await;
        self.after_write(created).await
    }

    /// Validate and update a question, then reload.
    pub async fn update_question(
        &self,
        id: QuestionId,
        changes: QuestionChanges,
    ) -> Result<Question, EngineError> {
        let updated = self.inner.service.update(id, changes).await;
        self.after_write(updated).await
    }

    async fn after_write(
        &self,
        result: Result<Question, EngineError>,
    ) -> Result<Question, EngineError> {
        match result {
            Ok(question) => {
                if let Err(e) = self.reload().await {
                    tracing::warn!("Reload after write failed: {}", e);
                }
                Ok(question)
            }
            Err(e) => {
                self.record_error(e.clone());
                Err(e)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
