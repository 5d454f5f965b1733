//! Engine state and the snapshots broadcast from it.
//!
//! `EngineState` is the single owner of everything the list shows. It is
//! runtime-independent: the async engine wraps it in an `ObservableState`
//! and only ever mutates it through the methods here, so every transition
//! can be tested synchronously.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};
use qbank_core::{EngineError, Question, QuestionId};

use crate::pipeline::{self, FilterState, Section};
use crate::selection::Selection;

// =============================================================================
// Change Detection
// =============================================================================

/// Last-seen `updated_at` per question id.
///
/// A heuristic: it misses mutations that do not move `updated_at`. Full
/// snapshot replacement stays the fallback of record.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    last_modified: HashMap<QuestionId, Option<DateTime<Utc>>>,
}

impl ChangeTracker {
    /// Whether `incoming` differs from a cached snapshot of `cached_len` items.
    ///
    /// Differs if the count changed, an id is new, or an `updated_at` moved
    /// strictly forward.
    pub fn has_changes(&self, cached_len: usize, incoming: &[Question]) -> bool {
        if cached_len != incoming.len() {
            return true;
        }
        incoming.iter().any(|q| match self.last_modified.get(&q.id) {
            None => true,
            Some(seen) => matches!((q.updated_at, seen), (Some(new), Some(old)) if new > *old)
                || (q.updated_at.is_some() && seen.is_none()),
        })
    }

    /// Replace the recorded timestamps with those of `questions`.
    pub fn record(&mut self, questions: &[Question]) {
        self.last_modified = questions.iter().map(|q| (q.id, q.updated_at)).collect();
    }
}

// =============================================================================
// Notifications
// =============================================================================

/// What a transient notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Questions were deleted from the store.
    Deleted { count: usize },
}

/// A short-lived confirmation message. Expires on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Distinguishes this notification from a later one of the same kind.
    pub id: u64,
    pub kind: NotificationKind,
}

impl Notification {
    pub fn message(&self) -> String {
        match self.kind {
            NotificationKind::Deleted { count: 1 } => "Deleted 1 question".to_string(),
            NotificationKind::Deleted { count } => format!("Deleted {count} questions"),
        }
    }
}

// =============================================================================
// Reload Outcome
// =============================================================================

/// What a completed reload did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// New snapshot adopted and the pipeline re-run.
    Applied,
    /// Store content matched the cache; nothing recomputed.
    Unchanged,
    /// A newer reload or an optimistic mutation happened meanwhile; result dropped.
    Superseded,
}

// =============================================================================
// Snapshot
// =============================================================================

/// Everything a presentation layer needs, as of one state transition.
#[derive(Debug, Clone, Default)]
pub struct EngineSnapshot {
    /// Bumped once per pipeline run.
    pub revision: u64,
    pub visible: Vec<Question>,
    pub sections: Vec<Section>,
    pub available_tags: Vec<String>,
    pub filters: FilterState,
    pub is_loading: bool,
    pub last_error: Option<EngineError>,
    pub notification: Option<Notification>,
    pub multi_selection: bool,
    pub selected_ids: BTreeSet<QuestionId>,
}

// =============================================================================
// Engine State
// =============================================================================

/// Authoritative list state.
#[derive(Debug, Default)]
pub struct EngineState {
    /// Last successful load, store order, minus optimistic removals.
    pub(crate) all: Vec<Question>,
    pub(crate) tracker: ChangeTracker,
    pub(crate) filters: FilterState,

    // Derived by `recompute`
    pub(crate) visible: Vec<Question>,
    pub(crate) sections: Vec<Section>,
    pub(crate) available_tags: Vec<String>,
    pub(crate) revision: u64,

    pub(crate) selection: Selection,
    pub(crate) last_error: Option<EngineError>,
    pub(crate) notification: Option<Notification>,

    /// Reloads issued but not yet completed.
    pub(crate) reloads_in_flight: usize,
    /// Only a reload carrying the current epoch may apply its result.
    pub(crate) epoch: u64,
    /// Generation of the latest search text change, for debouncing.
    pub(crate) search_generation: u64,
    notification_seq: u64,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-run the pipeline over `all` with the current filters.
    pub(crate) fn recompute(&mut self) {
        self.visible = pipeline::apply(&self.all, &self.filters);
        self.sections = pipeline::sections(&self.visible, self.filters.question_type);
        self.available_tags = pipeline::available_tags(&self.all);
        self.revision += 1;
    }

    /// Apply a filter change, recomputing only if it changed anything.
    pub(crate) fn set_filters(&mut self, f: impl FnOnce(&mut FilterState)) -> bool {
        let before = self.filters.clone();
        f(&mut self.filters);
        if self.filters == before {
            return false;
        }
        self.recompute();
        true
    }

    // -------------------------------------------------------------------------
    // Reload
    // -------------------------------------------------------------------------

    /// Start a reload. Returns the epoch its result must match.
    pub(crate) fn begin_reload(&mut self) -> u64 {
        self.reloads_in_flight += 1;
        self.epoch += 1;
        self.epoch
    }

    /// Adopt `incoming` if it is still current and differs from the cache.
    pub(crate) fn finish_reload(&mut self, epoch: u64, incoming: Vec<Question>) -> ReloadOutcome {
        self.reloads_in_flight = self.reloads_in_flight.saturating_sub(1);
        if epoch != self.epoch {
            tracing::debug!(epoch, current = self.epoch, "Discarding superseded reload");
            return ReloadOutcome::Superseded;
        }

        if !self.tracker.has_changes(self.all.len(), &incoming) && !self.visible.is_empty() {
            tracing::debug!("Reload unchanged, skipping recompute");
            return ReloadOutcome::Unchanged;
        }

        self.tracker.record(&incoming);
        self.all = incoming;
        self.prune_selection();
        self.recompute();
        tracing::info!(count = self.all.len(), "Reload applied");
        ReloadOutcome::Applied
    }

    /// Record a failed reload. State is kept; the error is surfaced only if current.
    pub(crate) fn fail_reload(&mut self, epoch: u64, error: EngineError) {
        self.reloads_in_flight = self.reloads_in_flight.saturating_sub(1);
        if epoch == self.epoch {
            self.last_error = Some(error);
        }
    }

    pub fn is_loading(&self) -> bool {
        self.reloads_in_flight > 0
    }

    // -------------------------------------------------------------------------
    // Optimistic delete
    // -------------------------------------------------------------------------

    /// Drop `ids` from the cache before the store confirms.
    ///
    /// Invalidates in-flight reloads: their results predate this removal.
    pub(crate) fn remove_optimistically(&mut self, ids: &BTreeSet<QuestionId>) -> usize {
        let before = self.all.len();
        self.all.retain(|q| !ids.contains(&q.id));
        self.selection.retain(|id| !ids.contains(id));
        self.epoch += 1;
        self.recompute();
        before - self.all.len()
    }

    /// Forget selected ids that are no longer in `all`.
    fn prune_selection(&mut self) {
        let live: HashSet<QuestionId> = self.all.iter().map(|q| q.id).collect();
        let dropped = self.selection.retain(|id| live.contains(id));
        if dropped > 0 {
            tracing::debug!(dropped, "Pruned selection after reload");
        }
    }

    /// Capture the selection for a batch delete and leave multi-selection.
    ///
    /// Empty selection is a no-op that leaves the mode alone.
    pub(crate) fn take_selection_for_delete(&mut self) -> Option<BTreeSet<QuestionId>> {
        if self.selection.is_empty() {
            return None;
        }
        let ids = self.selection.exit();
        self.remove_optimistically(&ids);
        Some(ids)
    }

    // -------------------------------------------------------------------------
    // Notifications
    // -------------------------------------------------------------------------

    pub(crate) fn show_notification(&mut self, kind: NotificationKind) -> u64 {
        self.notification_seq += 1;
        self.notification = Some(Notification {
            id: self.notification_seq,
            kind,
        });
        self.notification_seq
    }

    /// Clear notification `id` if it is still the one showing.
    pub(crate) fn expire_notification(&mut self, id: u64) -> bool {
        match &self.notification {
            Some(current) if current.id == id => {
                self.notification = None;
                true
            }
            _ => false,
        }
    }

    // -------------------------------------------------------------------------
    // Snapshot
    // -------------------------------------------------------------------------

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            revision: self.revision,
            visible: self.visible.clone(),
            sections: self.sections.clone(),
            available_tags: self.available_tags.clone(),
            filters: self.filters.clone(),
            is_loading: self.is_loading(),
            last_error: self.last_error.clone(),
            notification: self.notification.clone(),
            multi_selection: self.selection.is_multi(),
            selected_ids: self.selection.ids().clone(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
