//! Observable engine state with automatic change notifications.
//!
//! Mutation = notification. Every method that changes the state also
//! broadcasts a fresh snapshot, so callers cannot mutate without notifying.

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::state::{EngineSnapshot, EngineState};

/// `EngineState` behind a lock, broadcasting snapshots on change.
///
/// ## Thread Safety
///
/// Uses `parking_lot::RwLock` for the state (never poisons) and
/// `tokio::sync::watch` for broadcasts. Writes are exclusive, which
/// linearizes every transition; the lock is never held across an await.
pub struct ObservableState {
    inner: RwLock<EngineState>,
    tx: watch::Sender<EngineSnapshot>,
    rx: watch::Receiver<EngineSnapshot>,
}

impl ObservableState {
    pub fn new(state: EngineState) -> Self {
        let (tx, rx) = watch::channel(state.snapshot());
        Self {
            inner: RwLock::new(state),
            tx,
            rx,
        }
    }

    // =========================================================================
    // Mutation Methods
    // =========================================================================

    /// Mutate the state and broadcast the result.
    pub fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut EngineState) -> R,
    {
        let (result, snapshot) = {
            let mut inner = self.inner.write();
            let result = f(&mut inner);
            (result, inner.snapshot())
        };
        let _ = self.tx.send(snapshot);
        result
    }

    /// Mutate the state, broadcasting only if the closure reports a change.
    pub fn update_if<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut EngineState) -> bool,
    {
        let (changed, snapshot) = {
            let mut inner = self.inner.write();
            let changed = f(&mut inner);
            (changed, changed.then(|| inner.snapshot()))
        };
        if let Some(snapshot) = snapshot {
            let _ = self.tx.send(snapshot);
        }
        changed
    }

    /// Mutate without broadcasting. For bookkeeping that no subscriber sees.
    pub fn update_quiet<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut EngineState) -> R,
    {
        f(&mut self.inner.write())
    }

    // =========================================================================
    // Read Methods
    // =========================================================================

    /// Read the state with a closure.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&EngineState) -> R,
    {
        f(&self.inner.read())
    }

    /// The most recently broadcast snapshot.
    pub fn current(&self) -> EngineSnapshot {
        self.rx.borrow().clone()
    }

    // =========================================================================
    // Subscription
    // =========================================================================

    /// Subscribe to state changes.
    ///
    /// The receiver sees the current snapshot immediately and every later one.
    /// Clone the receiver for multiple subscribers.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.rx.clone()
    }
}

impl Default for ObservableState {
    fn default() -> Self {
        Self::new(EngineState::new())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::NotificationKind;

    #[test]
    fn test_update_broadcasts() {
        let state = ObservableState::default();
        let mut rx = state.subscribe();
        assert!(!rx.has_changed().unwrap());

        state.update(|s| {
            s.show_notification(NotificationKind::Deleted { count: 1 });
        });

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().notification.is_some());
    }

    #[test]
    fn test_update_if_skips_broadcast_when_unchanged() {
        let state = ObservableState::default();
        let mut rx = state.subscribe();

        assert!(!state.update_if(|s| s.expire_notification(42)));
        assert!(!rx.has_changed().unwrap());

        let id = state.update(|s| s.show_notification(NotificationKind::Deleted { count: 3 }));
        rx.borrow_and_update();

        assert!(state.update_if(|s| s.expire_notification(id)));
        assert!(rx.has_changed().unwrap());
        assert!(state.current().notification.is_none());
    }

    #[test]
    fn test_update_quiet_does_not_broadcast() {
        let state = ObservableState::default();
        let rx = state.subscribe();

        let generation = state.update_quiet(|s| {
            s.search_generation += 1;
            s.search_generation
        });

        assert_eq!(generation, 1);
        assert!(!rx.has_changed().unwrap());
        assert_eq!(state.read(|s| s.search_generation), 1);
    }
}
