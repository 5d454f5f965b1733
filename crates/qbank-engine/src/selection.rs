//! Multi-selection state.

use std::collections::BTreeSet;

use qbank_core::QuestionId;

/// Selection mode for the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionMode {
    /// Tapping a question opens it; nothing is selected.
    #[default]
    Single,
    /// Tapping toggles. Multiple questions can be selected.
    Multi,
}

/// Selected ids plus the mode that governs them.
///
/// Ids can only be toggled in `Multi` mode, and leaving `Multi` always
/// clears them.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    mode: SelectionMode,
    ids: BTreeSet<QuestionId>,
}

impl Selection {
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn is_multi(&self) -> bool {
        self.mode == SelectionMode::Multi
    }

    pub fn ids(&self) -> &BTreeSet<QuestionId> {
        &self.ids
    }

    pub fn is_selected(&self, id: &QuestionId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Enter multi-selection. Returns `false` if already in it.
    pub fn enter(&mut self) -> bool {
        if self.is_multi() {
            return false;
        }
        self.mode = SelectionMode::Multi;
        true
    }

    /// Leave multi-selection, returning whatever was selected.
    pub fn exit(&mut self) -> BTreeSet<QuestionId> {
        self.mode = SelectionMode::Single;
        std::mem::take(&mut self.ids)
    }

    /// Keep only the selected ids for which `keep` holds. Returns how many were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&QuestionId) -> bool) -> usize {
        let before = self.ids.len();
        self.ids.retain(|id| keep(id));
        before - self.ids.len()
    }

    /// Toggle `id`. Ignored outside multi-selection; returns whether anything changed.
    pub fn toggle(&mut self, id: QuestionId) -> bool {
        if !self.is_multi() {
            tracing::debug!(%id, "Ignoring toggle outside multi-selection");
            return false;
        }
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_requires_multi() {
        let mut selection = Selection::default();
        let id = QuestionId::new();

        assert!(!selection.toggle(id));
        assert!(selection.is_empty());

        assert!(selection.enter());
        assert!(!selection.enter());
        assert!(selection.toggle(id));
        assert!(selection.is_selected(&id));

        assert!(selection.toggle(id));
        assert!(!selection.is_selected(&id));
    }

    #[test]
    fn test_exit_clears() {
        let mut selection = Selection::default();
        let (a, b) = (QuestionId::new(), QuestionId::new());

        selection.enter();
        selection.toggle(a);
        selection.toggle(b);
        assert_eq!(selection.len(), 2);

        let taken = selection.exit();
        assert_eq!(taken.len(), 2);
        assert!(selection.is_empty());
        assert_eq!(selection.mode(), SelectionMode::Single);
    }

    #[test]
    fn test_retain_keeps_mode() {
        let mut selection = Selection::default();
        let (a, b) = (QuestionId::new(), QuestionId::new());

        selection.enter();
        selection.toggle(a);
        selection.toggle(b);

        assert_eq!(selection.retain(|id| *id != a), 1);
        assert!(!selection.is_selected(&a));
        assert!(selection.is_selected(&b));
        assert!(selection.is_multi());
    }
}
