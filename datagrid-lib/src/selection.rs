//! Id-keyed row selection that survives page changes.
//!
//! The table engine only understands selection by row index on the current
//! page (the [`RowSelectionMask`]). The tracker owns the real selection, a
//! set of entity ids, and derives the mask from whatever page is loaded.

use std::collections::BTreeMap;
use std::collections::HashSet;

use crate::model::Entity;

/// Page row index to selected flag. Only selected rows are present.
pub type RowSelectionMask = BTreeMap<usize, bool>;

/// Tracks selected entities by id.
#[derive(Debug, Clone)]
pub struct SelectionTracker<K> {
    selected: HashSet<K>,
    mask: RowSelectionMask,
}

impl<K> Default for SelectionTracker<K> {
    fn default() -> Self {
        Self {
            selected: HashSet::new(),
            mask: RowSelectionMask::new(),
        }
    }
}

impl<K: Clone + Eq + std::hash::Hash> SelectionTracker<K> {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggles an id. The id does not need to be on the current page.
    pub fn toggle(&mut self, id: K) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    /// Selects an id.
    pub fn select(&mut self, id: K) {
        self.selected.insert(id);
    }

    /// Deselects an id. Returns whether it was selected.
    pub fn deselect(&mut self, id: &K) -> bool {
        self.selected.remove(id)
    }

    /// Drops every selected id and the mask.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.mask.clear();
    }

    /// Returns `true` if the id is selected.
    pub fn is_selected(&self, id: &K) -> bool {
        self.selected.contains(id)
    }

    /// Number of selected ids across all pages.
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Every selected id.
    pub fn selected_ids(&self) -> impl Iterator<Item = &K> {
        self.selected.iter()
    }

    /// The current page's mask as last committed.
    pub fn mask(&self) -> &RowSelectionMask {
        &self.mask
    }

    /// Selected entities among the loaded rows.
    pub fn selected_entities<'a, E>(&self, rows: &'a [E]) -> Vec<&'a E>
    where
        E: Entity<Id = K>,
    {
        rows.iter().filter(|row| self.selected.contains(&row.id())).collect()
    }

    /// Every loaded row, for "select all on page".
    pub fn all_entities<'a, E>(&self, rows: &'a [E]) -> Vec<&'a E>
    where
        E: Entity<Id = K>,
    {
        rows.iter().collect()
    }

    /// Recomputes the mask for freshly loaded rows.
    ///
    /// Returns the new mask only when it differs by value from the committed
    /// one; `None` means nothing changed and nothing should be dispatched.
    pub fn reconcile<E>(&mut self, rows: &[E]) -> Option<&RowSelectionMask>
    where
        E: Entity<Id = K>,
    {
        let mask = mask_for(rows, &self.selected);
        if mask == self.mask {
            return None;
        }
        self.mask = mask;
        Some(&self.mask)
    }

    /// Applies a mask reported by the table engine for the loaded rows.
    ///
    /// Rows on the page are selected or deselected to match; ids that are
    /// not on the page keep their state.
    pub fn apply_mask<E>(&mut self, rows: &[E], mask: RowSelectionMask)
    where
        E: Entity<Id = K>,
    {
        for (index, row) in rows.iter().enumerate() {
            if mask.get(&index).copied().unwrap_or(false) {
                self.selected.insert(row.id());
            } else {
                self.selected.remove(&row.id());
            }
        }
        self.mask = mask_for(rows, &self.selected);
    }
}

fn mask_for<E: Entity>(rows: &[E], selected: &HashSet<E::Id>) -> RowSelectionMask {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| selected.contains(&row.id()))
        .map(|(index, _)| (index, true))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Row {
        id: u32,
    }

    impl Entity for Row {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }

        fn cell(&self, _column_id: &str) -> String {
            self.id.to_string()
        }
    }

    fn page(ids: &[u32]) -> Vec<Row> {
        ids.iter().map(|id| Row { id: *id }).collect()
    }

    #[test]
    fn test_selection_survives_page_round_trip() {
        let first = page(&[1, 2, 3]);
        let second = page(&[4, 5, 6]);
        let mut tracker = SelectionTracker::new();

        tracker.reconcile(&first);
        tracker.toggle(2);
        tracker.reconcile(&first);
        assert_eq!(tracker.mask(), &RowSelectionMask::from([(1, true)]));

        tracker.reconcile(&second);
        assert!(tracker.mask().is_empty());

        tracker.reconcile(&first);
        assert_eq!(tracker.mask(), &RowSelectionMask::from([(1, true)]));
        assert_eq!(tracker.selected_count(), 1);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let rows = page(&[1, 2, 3]);
        let mut tracker = SelectionTracker::new();
        tracker.select(3);

        let mut dispatched = 0;
        for _ in 0..2 {
            if tracker.reconcile(&rows).is_some() {
                dispatched += 1;
            }
        }
        assert_eq!(dispatched, 1);
    }

    #[test]
    fn test_reconcile_with_nothing_selected_is_noop() {
        let mut tracker = SelectionTracker::<u32>::new();
        assert!(tracker.reconcile(&page(&[1, 2])).is_none());
    }

    #[test]
    fn test_off_page_selection_is_recorded() {
        let mut tracker = SelectionTracker::new();
        tracker.reconcile(&page(&[1, 2]));
        tracker.toggle(9);
        assert!(tracker.reconcile(&page(&[1, 2])).is_none());
        assert!(tracker.is_selected(&9));

        let mask = tracker.reconcile(&page(&[8, 9])).cloned();
        assert_eq!(mask, Some(RowSelectionMask::from([(1, true)])));
    }

    #[test]
    fn test_apply_mask_keeps_other_pages() {
        let rows = page(&[1, 2, 3]);
        let mut tracker = SelectionTracker::new();
        tracker.select(42);
        tracker.select(1);

        tracker.apply_mask(&rows, RowSelectionMask::from([(2, true)]));
        assert!(tracker.is_selected(&42));
        assert!(tracker.is_selected(&3));
        assert!(!tracker.is_selected(&1));
        assert_eq!(tracker.mask(), &RowSelectionMask::from([(2, true)]));
        assert!(tracker.reconcile(&rows).is_none());
    }

    #[test]
    fn test_selected_and_all_entities() {
        let rows = page(&[1, 2, 3]);
        let mut tracker = SelectionTracker::new();
        tracker.select(2);
        tracker.select(7);

        let selected: Vec<u32> = tracker.selected_entities(&rows).iter().map(|r| r.id).collect();
        assert_eq!(selected, vec![2]);
        assert_eq!(tracker.all_entities(&rows).len(), 3);
    }

    #[test]
    fn test_clear() {
        let rows = page(&[1, 2]);
        let mut tracker = SelectionTracker::new();
        tracker.select(1);
        tracker.reconcile(&rows);
        tracker.clear();
        assert_eq!(tracker.selected_count(), 0);
        assert!(tracker.mask().is_empty());
    }
}
