//! The authoritative mapping from label to labeled images.
//!
//! Assignments are keyed by image path (container namespace). Index-based
//! views into a working file list are derived on demand, so they can never
//! drift from the path lists when the file list is reordered or re-imported.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Position of a label in the active label list.
pub type LabelId = usize;

/// Label assignments for a session.
///
/// Invariant: a path appears in at most one label's list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelStore {
    labels: BTreeMap<LabelId, Vec<PathBuf>>,
}

impl LabelStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign an image to `label`, removing it from any other label first.
    ///
    /// `None` means no label has been chosen yet and is a no-op.
    /// Re-assigning an image to its current label moves it to the end of that list.
    pub fn assign(&mut self, label: Option<LabelId>, path: &Path) -> bool {
        let Some(label) = label else {
            log::trace!("No label chosen, ignoring assignment of {:?}", path);
            return false;
        };
        self.remove_everywhere(path);
        self.labels
            .entry(label)
            .or_default()
            .push(path.to_path_buf());
        true
    }

    /// Assign several images to `label`. Returns how many were assigned.
    pub fn assign_all<P: AsRef<Path>>(&mut self, label: Option<LabelId>, paths: &[P]) -> usize {
        if label.is_none() {
            return 0;
        }
        paths
            .iter()
            .filter(|p| self.assign(label, p.as_ref()))
            .count()
    }

    /// Remove an image from whichever label holds it.
    pub fn unassign_all(&mut self, path: &Path) -> Option<LabelId> {
        let holder = self.label_of(path);
        self.remove_everywhere(path);
        holder
    }

    /// Drop every assignment.
    pub fn clear_all(&mut self) {
        self.labels.clear();
    }

    /// Assign every candidate whose score satisfies `predicate` to `label`.
    /// Returns the number of images assigned.
    pub fn batch_assign_by_threshold<I, F>(
        &mut self,
        label: Option<LabelId>,
        candidates: I,
        predicate: F,
    ) -> usize
    where
        I: IntoIterator<Item = (PathBuf, f64)>,
        F: Fn(f64) -> bool,
    {
        if label.is_none() {
            return 0;
        }
        let mut assigned = 0;
        for (path, score) in candidates {
            if predicate(score) && self.assign(label, &path) {
                assigned += 1;
            }
        }
        assigned
    }

    /// Label currently holding `path`, if any.
    pub fn label_of(&self, path: &Path) -> Option<LabelId> {
        self.labels
            .iter()
            .find(|(_, paths)| paths.iter().any(|p| p == path))
            .map(|(label, _)| *label)
    }

    /// Check whether any label holds `path`.
    pub fn is_labeled(&self, path: &Path) -> bool {
        self.label_of(path).is_some()
    }

    /// Paths assigned to `label`, in assignment order.
    pub fn paths(&self, label: LabelId) -> &[PathBuf] {
        self.labels.get(&label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Positions in `files` of the images assigned to `label`, in assignment order.
    /// Assigned paths missing from `files` are skipped.
    pub fn indices(&self, label: LabelId, files: &[PathBuf]) -> Vec<usize> {
        self.paths(label)
            .iter()
            .filter_map(|p| files.iter().position(|f| f == p))
            .collect()
    }

    /// Index-based view of every label against `files`.
    pub fn by_index(&self, files: &[PathBuf]) -> BTreeMap<LabelId, Vec<usize>> {
        self.labels
            .keys()
            .map(|label| (*label, self.indices(*label, files)))
            .collect()
    }

    /// Iterate labels with their assigned paths, in ascending label order.
    pub fn iter(&self) -> impl Iterator<Item = (LabelId, &[PathBuf])> {
        self.labels.iter().map(|(l, p)| (*l, p.as_slice()))
    }

    /// Number of images assigned to `label`.
    pub fn count(&self, label: LabelId) -> usize {
        self.paths(label).len()
    }

    /// Total number of labeled images.
    pub fn total(&self) -> usize {
        self.labels.values().map(Vec::len).sum()
    }

    /// Check if no label holds any image.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Highest label id with an entry (possibly empty).
    pub fn max_label(&self) -> Option<LabelId> {
        self.labels.keys().next_back().copied()
    }

    /// Drop the entry for `position` and shift every higher label down by one,
    /// merging into any entry already at the lower id.
    pub fn remove_label(&mut self, position: LabelId) -> Vec<PathBuf> {
        let old = std::mem::take(&mut self.labels);
        let mut removed = Vec::new();
        for (label, paths) in old {
            if label < position {
                self.labels.entry(label).or_default().extend(paths);
            } else if label == position {
                removed = paths;
            } else {
                self.labels.entry(label - 1).or_default().extend(paths);
            }
        }
        removed
    }

    fn remove_everywhere(&mut self, path: &Path) {
        for paths in self.labels.values_mut() {
            paths.retain(|p| p != path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(name: &str) -> PathBuf {
        PathBuf::from(format!("/data/{}", name))
    }

    fn assert_at_most_one_label(store: &LabelStore) {
        let mut seen = std::collections::HashSet::new();
        for (_, paths) in store.iter() {
            for path in paths {
                assert!(seen.insert(path.clone()), "{:?} held by two labels", path);
            }
        }
    }

    #[test]
    fn test_assign_creates_label_lazily() {
        let mut store = LabelStore::new();
        assert!(store.assign(Some(7), &p("a.png")));
        assert_eq!(store.paths(7), [p("a.png")]);
        assert_eq!(store.label_of(&p("a.png")), Some(7));
    }

    #[test]
    fn test_assign_without_label_is_noop() {
        let mut store = LabelStore::new();
        assert!(!store.assign(None, &p("a.png")));
        assert!(store.is_empty());
        assert_eq!(store.max_label(), None);
    }

    #[test]
    fn test_reassign_moves_between_labels() {
        let mut store = LabelStore::new();
        store.assign(Some(0), &p("a.png"));
        store.assign(Some(0), &p("b.png"));
        store.assign(Some(1), &p("a.png"));

        assert_eq!(store.paths(0), [p("b.png")]);
        assert_eq!(store.paths(1), [p("a.png")]);
        assert_at_most_one_label(&store);
    }

    #[test]
    fn test_reassign_same_label_has_no_duplicates() {
        let mut store = LabelStore::new();
        store.assign(Some(0), &p("a.png"));
        store.assign(Some(0), &p("b.png"));
        store.assign(Some(0), &p("a.png"));
        assert_eq!(store.paths(0), [p("b.png"), p("a.png")]);
    }

    #[test]
    fn test_invariant_over_assignment_sequence() {
        let mut store = LabelStore::new();
        let names = ["a.png", "b.png", "c.png", "d.png"];
        for step in 0..40usize {
            let name = names[(step * 7) % names.len()];
            store.assign(Some(step % 3), &p(name));
            assert_at_most_one_label(&store);
        }
        assert_eq!(store.total(), names.len());
    }

    #[test]
    fn test_unassign_all() {
        let mut store = LabelStore::new();
        store.assign(Some(2), &p("a.png"));
        assert_eq!(store.unassign_all(&p("a.png")), Some(2));
        assert_eq!(store.unassign_all(&p("a.png")), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_all_then_reassign_roundtrip() {
        let mut store = LabelStore::new();
        store.assign(Some(0), &p("a.png"));
        store.assign(Some(1), &p("c.png"));
        store.assign(Some(1), &p("b.png"));
        store.assign(Some(3), &p("d.png"));
        let original = store.clone();

        let held: Vec<(LabelId, PathBuf)> = store
            .iter()
            .flat_map(|(l, paths)| paths.iter().map(move |p| (l, p.clone())))
            .collect();
        store.clear_all();
        assert!(store.is_empty());
        for (label, path) in held {
            store.assign(Some(label), &path);
        }
        assert_eq!(store, original);
    }

    #[test]
    fn test_batch_assign_by_threshold() {
        let mut store = LabelStore::new();
        store.assign(Some(0), &p("b.png"));
        let candidates = vec![(p("a.png"), 0.9), (p("b.png"), 0.6), (p("c.png"), 0.4)];
        let n = store.batch_assign_by_threshold(Some(1), candidates, |s| s > 0.5);

        assert_eq!(n, 2);
        assert_eq!(store.paths(1), [p("a.png"), p("b.png")]);
        assert!(store.paths(0).is_empty());
        assert!(!store.is_labeled(&p("c.png")));
    }

    #[test]
    fn test_derived_indices_follow_file_order() {
        let mut store = LabelStore::new();
        store.assign(Some(0), &p("c.png"));
        store.assign(Some(0), &p("a.png"));
        store.assign(Some(0), &p("gone.png"));
        let files = vec![p("a.png"), p("b.png"), p("c.png")];

        assert_eq!(store.indices(0, &files), vec![2, 0]);

        let reordered = vec![p("c.png"), p("a.png")];
        assert_eq!(store.indices(0, &reordered), vec![0, 1]);
    }

    #[test]
    fn test_remove_label_shifts_and_merges() {
        let mut store = LabelStore::new();
        store.assign(Some(0), &p("a.png"));
        store.assign(Some(1), &p("b.png"));
        store.assign(Some(2), &p("c.png"));
        store.assign(Some(3), &p("d.png"));

        let removed = store.remove_label(1);
        assert_eq!(removed, vec![p("b.png")]);
        assert_eq!(store.paths(0), [p("a.png")]);
        assert_eq!(store.paths(1), [p("c.png")]);
        assert_eq!(store.paths(2), [p("d.png")]);
        assert!(store.paths(3).is_empty());
        assert_eq!(store.total(), 3);
    }

    #[test]
    fn test_remove_label_beyond_entries_keeps_everything() {
        let mut store = LabelStore::new();
        store.assign(Some(0), &p("a.png"));
        assert!(store.remove_label(5).is_empty());
        assert_eq!(store.paths(0), [p("a.png")]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut store = LabelStore::new();
        store.assign(Some(0), &p("a.png"));
        store.assign(Some(10), &p("b.png"));
        let json = serde_json::to_string(&store).unwrap();
        let loaded: LabelStore = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, store);
    }
}
