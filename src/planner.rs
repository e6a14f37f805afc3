//! Display order of the working file list.
//!
//! The planner is a pure function of the working file list, the label store
//! and the active view mode. It returns indices into the working file list.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::{LabelId, LabelStore};

/// View filter applied to the thumbnail grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Original order
    #[default]
    None,
    /// Only unlabeled images, in original order
    Hide,
    /// Grouped by label id, unlabeled last
    Sort,
}

impl ViewMode {
    /// Next mode after pressing "hide": hiding toggles off back to the original order.
    pub fn toggle_hide(self) -> Self {
        match self {
            ViewMode::Hide => ViewMode::None,
            ViewMode::None | ViewMode::Sort => ViewMode::Hide,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ViewMode::None => "none",
            ViewMode::Hide => "hide",
            ViewMode::Sort => "sort",
        }
    }
}

/// Compute the display order for `files` under `mode`.
pub fn plan(files: &[PathBuf], store: &LabelStore, mode: ViewMode) -> Vec<usize> {
    match mode {
        ViewMode::None => (0..files.len()).collect(),
        ViewMode::Hide => unlabeled(files, store),
        ViewMode::Sort => sorted_by_label(files, store),
    }
}

fn label_lookup(store: &LabelStore) -> HashMap<&Path, LabelId> {
    let mut lookup = HashMap::new();
    for (label, paths) in store.iter() {
        for path in paths {
            // lowest label wins if a path were ever held twice
            lookup.entry(path.as_path()).or_insert(label);
        }
    }
    lookup
}

fn unlabeled(files: &[PathBuf], store: &LabelStore) -> Vec<usize> {
    let lookup = label_lookup(store);
    files
        .iter()
        .enumerate()
        .filter(|(_, f)| !lookup.contains_key(f.as_path()))
        .map(|(i, _)| i)
        .collect()
}

fn sorted_by_label(files: &[PathBuf], store: &LabelStore) -> Vec<usize> {
    let lookup = label_lookup(store);
    let mut buckets: BTreeMap<LabelId, Vec<usize>> = BTreeMap::new();
    let mut rest = Vec::new();

    for (i, file) in files.iter().enumerate() {
        match lookup.get(file.as_path()) {
            Some(label) => buckets.entry(*label).or_default().push(i),
            None => rest.push(i),
        }
    }

    buckets.into_values().flatten().chain(rest).collect()
}
