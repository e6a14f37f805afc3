//! Labeling session state and its transition function.
//!
//! A [`Session`] owns everything the user can change (working files, label
//! list, label assignments, view toggle, selection, paging) and applies one
//! [`Event`] at a time through [`Session::update`]. Loaded read-only data like
//! the classifier probability table is injected at construction.

mod view;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::constants::{
    DEFAULT_CONTAINER_ROOT, DEFAULT_LABELS, DEFAULT_ROWS_PER_PAGE, DEFAULT_THUMBNAIL_COLUMNS,
    MAX_THUMBNAIL_COLUMNS,
};
use crate::export::{ExportError, ExportReport, export_labels};
use crate::files::{FileEntry, ImportFormat, flatten_selection};
use crate::message::Event;
use crate::model::{LabelError, LabelId, LabelList, LabelStore, LabelingMode};
use crate::paths::PathNamespace;
use crate::planner::{ViewMode, plan};
use crate::probability::ProbabilityTable;

pub use view::{LabelProgress, Progress, Thumbnail};

/// Reasons an event is rejected. A rejected event leaves the session unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Label(#[from] LabelError),

    #[error("Label {0} does not exist")]
    UnknownLabel(LabelId),

    #[error("No label has been chosen yet")]
    NoLabelChosen,

    #[error("No probability table loaded")]
    NoProbabilityTable,

    #[error("Thresholded labeling is not available in {0} mode")]
    WrongMode(LabelingMode),

    #[error("Threshold {0} is outside 0..=100")]
    InvalidThreshold(f64),

    #[error("Invalid thumbnail column count {0}")]
    InvalidColumns(usize),
}

/// An action waiting for the user to confirm it.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    UnlabelAll,
    ClearData,
    Import {
        selection: Vec<FileEntry>,
        format: ImportFormat,
    },
}

impl PendingAction {
    /// Warning shown while the action waits.
    pub fn prompt(&self) -> &'static str {
        match self {
            PendingAction::UnlabelAll => "This will remove every label assignment. Continue?",
            PendingAction::ClearData | PendingAction::Import { .. } => {
                "Labeled images will lose their labels. Continue?"
            }
        }
    }
}

/// State of a labeling session.
#[derive(Debug, Clone)]
pub struct Session {
    namespace: PathNamespace,
    mode: LabelingMode,
    labels: LabelList,
    store: LabelStore,
    default_labels: Vec<String>,
    probabilities: Option<Arc<ProbabilityTable>>,

    files: Vec<PathBuf>,
    view: ViewMode,
    order: Vec<usize>,

    selection: Vec<PathBuf>,
    chosen_label: Option<LabelId>,
    pending: Option<PendingAction>,

    page: usize,
    rows_per_page: usize,
    columns: usize,
    show_host_paths: bool,
}

impl Session {
    /// Create a manual-mode session with the given default label names.
    pub fn new<S: AsRef<str>>(namespace: PathNamespace, default_labels: &[S]) -> Self {
        let default_labels: Vec<String> = default_labels
            .iter()
            .map(|l| l.as_ref().to_string())
            .collect();
        Self {
            namespace,
            mode: LabelingMode::Manual,
            labels: LabelList::new(&default_labels),
            store: LabelStore::new(),
            default_labels,
            probabilities: None,
            files: Vec::new(),
            view: ViewMode::None,
            order: Vec::new(),
            selection: Vec::new(),
            chosen_label: None,
            pending: None,
            page: 0,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            columns: DEFAULT_THUMBNAIL_COLUMNS,
            show_host_paths: false,
        }
    }

    /// Attach a classifier probability table.
    pub fn with_probabilities(mut self, table: Arc<ProbabilityTable>) -> Self {
        self.probabilities = Some(table);
        self
    }

    /// Set the thumbnail grid size. Out-of-range values fall back to defaults.
    pub fn with_geometry(mut self, rows_per_page: usize, columns: usize) -> Self {
        self.rows_per_page = if rows_per_page == 0 {
            DEFAULT_ROWS_PER_PAGE
        } else {
            rows_per_page
        };
        self.columns = if (1..=MAX_THUMBNAIL_COLUMNS).contains(&columns) {
            columns
        } else {
            DEFAULT_THUMBNAIL_COLUMNS
        };
        self
    }

    /// Restore saved state. The label store is kept as-is; the display order is
    /// recomputed from it.
    pub(crate) fn restore(
        &mut self,
        files: Vec<PathBuf>,
        mode: LabelingMode,
        labels: LabelList,
        store: LabelStore,
        view: ViewMode,
        chosen_label: Option<LabelId>,
    ) {
        self.files = files;
        self.mode = mode;
        self.chosen_label = chosen_label.filter(|l| *l < labels.len());
        self.labels = labels;
        self.store = store;
        self.view = view;
        self.selection.clear();
        self.pending = None;
        self.refresh_order();
    }

    /// Container/host path translation for this session.
    pub fn namespace(&self) -> &PathNamespace {
        &self.namespace
    }

    /// Active labeling mode.
    pub fn mode(&self) -> LabelingMode {
        self.mode
    }

    /// Active label list.
    pub fn labels(&self) -> &LabelList {
        &self.labels
    }

    /// Label assignments.
    pub fn store(&self) -> &LabelStore {
        &self.store
    }

    /// The working file list, container namespace.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Current display order mode.
    pub fn view(&self) -> ViewMode {
        self.view
    }

    /// Current display order, as indices into [`Session::files`].
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Selected images, container namespace.
    pub fn selection(&self) -> &[PathBuf] {
        &self.selection
    }

    /// Label most recently pressed, if any.
    pub fn chosen_label(&self) -> Option<LabelId> {
        self.chosen_label
    }

    /// Action waiting for confirmation.
    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    /// Current page, starting at 0.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Thumbnails per row.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Whether paths are shown in the host namespace.
    pub fn show_host_paths(&self) -> bool {
        self.show_host_paths
    }

    /// Classifier probability table, if one was attached.
    pub fn probabilities(&self) -> Option<&ProbabilityTable> {
        self.probabilities.as_deref()
    }

    /// Thumbnails per page.
    pub fn page_size(&self) -> usize {
        self.rows_per_page * self.columns
    }

    /// Number of pages in the current display order (at least one).
    pub fn page_count(&self) -> usize {
        self.order.len().div_ceil(self.page_size()).max(1)
    }

    /// A stored path as the user should see it.
    pub fn display_path(&self, path: &Path) -> PathBuf {
        self.namespace.display(path, self.show_host_paths)
    }

    /// Apply one event.
    pub fn update(&mut self, event: Event) -> Result<(), SessionError> {
        log::debug!("Event: {}", event.name());
        match event {
            Event::Import { selection, format } => {
                self.gate(PendingAction::Import { selection, format });
            }
            Event::ClearData => self.gate(PendingAction::ClearData),
            Event::UnlabelAll => {
                if self.store.is_empty() {
                    log::debug!("Nothing labeled, nothing to unlabel");
                } else {
                    self.pending = Some(PendingAction::UnlabelAll);
                }
            }
            Event::Confirm => match self.pending.take() {
                Some(action) => self.perform(action, true),
                None => log::debug!("Nothing waiting for confirmation"),
            },
            Event::Cancel => {
                if let Some(action) = self.pending.take() {
                    log::info!("Cancelled {}", action_name(&action));
                }
            }

            Event::ToggleHide => self.set_view(self.view.toggle_hide()),
            Event::Sort => self.set_view(ViewMode::Sort),
            Event::ResetView => self.set_view(ViewMode::None),
            Event::NextPage => {
                self.page = (self.page + 1).min(self.page_count() - 1);
            }
            Event::PrevPage => {
                self.page = self.page.saturating_sub(1);
            }
            Event::SetThumbnailColumns(columns) => {
                if !(1..=MAX_THUMBNAIL_COLUMNS).contains(&columns) {
                    return Err(SessionError::InvalidColumns(columns));
                }
                self.columns = columns;
                self.page = 0;
            }
            Event::SetShowHostPaths(show) => self.show_host_paths = show,

            Event::ToggleThumbnail(slot) => self.toggle_thumbnail(slot),
            Event::SelectPaths(paths) => self.select_paths(&paths),
            Event::ClearSelection => self.selection.clear(),

            Event::PressLabel(label) => self.press_label(label)?,
            Event::Unlabel => {
                let selection = std::mem::take(&mut self.selection);
                let removed = selection
                    .iter()
                    .filter(|p| self.store.unassign_all(p).is_some())
                    .count();
                log::info!("Unlabeled {} images", removed);
                self.refresh_order();
            }
            Event::LabelWithThreshold { threshold } => self.label_with_threshold(threshold)?,

            Event::AddLabel(name) => {
                self.labels.add_label(&name, self.mode)?;
            }
            Event::DeleteLabel(position) => self.delete_label(position),
            Event::SwitchMode(mode) => self.switch_mode(mode),
        }
        Ok(())
    }

    /// Export the current assignments under `output_root`.
    pub fn export(&self, output_root: &Path) -> Result<ExportReport, ExportError> {
        export_labels(&self.store, &self.labels, output_root)
    }

    /// Run `action` now if nothing is labeled, otherwise hold it for confirmation.
    fn gate(&mut self, action: PendingAction) {
        if self.store.is_empty() {
            self.perform(action, false);
        } else {
            log::info!("⚠️ {} waits for confirmation", action_name(&action));
            self.pending = Some(action);
        }
    }

    fn perform(&mut self, action: PendingAction, confirmed: bool) {
        log::debug!(
            "Performing {} (confirmed: {})",
            action_name(&action),
            confirmed
        );
        match action {
            PendingAction::UnlabelAll => {
                self.store.clear_all();
                log::info!("Removed every label assignment");
            }
            PendingAction::ClearData => {
                self.store.clear_all();
                self.files.clear();
                self.selection.clear();
            }
            PendingAction::Import { selection, format } => {
                self.store.clear_all();
                let selection: Vec<FileEntry> = selection
                    .into_iter()
                    .map(|entry| FileEntry {
                        path: self.namespace.to_container(&entry.path),
                        kind: entry.kind,
                    })
                    .collect();
                self.files = flatten_selection(&selection, &format);
                self.selection.clear();
                log::info!("📂 Imported {} images", self.files.len());
            }
        }
        self.refresh_order();
    }

    fn set_view(&mut self, view: ViewMode) {
        log::debug!("View: {} -> {}", self.view.name(), view.name());
        self.view = view;
        self.refresh_order();
    }

    /// Recompute the display order; any change sends the grid back to the first page.
    fn refresh_order(&mut self) {
        let order = plan(&self.files, &self.store, self.view);
        if order != self.order {
            self.order = order;
            self.page = 0;
        }
    }

    fn toggle_thumbnail(&mut self, slot: usize) {
        let position = self.page * self.page_size() + slot;
        let Some(path) = self
            .order
            .get(position)
            .filter(|_| slot < self.page_size())
            .map(|i| self.files[*i].clone())
        else {
            log::debug!("No thumbnail at slot {} of page {}", slot, self.page);
            return;
        };
        match self.selection.iter().position(|p| *p == path) {
            Some(i) => {
                self.selection.remove(i);
            }
            None => self.selection.push(path),
        }
    }

    fn select_paths(&mut self, paths: &[PathBuf]) {
        self.selection.clear();
        for path in self.namespace.to_container_all(paths) {
            if !self.files.contains(&path) {
                log::warn!("{:?} is not in the working file list", path);
            } else if !self.selection.contains(&path) {
                self.selection.push(path);
            }
        }
    }

    fn press_label(&mut self, label: LabelId) -> Result<(), SessionError> {
        if label >= self.labels.len() {
            return Err(SessionError::UnknownLabel(label));
        }
        self.chosen_label = Some(label);
        let selection = std::mem::take(&mut self.selection);
        let assigned = self.store.assign_all(Some(label), &selection);
        log::info!(
            "📝 Labeled {} images as '{}'",
            assigned,
            self.labels.name(label).unwrap_or_default()
        );
        self.refresh_order();
        Ok(())
    }

    fn label_with_threshold(&mut self, threshold: f64) -> Result<(), SessionError> {
        if !(0.0..=100.0).contains(&threshold) {
            return Err(SessionError::InvalidThreshold(threshold));
        }
        if self.mode != LabelingMode::MlCoach {
            return Err(SessionError::WrongMode(self.mode));
        }
        let table = self
            .probabilities
            .clone()
            .ok_or(SessionError::NoProbabilityTable)?;
        let label = self.chosen_label.ok_or(SessionError::NoLabelChosen)?;

        let candidates = table.candidates(label, &self.files, &self.namespace);
        let assigned = self
            .store
            .batch_assign_by_threshold(Some(label), candidates, |score| score > threshold);
        log::info!(
            "📝 Labeled {} images above {}% as '{}'",
            assigned,
            threshold,
            self.labels.name(label).unwrap_or_default()
        );
        self.refresh_order();
        Ok(())
    }

    fn delete_label(&mut self, position: LabelId) {
        if self.labels.delete_label(position, &mut self.store).is_none() {
            return;
        }
        self.chosen_label = match self.chosen_label {
            Some(chosen) if chosen == position => None,
            Some(chosen) if chosen > position => Some(chosen - 1),
            other => other,
        };
        self.refresh_order();
    }

    fn switch_mode(&mut self, mode: LabelingMode) {
        let classifier_labels: Vec<String> = self
            .probabilities
            .as_ref()
            .map(|t| t.labels().to_vec())
            .unwrap_or_default();
        if mode == LabelingMode::MlCoach && self.probabilities.is_none() {
            log::warn!("No probability table loaded, MLCoach mode has no labels");
        }
        self.labels = LabelList::for_mode(mode, &self.default_labels, &classifier_labels);
        self.mode = mode;
        self.chosen_label = None;
        log::info!("Switched to {} mode with {} labels", mode, self.labels.len());
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(PathNamespace::identity(DEFAULT_CONTAINER_ROOT), DEFAULT_LABELS)
    }
}

fn action_name(action: &PendingAction) -> &'static str {
    match action {
        PendingAction::UnlabelAll => "unlabel all",
        PendingAction::ClearData => "clear data",
        PendingAction::Import { .. } => "import",
    }
}
