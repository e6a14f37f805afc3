//! Ordered label names and the labeling modes that produce them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::label_store::{LabelId, LabelStore};
use crate::constants::label_color;
use crate::files::is_single_component;

/// Reasons a label name is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    /// Blank label name
    #[error("Label name is empty")]
    Empty,

    /// Name already present in the list
    #[error("Label '{0}' already exists")]
    Duplicate(String),

    /// Name cannot be used as an export directory (`..`, separators, absolute paths)
    #[error("Label '{0}' is not a valid directory name")]
    InvalidName(String),

    /// The active mode does not allow editing the list
    #[error("Labels cannot be edited in {0} mode")]
    ReadOnly(LabelingMode),

    /// Unknown labeling mode name
    #[error("Unknown labeling mode '{0}'")]
    UnknownMode(String),
}

/// How labels are assigned in the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelingMode {
    /// Free-form label list, images labeled by hand
    #[default]
    Manual,
    /// Labels come from a classifier probability table
    MlCoach,
    /// Similarity-based selection, no label list
    Clinic,
}

impl LabelingMode {
    /// Get the display name for this mode.
    pub fn name(&self) -> &'static str {
        match self {
            LabelingMode::Manual => "Manual",
            LabelingMode::MlCoach => "MLCoach",
            LabelingMode::Clinic => "DataClinic",
        }
    }

    /// Get all modes in display order.
    pub fn all() -> &'static [LabelingMode] {
        &[
            LabelingMode::Manual,
            LabelingMode::MlCoach,
            LabelingMode::Clinic,
        ]
    }

    /// Whether labels can be added and deleted in this mode.
    pub fn is_editable(&self) -> bool {
        matches!(self, LabelingMode::Manual)
    }
}

impl std::fmt::Display for LabelingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LabelingMode {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "mlcoach" => Ok(Self::MlCoach),
            "clinic" | "dataclinic" => Ok(Self::Clinic),
            other => Err(LabelError::UnknownMode(other.to_string())),
        }
    }
}

/// The active, ordered list of label names. A label's position is its id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelList {
    names: Vec<String>,
    editable: bool,
}

impl LabelList {
    /// Create an editable list.
    pub fn new<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            names: names.iter().map(|n| n.as_ref().to_string()).collect(),
            editable: true,
        }
    }

    /// Create a list that rejects additions and deletions.
    pub fn read_only<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            editable: false,
            ..Self::new(names)
        }
    }

    /// Build the list a mode starts with. Replaces, never merges.
    ///
    /// `manual` uses `defaults`, `mlcoach` the classifier's label columns,
    /// `clinic` has no labels.
    pub fn for_mode<S: AsRef<str>>(
        mode: LabelingMode,
        defaults: &[S],
        classifier_labels: &[S],
    ) -> Self {
        match mode {
            LabelingMode::Manual => Self::new(defaults),
            LabelingMode::MlCoach => Self::read_only(classifier_labels),
            LabelingMode::Clinic => Self::read_only::<&str>(&[]),
        }
    }

    /// Label names in id order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the list has no labels.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether labels can be added or deleted.
    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Name of the label at `id`.
    pub fn name(&self, id: LabelId) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Position of the label called `name`.
    pub fn position(&self, name: &str) -> Option<LabelId> {
        self.names.iter().position(|n| n == name)
    }

    /// Colour of the label at `id`.
    pub fn color(&self, id: LabelId) -> &'static str {
        label_color(id)
    }

    /// Append a label and return its id.
    ///
    /// Names are trimmed; blank names, exact duplicates and names that are not a
    /// single directory name are rejected.
    pub fn add_label(&mut self, name: &str, mode: LabelingMode) -> Result<LabelId, LabelError> {
        if !self.editable {
            return Err(LabelError::ReadOnly(mode));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(LabelError::Empty);
        }
        if !is_single_component(name) {
            return Err(LabelError::InvalidName(name.to_string()));
        }
        if self.position(name).is_some() {
            return Err(LabelError::Duplicate(name.to_string()));
        }
        self.names.push(name.to_string());
        log::debug!("🏷️ Added label '{}' at {}", name, self.names.len() - 1);
        Ok(self.names.len() - 1)
    }

    /// Delete the label at `position`, shifting higher labels (and their images in
    /// `store`) down by one. Returns the deleted position, or `None` if nothing was
    /// deleted.
    pub fn delete_label(&mut self, position: LabelId, store: &mut LabelStore) -> Option<LabelId> {
        if !self.editable {
            log::warn!("Label list is read-only, not deleting label {}", position);
            return None;
        }
        if position >= self.names.len() {
            log::debug!("No label at position {}, nothing to delete", position);
            return None;
        }
        let name = self.names.remove(position);
        let dropped = store.remove_label(position);
        log::debug!(
            "🗑️ Deleted label '{}' at {} ({} images unlabeled)",
            name,
            position,
            dropped.len()
        );
        Some(position)
    }
}
