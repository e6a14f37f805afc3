//! Session file management.
//!
//! A session file stores the state a labeling session needs to continue in a
//! later invocation:
//! - The working file list, in import order
//! - The labeling mode and its label list
//! - All label assignments
//! - View and display settings
//!
//! # File Format
//!
//! Sessions are stored as JSON files.
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "files": ["/app/data/set1/a.png", ...],
//!   "mode": "manual",
//!   "labels": { "names": ["Arc", "Peaks"], "editable": true },
//!   "assignments": { "0": ["/app/data/set1/a.png"] },
//!   "view": "sort",
//!   "chosen_label": 0,
//!   "show_host_paths": false,
//!   "thumbnail_columns": 4
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DEFAULT_THUMBNAIL_COLUMNS;
use crate::message::Event;
use crate::model::{LabelId, LabelList, LabelStore, LabelingMode};
use crate::planner::ViewMode;
use crate::session::Session;

/// Current session file format version.
pub const PROJECT_VERSION: &str = "1.0";

fn default_columns() -> usize {
    DEFAULT_THUMBNAIL_COLUMNS
}

/// A session file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Format version for forward compatibility.
    pub version: String,
    /// Working file list, container namespace.
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub mode: LabelingMode,
    pub labels: LabelList,
    /// Label assignments keyed by label id.
    pub assignments: LabelStore,
    #[serde(default)]
    pub view: ViewMode,
    #[serde(default)]
    pub chosen_label: Option<LabelId>,
    #[serde(default)]
    pub show_host_paths: bool,
    #[serde(default = "default_columns")]
    pub thumbnail_columns: usize,
}

impl Project {
    /// Capture the persistent part of a session.
    pub fn from_session(session: &Session) -> Self {
        Self {
            version: PROJECT_VERSION.to_string(),
            files: session.files().to_vec(),
            mode: session.mode(),
            labels: session.labels().clone(),
            assignments: session.store().clone(),
            view: session.view(),
            chosen_label: session.chosen_label(),
            show_host_paths: session.show_host_paths(),
            thumbnail_columns: session.columns(),
        }
    }

    /// Load this project into `session`, replacing its files, labels and assignments.
    pub fn apply_to(self, session: &mut Session) {
        session.restore(
            self.files,
            self.mode,
            self.labels,
            self.assignments,
            self.view,
            self.chosen_label,
        );
        let display = [
            Event::SetThumbnailColumns(self.thumbnail_columns),
            Event::SetShowHostPaths(self.show_host_paths),
        ];
        for event in display {
            if let Err(e) = session.update(event) {
                log::warn!("Ignoring saved display setting: {}", e);
            }
        }
    }

    /// Serialize the project to a JSON string.
    pub fn to_json(&self) -> Result<String, ProjectError> {
        serde_json::to_string_pretty(self).map_err(ProjectError::Serialization)
    }

    /// Load a project from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        let project: Self = serde_json::from_str(json).map_err(ProjectError::Deserialization)?;

        if project.version != PROJECT_VERSION {
            log::warn!(
                "Session version mismatch: expected {}, got {}",
                PROJECT_VERSION,
                project.version
            );
        }

        Ok(project)
    }

    /// Save the project to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ProjectError> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::debug!("Saved session to {:?}", path);
        Ok(())
    }

    /// Load a project from a file.
    pub fn load_from_file(path: &Path) -> Result<Self, ProjectError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Errors that can occur during session file operations.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Failed to serialize session: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Failed to deserialize session: {0}")]
    Deserialization(#[source] serde_json::Error),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::{FileEntry, ImportFormat};
    use crate::paths::PathNamespace;
    use tempfile::TempDir;

    fn labeled_session() -> Session {
        let mut session = Session::new(PathNamespace::identity("/data"), &["Arc", "Peaks"]);
        session
            .update(Event::Import {
                selection: vec![FileEntry::file("/data/a.png"), FileEntry::file("/data/b.png")],
                format: ImportFormat::images(),
            })
            .unwrap();
        session
            .update(Event::SelectPaths(vec![PathBuf::from("/data/b.png")]))
            .unwrap();
        session.update(Event::PressLabel(1)).unwrap();
        session.update(Event::Sort).unwrap();
        session.update(Event::SetThumbnailColumns(3)).unwrap();
        session
    }

    #[test]
    fn test_project_roundtrip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        let project = Project::from_session(&labeled_session());
        project.save_to_file(&path).unwrap();

        let loaded = Project::load_from_file(&path).unwrap();
        assert_eq!(loaded, project);

        let mut restored = Session::new(PathNamespace::identity("/data"), &["Arc", "Peaks"]);
        loaded.apply_to(&mut restored);
        assert_eq!(restored.files().len(), 2);
        assert_eq!(restored.store().label_of(Path::new("/data/b.png")), Some(1));
        assert_eq!(restored.view(), ViewMode::Sort);
        assert_eq!(restored.order(), [1, 0]);
        assert_eq!(restored.chosen_label(), Some(1));
        assert_eq!(restored.columns(), 3);
    }

    #[test]
    fn test_missing_optional_fields_use_defaults() {
        let json = r#"{
            "version": "1.0",
            "files": ["/data/a.png"],
            "labels": { "names": ["x"], "editable": true },
            "assignments": {}
        }"#;
        let project = Project::from_json(json).unwrap();
        assert_eq!(project.mode, LabelingMode::Manual);
        assert_eq!(project.view, ViewMode::None);
        assert_eq!(project.thumbnail_columns, DEFAULT_THUMBNAIL_COLUMNS);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            Project::from_json("{ not json"),
            Err(ProjectError::Deserialization(_))
        ));
        assert!(matches!(
            Project::load_from_file(Path::new("/nonexistent/session.json")),
            Err(ProjectError::Io(_))
        ));
    }
}
