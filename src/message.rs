//! Session event types.
//!
//! Every user action is represented as an event in the Elm architecture style
//! and applied by [`Session::update`](crate::session::Session::update).

use std::path::PathBuf;

use crate::files::{FileEntry, ImportFormat};
use crate::model::{LabelId, LabelingMode};

/// Events that can be applied to a labeling session.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // Data
    /// Replace the working file list with a flattened selection
    Import {
        selection: Vec<FileEntry>,
        format: ImportFormat,
    },
    /// Empty the working file list (asks for confirmation if anything is labeled)
    ClearData,
    /// Perform the action waiting for confirmation
    Confirm,
    /// Drop the action waiting for confirmation
    Cancel,

    // View
    /// Toggle hiding of labeled images
    ToggleHide,
    /// Group images by label
    Sort,
    /// Back to the original order
    ResetView,
    /// Go to the next page of thumbnails
    NextPage,
    /// Go to the previous page of thumbnails
    PrevPage,
    /// Change the number of thumbnail columns
    SetThumbnailColumns(usize),
    /// Display host paths instead of container paths
    SetShowHostPaths(bool),

    // Selection
    /// Toggle selection of the thumbnail at a slot of the current page
    ToggleThumbnail(usize),
    /// Select exactly these images (either namespace)
    SelectPaths(Vec<PathBuf>),
    /// Deselect everything
    ClearSelection,

    // Labeling
    /// Label button pressed: choose the label and assign the selection to it
    PressLabel(LabelId),
    /// Remove the selected images from their labels
    Unlabel,
    /// Remove every assignment (asks for confirmation)
    UnlabelAll,
    /// Assign every image scoring above a percentage to the chosen label
    LabelWithThreshold { threshold: f64 },

    // Label list
    /// Append a label
    AddLabel(String),
    /// Delete the label at a position
    DeleteLabel(LabelId),
    /// Switch labeling mode, replacing the label list
    SwitchMode(LabelingMode),
}

impl Event {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Import { .. } => "import",
            Event::ClearData => "clear-data",
            Event::Confirm => "confirm",
            Event::Cancel => "cancel",
            Event::ToggleHide => "toggle-hide",
            Event::Sort => "sort",
            Event::ResetView => "reset-view",
            Event::NextPage => "next-page",
            Event::PrevPage => "prev-page",
            Event::SetThumbnailColumns(_) => "set-columns",
            Event::SetShowHostPaths(_) => "show-host-paths",
            Event::ToggleThumbnail(_) => "toggle-thumbnail",
            Event::SelectPaths(_) => "select",
            Event::ClearSelection => "clear-selection",
            Event::PressLabel(_) => "press-label",
            Event::Unlabel => "unlabel",
            Event::UnlabelAll => "unlabel-all",
            Event::LabelWithThreshold { .. } => "label-with-threshold",
            Event::AddLabel(_) => "add-label",
            Event::DeleteLabel(_) => "delete-label",
            Event::SwitchMode(_) => "switch-mode",
        }
    }
}
