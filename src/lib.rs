//! labelmaker - image labeling sessions
//!
//! Keeps track of which images carry which label, decides the order thumbnails
//! are shown in, and exports labeled images into one directory per label.
//! All state changes go through [`Session::update`], so the whole tool can be
//! driven and tested without a user interface.

pub mod config;
pub mod constants;
pub mod export;
pub mod files;
pub mod message;
pub mod model;
pub mod paths;
pub mod planner;
pub mod probability;
pub mod project;
pub mod session;

pub use config::AppConfig;
pub use message::Event;
pub use model::{LabelId, LabelList, LabelStore, LabelingMode};
pub use paths::PathNamespace;
pub use planner::ViewMode;
pub use session::Session;
