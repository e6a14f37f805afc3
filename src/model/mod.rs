//! Data models for labelmaker.

mod label_list;
mod label_store;

pub use label_list::{LabelError, LabelList, LabelingMode};
pub use label_store::{LabelId, LabelStore};
