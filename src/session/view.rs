//! Read-only views of a session: the current thumbnail page and labeling progress.

use std::fmt;
use std::path::PathBuf;

use super::Session;
use crate::model::{LabelId, LabelingMode};

/// One thumbnail on the current page.
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    /// Slot on the page, as used by thumbnail toggling
    pub slot: usize,
    /// Index into the working file list
    pub index: usize,
    /// Path in the namespace currently displayed
    pub path: PathBuf,
    pub label: Option<LabelId>,
    pub label_name: Option<String>,
    /// Border colour of the label, if labeled
    pub color: Option<&'static str>,
    pub selected: bool,
    /// Classifier scores, MLCoach mode only
    pub scores: Option<String>,
}

/// Image count for one label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelProgress {
    pub name: String,
    pub count: usize,
    /// Share of the working file list, in percent
    pub percent: f64,
    pub color: &'static str,
}

/// Labeling progress over the working file list.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub labels: Vec<LabelProgress>,
    pub labeled: usize,
    pub total: usize,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Labeled {} out of {} images.", self.labeled, self.total)
    }
}

impl Session {
    /// Thumbnails of the current page, in display order.
    pub fn thumbnails(&self) -> Vec<Thumbnail> {
        let table = self
            .probabilities()
            .filter(|_| self.mode() == LabelingMode::MlCoach);

        self.order()
            .iter()
            .skip(self.page() * self.page_size())
            .take(self.page_size())
            .enumerate()
            .map(|(slot, &index)| {
                let stored = &self.files()[index];
                let label = self.store().label_of(stored);
                let label_name = label.and_then(|l| self.labels().name(l)).map(str::to_string);
                if label.is_some() && label_name.is_none() {
                    log::warn!("{:?} carries label {:?} with no name", stored, label);
                }
                Thumbnail {
                    slot,
                    index,
                    path: self.display_path(stored),
                    label,
                    label_name,
                    color: label.map(|l| self.labels().color(l)),
                    selected: self.selection().contains(stored),
                    scores: table.and_then(|t| {
                        t.row_for(stored, self.namespace()).map(|row| t.describe(row))
                    }),
                }
            })
            .collect()
    }

    /// Per-label counts over the working file list.
    pub fn progress(&self) -> Progress {
        let total = self.files().len();
        let counts: Vec<usize> = (0..self.labels().len())
            .map(|label| self.store().indices(label, self.files()).len())
            .collect();
        let labeled = self
            .files()
            .iter()
            .filter(|f| self.store().is_labeled(f))
            .count();

        let labels = self
            .labels()
            .names()
            .iter()
            .zip(counts)
            .enumerate()
            .map(|(label, (name, count))| LabelProgress {
                name: name.clone(),
                count,
                percent: if total == 0 {
                    0.0
                } else {
                    count as f64 * 100.0 / total as f64
                },
                color: self.labels().color(label),
            })
            .collect();

        Progress {
            labels,
            labeled,
            total,
        }
    }
}
