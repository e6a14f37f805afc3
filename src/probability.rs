//! Classifier probability table.
//!
//! A CSV table with one row per image: column 0 is the image filename (as the
//! classifier saw it, usually a display-namespace path relative to some root)
//! and columns 1..N are per-label scores, either fractions in `[0, 1]` or
//! percentages in `[0, 100]`. The header row names the labels. Filenames
//! containing commas must be quoted.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::LabelId;
use crate::paths::PathNamespace;

/// Errors from reading a probability table.
#[derive(Debug, Error)]
pub enum ProbabilityError {
    /// I/O error reading the table
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The table has no header row
    #[error("Probability table is empty")]
    Empty,

    /// The header has no label columns
    #[error("Probability table has no label columns")]
    NoLabels,

    /// A row has the wrong number of columns
    #[error("Line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A score is not a number
    #[error("Line {line}: invalid score '{value}'")]
    InvalidScore { line: usize, value: String },
}

/// One image's scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityRow {
    /// Filename as written in the table
    pub filename: String,
    /// One score per label column
    pub scores: Vec<f64>,
}

/// Per-image classifier scores, read once and shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityTable {
    labels: Vec<String>,
    rows: Vec<ProbabilityRow>,
    percent: bool,
}

/// Split one CSV line. Fields may be quoted; a quoted field can hold commas and
/// `""` stands for a literal quote. Quoted fields spanning lines are not supported.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field).trim().to_string()),
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

impl ProbabilityTable {
    /// Parse a table from CSV text.
    pub fn from_csv_str(text: &str) -> Result<Self, ProbabilityError> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty());

        let (_, header) = lines.next().ok_or(ProbabilityError::Empty)?;
        let header = split_fields(header);
        if header.len() < 2 {
            return Err(ProbabilityError::NoLabels);
        }
        let labels: Vec<String> = header[1..].to_vec();

        let mut rows = Vec::new();
        for (idx, line) in lines {
            let line_no = idx + 1;
            let fields = split_fields(line);
            if fields.len() != header.len() {
                return Err(ProbabilityError::ColumnCount {
                    line: line_no,
                    expected: header.len(),
                    found: fields.len(),
                });
            }
            let scores = fields[1..]
                .iter()
                .map(|v| {
                    v.parse::<f64>().map_err(|_| ProbabilityError::InvalidScore {
                        line: line_no,
                        value: v.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(ProbabilityRow {
                filename: fields[0].clone(),
                scores,
            });
        }

        let percent = rows.iter().flat_map(|r| r.scores.iter()).any(|s| *s > 1.0);
        log::debug!(
            "Parsed probability table: {} labels, {} rows ({})",
            labels.len(),
            rows.len(),
            if percent { "percent" } else { "fraction" }
        );

        Ok(Self {
            labels,
            rows,
            percent,
        })
    }

    /// Load a table from a CSV file.
    pub fn load(path: &Path) -> Result<Self, ProbabilityError> {
        let text = std::fs::read_to_string(path)?;
        let table = Self::from_csv_str(&text)?;
        log::info!(
            "Loaded probability table {:?} with {} rows",
            path,
            table.rows.len()
        );
        Ok(table)
    }

    /// Label names from the header, in column order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Parsed rows in file order.
    pub fn rows(&self) -> &[ProbabilityRow] {
        &self.rows
    }

    /// A raw score expressed in percent.
    pub fn to_percent(&self, score: f64) -> f64 {
        if self.percent { score } else { score * 100.0 }
    }

    /// Find the working file a table filename refers to.
    ///
    /// Absolute filenames are translated into the container namespace and matched
    /// exactly; relative filenames match the trailing components of a file path.
    pub fn resolve<'a>(
        &self,
        filename: &str,
        files: &'a [PathBuf],
        namespace: &PathNamespace,
    ) -> Option<&'a PathBuf> {
        let name = Path::new(filename);
        if name.is_absolute() {
            let container = namespace.to_container(name);
            files.iter().find(|f| **f == container)
        } else {
            files.iter().find(|f| f.ends_with(name))
        }
    }

    /// Row for a working file, if the table has one.
    pub fn row_for(&self, path: &Path, namespace: &PathNamespace) -> Option<&ProbabilityRow> {
        self.rows.iter().find(|row| {
            let name = Path::new(&row.filename);
            if name.is_absolute() {
                namespace.to_container(name) == path
            } else {
                path.ends_with(name)
            }
        })
    }

    /// Working files with their `label` score in percent. Rows that match no
    /// working file are skipped.
    pub fn candidates(
        &self,
        label: LabelId,
        files: &[PathBuf],
        namespace: &PathNamespace,
    ) -> Vec<(PathBuf, f64)> {
        if label >= self.labels.len() {
            log::warn!("Probability table has no column for label {}", label);
            return Vec::new();
        }
        let mut candidates = Vec::new();
        let mut unmatched = 0;
        for row in &self.rows {
            match self.resolve(&row.filename, files, namespace) {
                Some(path) => candidates.push((path.clone(), self.to_percent(row.scores[label]))),
                None => unmatched += 1,
            }
        }
        if unmatched > 0 {
            log::warn!(
                "{} probability rows do not match any imported image",
                unmatched
            );
        }
        candidates
    }

    /// Scores of a row as "label: score" lines, in percent.
    pub fn describe(&self, row: &ProbabilityRow) -> String {
        self.labels
            .iter()
            .zip(&row.scores)
            .map(|(label, score)| format!("{}: {:.1}", label, self.to_percent(*score)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
