//! Export of labeled images into one directory per label.
//!
//! Layout: `<output_root>/<label_name>/<original_filename>[_<n>].<ext>`.
//! Each image is decoded and re-encoded with the `image` crate, so unreadable
//! files surface as per-file warnings instead of silently copied garbage.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::files::is_single_component;
use crate::model::{LabelList, LabelStore};

/// Errors that abort an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The output root could not be created
    #[error("Failed to create output directory {path:?}: {source}")]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What went wrong with a single exported image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportWarningKind {
    /// The source image could not be read or decoded
    ReadError,
    /// The label directory or the image file could not be written
    WriteError,
    /// Images are assigned to a label id with no name in the label list
    MissingLabelName,
    /// The label name is not a single directory name under the output root
    InvalidLabelName,
}

/// Problem with one image (or one label) during export.
#[derive(Debug, Clone)]
pub struct ExportWarning {
    /// Image (or label directory) the warning relates to.
    pub path: PathBuf,
    pub kind: ExportWarningKind,
    /// Human-readable warning message.
    pub message: String,
}

impl ExportWarning {
    fn new(path: impl Into<PathBuf>, kind: ExportWarningKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Result of an export operation.
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Number of images written.
    pub images_exported: usize,

    /// Per-image problems; none of them stopped the export.
    pub warnings: Vec<ExportWarning>,

    /// Files created during export.
    pub files_created: Vec<PathBuf>,
}

impl ExportReport {
    /// Check if there were any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    fn warn(&mut self, warning: ExportWarning) {
        log::warn!("{:?}: {}", warning.path, warning.message);
        self.warnings.push(warning);
    }
}

/// Pick a name not present in `existing`: `name`, then `stem_1.ext`, `stem_2.ext`, ...
pub fn unique_file_name(existing: &HashSet<OsString>, name: &Path) -> OsString {
    let file_name = name.file_name().map(OsString::from).unwrap_or_default();
    if !existing.contains(&file_name) {
        return file_name;
    }

    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1..)
        .map(|n| OsString::from(format!("{}_{}{}", stem, n, ext)))
        .find(|candidate| !existing.contains(candidate))
        .unwrap_or(file_name)
}

fn list_names(dir: &Path) -> std::io::Result<HashSet<OsString>> {
    std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect()
}

/// Write every labeled image under `output_root/<label name>/`.
///
/// Labels with no images are skipped, as are labels whose name would leave
/// `output_root`. Existing files are never overwritten.
pub fn export_labels(
    store: &LabelStore,
    labels: &LabelList,
    output_root: &Path,
) -> Result<ExportReport, ExportError> {
    std::fs::create_dir_all(output_root).map_err(|source| ExportError::OutputRoot {
        path: output_root.to_path_buf(),
        source,
    })?;

    let mut report = ExportReport::default();

    for (label, paths) in store.iter() {
        if paths.is_empty() {
            continue;
        }
        let Some(name) = labels.name(label) else {
            report.warn(ExportWarning::new(
                output_root,
                ExportWarningKind::MissingLabelName,
                format!("{} images assigned to unnamed label {}", paths.len(), label),
            ));
            continue;
        };
        if !is_single_component(name) {
            report.warn(ExportWarning::new(
                output_root,
                ExportWarningKind::InvalidLabelName,
                format!(
                    "{} images skipped: label '{}' is not a directory name",
                    paths.len(),
                    name
                ),
            ));
            continue;
        }

        let dir = output_root.join(name);
        let mut existing = match std::fs::create_dir_all(&dir).and_then(|_| list_names(&dir)) {
            Ok(existing) => existing,
            Err(e) => {
                report.warn(ExportWarning::new(
                    &dir,
                    ExportWarningKind::WriteError,
                    format!("Cannot prepare label directory: {}", e),
                ));
                continue;
            }
        };
        log::debug!("Exporting {} images to {:?}", paths.len(), dir);

        for source in paths {
            let img = match image::open(source) {
                Ok(img) => img,
                Err(e) => {
                    report.warn(ExportWarning::new(
                        source,
                        ExportWarningKind::ReadError,
                        format!("Cannot read image: {}", e),
                    ));
                    continue;
                }
            };

            let target_name = unique_file_name(&existing, source);
            let target = dir.join(&target_name);
            match img.save(&target) {
                Ok(()) => {
                    log::trace!("{:?} -> {:?}", source, target);
                    existing.insert(target_name);
                    report.images_exported += 1;
                    report.files_created.push(target);
                }
                Err(e) => report.warn(ExportWarning::new(
                    source,
                    ExportWarningKind::WriteError,
                    format!("Cannot write {:?}: {}", target, e),
                )),
            }
        }
    }

    log::info!(
        "💾 Exported {} images to {:?} ({} warnings)",
        report.images_exported,
        output_root,
        report.warnings.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, shade: u8) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(4, 4, Rgb([shade, shade, shade]))
            .save(&path)
            .unwrap();
        path
    }

    fn names(existing: &[&str]) -> HashSet<OsString> {
        existing.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_unique_file_name() {
        let existing = names(&["a.png", "a_1.png", "b"]);
        assert_eq!(unique_file_name(&existing, Path::new("/x/c.png")), "c.png");
        assert_eq!(unique_file_name(&existing, Path::new("/x/a.png")), "a_2.png");
        assert_eq!(unique_file_name(&existing, Path::new("/x/b")), "b_1");
    }

    #[test]
    fn test_reassigned_image_exported_once() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let a = write_png(src.path(), "a.png", 10);

        let mut store = LabelStore::new();
        store.assign(Some(0), &a);
        store.assign(Some(1), &a);
        let labels = LabelList::new(&["label_0", "label_1"]);

        let report = export_labels(&store, &labels, out.path()).unwrap();
        assert_eq!(report.images_exported, 1);
        assert!(out.path().join("label_1/a.png").is_file());
        assert!(!out.path().join("label_0").exists());
    }

    #[test]
    fn test_collisions_get_suffixes() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        std::fs::create_dir_all(src.path().join("one")).unwrap();
        std::fs::create_dir_all(src.path().join("two")).unwrap();
        let first = write_png(&src.path().join("one"), "img.png", 10);
        let second = write_png(&src.path().join("two"), "img.png", 200);

        std::fs::create_dir_all(out.path().join("Arc")).unwrap();
        write_png(&out.path().join("Arc"), "img.png", 0);

        let mut store = LabelStore::new();
        store.assign_all(Some(0), &[first, second]);
        let labels = LabelList::new(&["Arc"]);

        let report = export_labels(&store, &labels, out.path()).unwrap();
        assert_eq!(report.images_exported, 2);
        assert!(!report.has_warnings());
        let arc = out.path().join("Arc");
        assert!(arc.join("img_1.png").is_file());
        assert!(arc.join("img_2.png").is_file());

        // the pre-existing file is untouched
        let original = image::open(arc.join("img.png")).unwrap().to_rgb8();
        assert_eq!(original.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_unreadable_image_is_skipped_with_warning() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let good = write_png(src.path(), "good.png", 50);
        let bad = src.path().join("bad.png");
        std::fs::write(&bad, b"not an image").unwrap();

        let mut store = LabelStore::new();
        store.assign_all(Some(0), &[bad.clone(), good]);
        let labels = LabelList::new(&["Rods"]);

        let report = export_labels(&store, &labels, out.path()).unwrap();
        assert_eq!(report.images_exported, 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, ExportWarningKind::ReadError);
        assert_eq!(report.warnings[0].path, bad);
        assert!(out.path().join("Rods/good.png").is_file());
    }

    #[test]
    fn test_unnamed_label_is_reported() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let a = write_png(src.path(), "a.png", 1);

        let mut store = LabelStore::new();
        store.assign(Some(3), &a);
        let labels = LabelList::new(&["only"]);

        let report = export_labels(&store, &labels, out.path()).unwrap();
        assert_eq!(report.images_exported, 0);
        assert_eq!(report.warnings[0].kind, ExportWarningKind::MissingLabelName);
    }

    #[test]
    fn test_label_name_cannot_leave_output_root() {
        let src = TempDir::new().unwrap();
        let tmp = TempDir::new().unwrap();
        let a = write_png(src.path(), "a.png", 1);
        let b = write_png(src.path(), "b.png", 2);
        let root = tmp.path().join("outputs");

        let mut store = LabelStore::new();
        store.assign(Some(0), &a);
        store.assign(Some(1), &b);
        let labels = LabelList::read_only(&["../escaped", "Rods"]);

        let report = export_labels(&store, &labels, &root).unwrap();
        assert_eq!(report.images_exported, 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kind, ExportWarningKind::InvalidLabelName);
        assert!(!tmp.path().join("escaped").exists());
        assert!(root.join("Rods/b.png").is_file());
        assert!(report.files_created.iter().all(|f| f.starts_with(&root)));
    }

    #[test]
    fn test_empty_store_creates_only_root() {
        let out = TempDir::new().unwrap();
        let root = out.path().join("outputs");
        let report = export_labels(&LabelStore::new(), &LabelList::new(&["A"]), &root).unwrap();
        assert_eq!(report.images_exported, 0);
        assert!(root.is_dir());
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
    }
}
