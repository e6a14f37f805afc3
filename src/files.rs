//! File discovery and file management under the data root.
//!
//! Browsing lists `{path, kind}` entries under a root; importing flattens a
//! selection of those entries into the working file list. The mover and
//! delete helpers operate on the same entries.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use walkdir::WalkDir;

use crate::constants::{DEFAULT_IMAGE_FORMATS, HIDDEN_FORMATS};

/// Errors from file management operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// I/O failure on a specific path
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Destination escapes the data root
    #[error("Invalid destination '{0}': must be a relative path inside the data root")]
    InvalidDestination(String),

    /// Unrecognised browse or import format string
    #[error("Invalid format '{0}'")]
    InvalidFormat(String),
}

impl FileError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Whether an entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// A listed filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path of the entry
    pub path: PathBuf,
    /// File or directory
    pub kind: EntryKind,
}

impl FileEntry {
    /// A file entry.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
        }
    }

    /// A directory entry.
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Dir,
        }
    }

    /// Check if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Filter applied when browsing the data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseFormat {
    /// Directories only
    Dirs,
    /// Every file and directory
    All,
    /// Entries whose name matches any of the glob patterns (e.g. `*.png`)
    Patterns(NamePatterns),
}

/// Glob patterns matched against entry names, compiled into one set.
#[derive(Debug, Clone)]
pub struct NamePatterns {
    patterns: Vec<String>,
    set: GlobSet,
}

impl NamePatterns {
    /// Compile patterns like `*.png` or `scan_[0-9]*.tif`. Blank patterns are ignored.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, FileError> {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::new();
        for pattern in patterns.iter().map(|p| p.as_ref().trim()) {
            if pattern.is_empty() {
                continue;
            }
            let glob = Glob::new(pattern)
                .map_err(|e| FileError::InvalidFormat(format!("{}: {}", pattern, e)))?;
            builder.add(glob);
            kept.push(pattern.to_string());
        }
        if kept.is_empty() {
            let given: Vec<&str> = patterns.iter().map(AsRef::as_ref).collect();
            return Err(FileError::InvalidFormat(given.join(",")));
        }
        let set = builder
            .build()
            .map_err(|e| FileError::InvalidFormat(e.to_string()))?;
        Ok(Self {
            patterns: kept,
            set,
        })
    }

    /// The patterns as given.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Check a single entry name against every pattern.
    pub fn is_match(&self, name: impl AsRef<Path>) -> bool {
        self.set.is_match(name)
    }
}

impl PartialEq for NamePatterns {
    fn eq(&self, other: &Self) -> bool {
        self.patterns == other.patterns
    }
}

impl Eq for NamePatterns {}

impl FromStr for BrowseFormat {
    type Err = FileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "dir" => Ok(Self::Dirs),
            "*" => Ok(Self::All),
            "" => Err(FileError::InvalidFormat(s.to_string())),
            _ => {
                let patterns: Vec<&str> = s.split(',').collect();
                Ok(Self::Patterns(NamePatterns::new(&patterns)?))
            }
        }
    }
}

/// Extensions accepted when importing directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFormat {
    extensions: Vec<String>,
}

impl ImportFormat {
    /// The default image formats (`*`).
    pub fn images() -> Self {
        Self {
            extensions: DEFAULT_IMAGE_FORMATS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Accepted extensions, lowercase and without dots.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Check if a path has an accepted extension (case-insensitive).
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false)
    }
}

impl Default for ImportFormat {
    fn default() -> Self {
        Self::images()
    }
}

impl FromStr for ImportFormat {
    type Err = FileError;

    /// Parse `*` or a comma-separated list like `*.jpg,*.jpeg`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "*" {
            return Ok(Self::images());
        }
        let extensions: Vec<String> = s
            .split(',')
            .filter_map(|p| p.trim().rsplit_once('.').map(|(_, ext)| ext.to_lowercase()))
            .filter(|ext| !ext.is_empty())
            .collect();
        if extensions.is_empty() {
            return Err(FileError::InvalidFormat(s.to_string()));
        }
        Ok(Self { extensions })
    }
}

/// Check a file name against the hidden list and reject names with an empty stem
/// (`.png`, `a..png`).
pub fn is_listable_file_name(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) => {
            !HIDDEN_FORMATS.contains(&ext) && stem.rsplit('.').next().is_some_and(|s| !s.is_empty())
        }
        None => true,
    }
}

/// Check that `name` can be joined onto a root as exactly one directory level.
///
/// Rejects `.`, `..`, absolute paths and anything holding a path separator.
pub fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
        && !name.contains(|c: char| c == '/' || c == '\\')
}

/// List entries under `root` recursively, filtered by `format`.
///
/// A missing root yields an empty listing.
pub fn list_entries(root: &Path, format: &BrowseFormat) -> Vec<FileEntry> {
    if !root.exists() {
        log::debug!("Browse root {:?} does not exist", root);
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                log::warn!("Skipping unreadable entry under {:?}: {}", root, err);
                None
            }
        })
    {
        let is_dir = entry.file_type().is_dir();
        let name = entry.file_name().to_string_lossy();

        let keep = match format {
            BrowseFormat::Dirs => is_dir,
            BrowseFormat::All => is_dir || is_listable_file_name(&name),
            BrowseFormat::Patterns(patterns) => {
                patterns.is_match(entry.file_name()) && (is_dir || is_listable_file_name(&name))
            }
        };
        if !keep {
            continue;
        }

        let path = entry.into_path();
        if seen.insert(path.clone()) {
            entries.push(FileEntry {
                path,
                kind: if is_dir { EntryKind::Dir } else { EntryKind::File },
            });
        }
    }

    log::debug!("Listed {} entries under {:?}", entries.len(), root);
    entries
}

/// Collect files under `dir` with an accepted extension into `files`, skipping paths
/// already present. Files in a directory come before its subdirectories.
///
/// Symbolic links are followed and recorded under the link's own path.
pub fn collect_from_dir(dir: &Path, format: &ImportFormat, files: &mut Vec<PathBuf>) {
    let mut seen: HashSet<PathBuf> = files.iter().cloned().collect();

    let walker = WalkDir::new(dir).follow_links(true).sort_by(|a, b| {
        a.file_type()
            .is_dir()
            .cmp(&b.file_type().is_dir())
            .then_with(|| a.file_name().cmp(b.file_name()))
    });

    for entry in walker.into_iter() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("Failed to scan under {:?}: {}", dir, err);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !is_listable_file_name(&name) || !format.accepts(entry.path()) {
            continue;
        }
        let path = entry.into_path();
        if seen.insert(path.clone()) {
            files.push(path);
        }
    }
}

/// Flatten a selection into the working file list.
///
/// Selected files are taken as-is; selected directories are scanned recursively for
/// the import format's extensions. The first occurrence of a path wins.
pub fn flatten_selection(selection: &[FileEntry], format: &ImportFormat) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();

    for entry in selection {
        match entry.kind {
            EntryKind::Dir => collect_from_dir(&entry.path, format, &mut files),
            EntryKind::File => {
                if !files.contains(&entry.path) {
                    files.push(entry.path.clone());
                }
            }
        }
    }

    log::info!(
        "Flattened {} selected entries into {} files",
        selection.len(),
        files.len()
    );
    files
}

/// Resolve a user-supplied relative destination inside `root`.
pub fn resolve_destination(root: &Path, dest: Option<&str>) -> Result<PathBuf, FileError> {
    let Some(dest) = dest.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(root.to_path_buf());
    };
    let relative = Path::new(dest);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(FileError::InvalidDestination(dest.to_string()));
    }
    Ok(root.join(relative))
}

/// Move a single file into `destination`, creating it if needed.
pub fn move_file(source: &Path, destination: &Path) -> Result<PathBuf, FileError> {
    fs::create_dir_all(destination).map_err(|e| FileError::io(destination, e))?;
    let Some(name) = source.file_name() else {
        return Err(FileError::io(
            source,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        ));
    };
    let target = destination.join(name);

    if fs::rename(source, &target).is_err() {
        // rename fails across filesystems; fall back to copy + remove
        fs::copy(source, &target).map_err(|e| FileError::io(source, e))?;
        fs::remove_file(source).map_err(|e| FileError::io(source, e))?;
    }
    log::debug!("Moved {:?} -> {:?}", source, target);
    Ok(target)
}

/// Move a directory tree to `destination/<dirname>` and remove the source.
pub fn move_dir(source: &Path, destination: &Path) -> Result<PathBuf, FileError> {
    let Some(name) = source.file_name() else {
        return Err(FileError::io(
            source,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no directory name"),
        ));
    };
    let target = destination.join(name);
    fs::create_dir_all(&target).map_err(|e| FileError::io(&target, e))?;

    let children = fs::read_dir(source).map_err(|e| FileError::io(source, e))?;
    for child in children {
        let child = child.map_err(|e| FileError::io(source, e))?;
        let path = child.path();
        if path.is_dir() {
            move_dir(&path, &target)?;
        } else {
            move_file(&path, &target)?;
        }
    }

    if source.exists() {
        fs::remove_dir_all(source).map_err(|e| FileError::io(source, e))?;
    }
    Ok(target)
}

/// Move selected entries into `destination`. Returns the new locations.
pub fn move_entries(entries: &[FileEntry], destination: &Path) -> Result<Vec<PathBuf>, FileError> {
    fs::create_dir_all(destination).map_err(|e| FileError::io(destination, e))?;
    let mut moved = Vec::with_capacity(entries.len());
    for entry in entries {
        let target = if entry.is_dir() {
            move_dir(&entry.path, destination)?
        } else {
            move_file(&entry.path, destination)?
        };
        moved.push(target);
    }
    log::info!("Moved {} entries into {:?}", moved.len(), destination);
    Ok(moved)
}

/// Delete selected files and directory trees.
pub fn delete_entries(entries: &[FileEntry]) -> Result<usize, FileError> {
    let mut deleted = 0;
    for entry in entries {
        if !entry.path.exists() {
            log::warn!("Nothing to delete at {:?}", entry.path);
            continue;
        }
        if entry.path.is_dir() {
            fs::remove_dir_all(&entry.path).map_err(|e| FileError::io(&entry.path, e))?;
        } else {
            fs::remove_file(&entry.path).map_err(|e| FileError::io(&entry.path, e))?;
        }
        deleted += 1;
    }
    log::info!("Deleted {} entries", deleted);
    Ok(deleted)
}
