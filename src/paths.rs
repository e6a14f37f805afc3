//! Translation between the container and host views of the data root.
//!
//! The same files are reachable under two absolute prefixes: the root the
//! tool runs against (container namespace) and the root the user's machine
//! mounts it at (host namespace). Paths are always stored in the container
//! namespace and translated only when shown.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A pair of equivalent roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathNamespace {
    /// Root as seen by the tool.
    pub container_root: PathBuf,
    /// Root as mounted on the user's machine.
    pub host_root: PathBuf,
}

impl PathNamespace {
    /// Create a namespace pair from the two roots.
    pub fn new(container_root: impl Into<PathBuf>, host_root: impl Into<PathBuf>) -> Self {
        Self {
            container_root: container_root.into(),
            host_root: host_root.into(),
        }
    }

    /// A namespace where both roots are the same directory.
    pub fn identity(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            container_root: root.clone(),
            host_root: root,
        }
    }

    /// Rewrite a container path into the host namespace.
    ///
    /// Paths already under the host root, or under neither root, come back unchanged.
    pub fn to_host(&self, path: &Path) -> PathBuf {
        rebase(path, &self.container_root, &self.host_root)
    }

    /// Rewrite a host path into the container namespace.
    ///
    /// Paths already under the container root, or under neither root, come back unchanged.
    pub fn to_container(&self, path: &Path) -> PathBuf {
        rebase(path, &self.host_root, &self.container_root)
    }

    /// Translate a stored (container) path for display.
    pub fn display(&self, path: &Path, show_host: bool) -> PathBuf {
        if show_host {
            self.to_host(path)
        } else {
            self.to_container(path)
        }
    }

    /// Translate a list of paths into the container namespace.
    pub fn to_container_all<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<PathBuf> {
        paths.iter().map(|p| self.to_container(p.as_ref())).collect()
    }
}

fn rebase(path: &Path, from: &Path, to: &Path) -> PathBuf {
    if path.starts_with(to) {
        return path.to_path_buf();
    }
    match path.strip_prefix(from) {
        Ok(relative) if relative.as_os_str().is_empty() => to.to_path_buf(),
        Ok(relative) => to.join(relative),
        Err(_) => {
            log::trace!("Path {:?} is outside both roots, leaving it unchanged", path);
            path.to_path_buf()
        }
    }
}
