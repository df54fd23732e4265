//! Recursive discovery of `.proto` files under a repository root.

use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Schema file extension, without the dot.
pub const PROTO_EXTENSION: &str = "proto";

/// Version-control metadata directories that are never descended into.
pub const VCS_DIRS: &[&str] = &[".git"];

pub fn is_proto_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == PROTO_EXTENSION)
}

pub(crate) fn is_vcs_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| VCS_DIRS.contains(&name))
}

/// Finds every `.proto` file below `root`, returned relative to `root`.
///
/// Order is whatever the directory traversal yields. An empty result is not an
/// error; a missing or unreadable root is.
pub fn find_proto_files(root: impl AsRef<Path>) -> io::Result<Vec<PathBuf>> {
    let root = root.as_ref();
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_vcs_dir(entry));
    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() || !is_proto_file(entry.path()) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        files.push(relative.to_path_buf());
    }

    debug!(root = %root.display(), files = files.len(), "Discovered proto files");
    Ok(files)
}

/// [`find_proto_files`], sorted lexicographically so argument vectors are
/// reproducible across platforms.
pub fn find_proto_files_sorted(root: impl AsRef<Path>) -> io::Result<Vec<PathBuf>> {
    let mut files = find_proto_files(root)?;
    files.sort();
    Ok(files)
}
