//! Filesystem access for the resource index
//!
//! The index never touches `std::fs` directly; everything goes through
//! [`WorkspaceFs`] so tests and embedders can supply their own view of the
//! workspace. [`LocalFs`] is the on-disk implementation built on `walkdir`
//! and `globset`.

use std::io;
use std::path::{Path, PathBuf};

use globset::GlobBuilder;
use tracing::trace;
use walkdir::{DirEntry, WalkDir};

use super::paths::{has_glob_meta, normalize, normalize_pattern};
use crate::errors::IndexError;

/// Minimal filesystem surface the index needs.
pub trait WorkspaceFs: Send + Sync + 'static {
    /// Files under `root` whose root-relative path matches the glob `pattern`.
    ///
    /// `*` never crosses a `/`; `**` spans any number of directories.
    fn find_files(&self, root: &Path, pattern: &str) -> Result<Vec<PathBuf>, IndexError>;

    fn file_exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> Result<String, IndexError>;
}

/// Directory names never descended into while matching globs.
const SKIPPED_DIRS: [&str; 1] = ["node_modules"];

fn is_skipped(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.') || SKIPPED_DIRS.contains(&name))
}

/// The local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }

    /// Leading pattern components without glob syntax, e.g. `client/lib` for
    /// `client/lib/**/*.lua`. Walking starts there instead of at the root.
    fn static_prefix(pattern: &str) -> PathBuf {
        let mut components: Vec<&str> = pattern.split('/').collect();
        components.pop();
        components
            .into_iter()
            .take_while(|component| !has_glob_meta(component))
            .collect()
    }
}

impl WorkspaceFs for LocalFs {
    fn find_files(&self, root: &Path, pattern: &str) -> Result<Vec<PathBuf>, IndexError> {
        let pattern = normalize_pattern(pattern);
        if pattern.is_empty() {
            return Ok(Vec::new());
        }

        if !has_glob_meta(&pattern) {
            let candidate = normalize(&root.join(&pattern));
            return Ok(if candidate.is_file() { vec![candidate] } else { Vec::new() });
        }

        let matcher = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| IndexError::Pattern {
                pattern: pattern.clone(),
                source,
            })?
            .compile_matcher();

        let start = normalize(&root.join(Self::static_prefix(&pattern)));
        if !start.is_dir() {
            return Ok(Vec::new());
        }

        // Links are followed; cycles surface as walk errors and are skipped.
        let mut matches = Vec::new();
        for entry in WalkDir::new(&start)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| !is_skipped(entry))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    trace!("Skipping unreadable entry under {}: {}", start.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            if matcher.is_match(relative.as_str()) {
                matches.push(entry.into_path());
            }
        }

        matches.sort();
        Ok(matches)
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_to_string(&self, path: &Path) -> Result<String, IndexError> {
        let bytes = std::fs::read(path).map_err(|source| io_error(path, source))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn io_error(path: &Path, source: io::Error) -> IndexError {
    IndexError::Io {
        path: path.to_path_buf(),
        source,
    }
}
