//! Path helpers shared by the resource index
//!
//! Containment is always component-wise (`/ws/res1` does not contain
//! `/ws/res10/a.lua`), and normalization is purely lexical so it works for
//! paths that no longer exist on disk (deleted files, renamed directories).

use std::path::{Component, Path, PathBuf};

/// Recognized manifest file names, in order of preference.
pub const MANIFEST_NAMES: [&str; 2] = ["fxmanifest.lua", "__resource.lua"];

/// True when `path` names a resource manifest.
pub fn is_manifest(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| MANIFEST_NAMES.contains(&name))
}

/// True when `path` is `root` itself or lies underneath it.
pub fn is_within(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// `..` at the root (or beyond a relative path's start) is kept for relative
/// paths and dropped for absolute ones.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Manifest patterns use `/` regardless of platform; drop a leading `./`.
pub fn normalize_pattern(pattern: &str) -> String {
    let pattern = pattern.trim().replace('\\', "/");
    let mut trimmed = pattern.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    trimmed.to_string()
}

/// Whether a pattern component contains glob syntax.
pub fn has_glob_meta(text: &str) -> bool {
    text.contains(['*', '?', '[', '{'])
}
