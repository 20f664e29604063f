// SPDX-License-Identifier: CC0-1.0

//! Path utility functions for locating project files and linking generated code.
//!
//! Everything here is lexical: paths are joined, normalized and diffed without
//! consulting the filesystem, except for [`find_ancestor_with`] which checks for
//! the existence of a marker file.

use std::path::{Component, Path, PathBuf};

/// Find the closest directory containing `marker`, starting at `start`
///
/// This function walks up the directory tree from `start` until it finds a
/// directory that contains a file or directory named `marker`.
///
/// # Returns
///
/// Returns the directory containing the marker, or `None` once the filesystem
/// root has been checked without a match.
pub fn find_ancestor_with(start: &Path, marker: &str) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(marker).exists() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding normal component.
///
/// Leading `..` components of a relative path are kept.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use prismany_path::normalize;
/// assert_eq!(normalize(Path::new("a/./b/../c")), PathBuf::from("a/c"));
/// assert_eq!(normalize(Path::new("../a/b/..")), PathBuf::from("../a"));
/// assert_eq!(normalize(Path::new("./node_modules/x")), PathBuf::from("node_modules/x"));
/// ```
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve `path` against `base` unless it is already absolute, then normalize.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use prismany_path::absolutize;
/// assert_eq!(
///     absolutize(Path::new("/work/app"), Path::new("./node_modules/prismany")),
///     PathBuf::from("/work/app/node_modules/prismany")
/// );
/// assert_eq!(absolutize(Path::new("/work/app"), Path::new("/tmp/out")), PathBuf::from("/tmp/out"));
/// ```
pub fn absolutize(base: &Path, path: &Path) -> PathBuf { normalize(&base.join(path)) }

/// Relative path leading from the directory `from_dir` to `to`.
///
/// Both paths should be absolute (see [`absolutize`]); returns `None` when no
/// relative path exists between them.
///
/// ```
/// use std::path::{Path, PathBuf};
/// use prismany_path::relative_path;
/// assert_eq!(
///     relative_path(Path::new("/out/clients/users"), Path::new("/out/clients/shared/runtime")),
///     Some(PathBuf::from("../shared/runtime"))
/// );
/// ```
pub fn relative_path(from_dir: &Path, to: &Path) -> Option<PathBuf> {
    pathdiff::diff_paths(normalize(to), normalize(from_dir))
}

/// Render a path with `/` separators regardless of platform.
///
/// ```
/// use std::path::Path;
/// use prismany_path::to_slash;
/// assert_eq!(to_slash(Path::new("clients/users/index.js")), "clients/users/index.js");
/// ```
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
        .replace("//", "/")
}

/// Render a relative path as a JavaScript module specifier.
///
/// Specifiers that would otherwise be read as bare package names get a `./`
/// prefix.
///
/// ```
/// use std::path::Path;
/// use prismany_path::module_specifier;
/// assert_eq!(module_specifier(Path::new("clients/users/index.js")), "./clients/users/index.js");
/// assert_eq!(module_specifier(Path::new("../shared/runtime")), "../shared/runtime");
/// assert_eq!(module_specifier(Path::new("")), ".");
/// ```
pub fn module_specifier(relative: &Path) -> String {
    let slashed = to_slash(relative);
    if slashed.is_empty() {
        ".".to_string()
    } else if slashed.starts_with("./") || slashed.starts_with("../") || slashed == ".." {
        slashed
    } else {
        format!("./{}", slashed)
    }
}

/// Whether `ancestor` is `path` itself or one of its ancestors (lexically).
///
/// ```
/// use std::path::Path;
/// use prismany_path::is_same_or_ancestor;
/// assert!(is_same_or_ancestor(Path::new("/work"), Path::new("/work/prisma")));
/// assert!(is_same_or_ancestor(Path::new("/work"), Path::new("/work")));
/// assert!(!is_same_or_ancestor(Path::new("/work/out"), Path::new("/work/prisma")));
/// ```
pub fn is_same_or_ancestor(ancestor: &Path, path: &Path) -> bool {
    normalize(path).starts_with(normalize(ancestor))
}
