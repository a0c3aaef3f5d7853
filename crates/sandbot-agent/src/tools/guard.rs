//! Path guard — keeps every tool path inside the working root.
//!
//! Resolution happens in two passes:
//! 1. Lexical: join onto the root and fold `.`/`..` without touching the disk.
//!    Anything that lands outside the root is rejected right there.
//! 2. Physical: canonicalize the deepest existing ancestor and re-append the
//!    remaining components, so a symlink inside the root cannot point out of it.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error("path {0:?} resolves outside the working root")]
    OutsideSandbox(String),
}

/// Resolve `relative` against `root` and check it stays at or below `root`.
///
/// `root` must be absolute and canonical. An absolute `relative` replaces the
/// root before the check. Returns the resolved absolute path.
pub fn resolve(root: &Path, relative: &str) -> Result<PathBuf, GuardError> {
    let outside = || GuardError::OutsideSandbox(relative.to_string());

    let lexical = normalize(&root.join(relative));
    if !lexical.starts_with(root) {
        debug!(path = relative, "rejected by lexical check");
        return Err(outside());
    }

    let physical = canonicalize_existing(&lexical).ok_or_else(outside)?;
    if !physical.starts_with(root) {
        debug!(path = relative, resolved = %physical.display(), "rejected: symlink escapes root");
        return Err(outside());
    }
    Ok(physical)
}

/// Fold `.` and `..` components. `..` at the filesystem root stays at the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the deepest ancestor that exists, then re-append the rest.
///
/// A dangling symlink on the way yields `None`: its target cannot be checked.
fn canonicalize_existing(path: &Path) -> Option<PathBuf> {
    for ancestor in path.ancestors() {
        match ancestor.canonicalize() {
            Ok(canonical) => {
                let rest = path.strip_prefix(ancestor).ok()?;
                return Some(if rest.as_os_str().is_empty() {
                    canonical
                } else {
                    canonical.join(rest)
                });
            }
            Err(_) if ancestor.symlink_metadata().is_ok() => return None,
            Err(_) => continue,
        }
    }
    None
}
