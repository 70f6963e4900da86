//! Local path to object key mapping
//!
//! A key is the local path relative to the *anchor* of the declared base path.
//! The anchor is `dirname` of the base path as typed, before any `.` or `..`
//! is resolved: `site/` anchors at `site` itself, `site` and `.` anchor at
//! their parent directory, so `site/img/a.png` maps to `img/a.png` or
//! `site/img/a.png` respectively.

use std::fmt;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

use crate::error::{Error, Result};

/// A forward-slash delimited object key within the bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Wrap a key exactly as the store knows it
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObjectKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Map a local file path to its object key under `base_path`
///
/// Fails with [`Error::InvalidPath`] when `local_path` does not lie strictly
/// below the anchor, so a key never carries `..` segments.
pub fn map_key(local_path: &Path, base_path: &Path) -> Result<ObjectKey> {
    let cwd = std::env::current_dir()?;
    map_key_from(&cwd, local_path, base_path)
}

/// [`map_key`] with an explicit working directory for relative paths
pub fn map_key_from(cwd: &Path, local_path: &Path, base_path: &Path) -> Result<ObjectKey> {
    let anchor = anchor_of(cwd, base_path);
    let local = normalize(cwd, local_path);

    let relative = local.strip_prefix(&anchor).map_err(|_| {
        Error::InvalidPath(format!(
            "{} is not under base directory {}",
            local_path.display(),
            anchor.display()
        ))
    })?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().replace('\\', "/"))
        .collect();

    if parts.is_empty() {
        return Err(Error::InvalidPath(format!(
            "{} resolves to the base directory itself",
            local_path.display()
        )));
    }

    Ok(ObjectKey::new(parts.join("/")))
}

/// The directory keys are made relative to
///
/// `dirname` of the base path as typed, then resolved against `cwd`.
fn anchor_of(cwd: &Path, base_path: &Path) -> PathBuf {
    normalize(cwd, &dirname(base_path))
}

fn is_separator(c: char) -> bool {
    c == '/' || c == MAIN_SEPARATOR
}

/// Everything before the last separator of `path`, trailing separators
/// trimmed unless the head is the root itself
///
/// Works on the text, so `.` gives an empty path and `site/..` gives `site`.
fn dirname(path: &Path) -> PathBuf {
    let text = path.as_os_str().to_string_lossy();
    let Some(last) = text.rfind(is_separator) else {
        return PathBuf::new();
    };
    let head = &text[..=last];
    match head.trim_end_matches(is_separator) {
        "" => PathBuf::from(head),
        trimmed => PathBuf::from(trimmed),
    }
}

/// Make `path` absolute against `cwd` and fold `.` and `..` lexically
fn normalize(cwd: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
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
