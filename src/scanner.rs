//! File system scanner for discovering icon files.
//!
//! Recursively walks a source directory, collecting every `.svg` file and
//! deriving the id it will carry inside the sprite.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Result, SpriteError};

/// Extension of icon files, compared case-insensitively.
pub const ICON_EXTENSION: &str = "svg";

/// Separator used when joining relative path segments into an id.
const ID_SEPARATOR: char = '_';

/// A discovered icon file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconEntry {
    /// Identifier of the icon inside the sprite.
    pub id: String,
    /// Absolute or working-directory relative path of the source file.
    pub source_path: PathBuf,
}

/// Check whether a path names an icon file (`*.svg`, any case).
pub fn is_icon_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ICON_EXTENSION))
        .unwrap_or(false)
}

/// Derive the sprite id for `path` relative to `root`.
///
/// Path segments are joined with `_`, the extension is dropped and every
/// character outside `[A-Za-z0-9-_]` becomes `_`.
pub fn icon_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);

    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let Some(last) = segments.last_mut() {
        if let Some(stem_len) = last.len().checked_sub(ICON_EXTENSION.len() + 1) {
            let is_icon = last
                .get(stem_len..)
                .and_then(|ext| ext.strip_prefix('.'))
                .is_some_and(|ext| ext.eq_ignore_ascii_case(ICON_EXTENSION));
            if is_icon {
                last.truncate(stem_len);
            }
        }
    }

    segments
        .join(&ID_SEPARATOR.to_string())
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                ID_SEPARATOR
            }
        })
        .collect()
}

/// Resolve symlinks and `..` in `path`.
///
/// A path that no longer exists (a removed file) is resolved through its
/// parent; failing that it is returned as given.
pub(crate) fn canonical_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => fs::canonicalize(parent)
            .map(|dir| dir.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

/// Scan `root` for icon files.
///
/// Entries come back in traversal order, with siblings sorted by file
/// name. `exclude` is skipped if it turns up inside the tree (the generated
/// sprite when the output directory sits under the source directory).
pub fn scan_icons(root: &Path, exclude: Option<&Path>) -> Result<Vec<IconEntry>> {
    if !root.exists() {
        return Err(SpriteError::Config {
            message: format!("Source directory {} does not exist", root.display()),
            help: Some("Check the source_dir setting or pass --source".to_string()),
        });
    }
    if !root.is_dir() {
        return Err(SpriteError::config(format!(
            "Source path {} is not a directory",
            root.display()
        )));
    }

    let exclude = exclude.map(canonical_path);
    let mut entries = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_icon_path(entry.path()) {
            continue;
        }

        let excluded = exclude.as_deref().is_some_and(|ex| {
            ex.file_name() == Some(entry.file_name()) && canonical_path(entry.path()) == ex
        });
        if excluded {
            debug!("Skipping generated sprite {}", entry.path().display());
            continue;
        }

        let id = icon_id(root, entry.path());
        let source_path = entry.into_path();

        if let Some(first) = seen.get(&id) {
            return Err(SpriteError::DuplicateId {
                id,
                first: first.clone(),
                second: source_path,
            });
        }
        seen.insert(id.clone(), source_path.clone());

        entries.push(IconEntry { id, source_path });
    }

    Ok(entries)
}
