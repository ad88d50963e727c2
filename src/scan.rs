//! Eligible-photo discovery.
//!
//! Lists the regular files directly inside a source directory whose extension
//! is in the configured [`ExtensionSet`]. The listing is not recursive, so the
//! output directory created inside the source directory is never picked up
//! on a second run.
//!
//! ## Ordering
//!
//! Files are grouped by the position of their extension in the set (every
//! `*.jpg`, then every `*.JPG`, ...). Inside a group the order is whatever the
//! filesystem listing returns; nothing is sorted.
//!
//! ## Matching
//!
//! Matching is exact unless the set is case-insensitive. Which default applies
//! is decided by [`ExtensionSet::platform_default`] at the edge of the program,
//! never inside the scanner:
//!
//! | Platform | Names | Case |
//! |---|---|---|
//! | Windows | `jpg jpeg png` | insensitive |
//! | others | `jpg JPG jpeg JPEG png PNG` | exact |
//!
//! Names starting with `.` are skipped, as a shell glob would.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Source is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Failed to list {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// The recognised photo extensions and how to compare them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExtensionSet {
    /// Extensions without the leading dot, in enumeration order.
    pub names: Vec<String>,
    /// Compare extensions ignoring ASCII case.
    pub ignore_case: bool,
}

impl ExtensionSet {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>, ignore_case: bool) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            ignore_case,
        }
    }

    /// The set used when nothing is configured. See the [module docs](self).
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::new(["jpg", "jpeg", "png"], true)
        } else {
            Self::new(["jpg", "JPG", "jpeg", "JPEG", "png", "PNG"], false)
        }
    }

    /// Index of the first configured name matching `ext`.
    pub fn position(&self, ext: &str) -> Option<usize> {
        self.names.iter().position(|name| {
            if self.ignore_case {
                name.eq_ignore_ascii_case(ext)
            } else {
                name == ext
            }
        })
    }

    /// Group index for `path`, or `None` if it is not an eligible name.
    fn group_of(&self, path: &Path) -> Option<usize> {
        let name = path.file_name()?.to_str()?;
        if name.starts_with('.') {
            return None;
        }
        let ext = path.extension()?.to_str()?;
        self.position(ext)
    }
}

impl Default for ExtensionSet {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// List eligible photos in `dir`, grouped by extension order.
pub fn scan_directory(dir: &Path, extensions: &ExtensionSet) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::NotADirectory(dir.to_path_buf()));
    }

    let mut grouped: Vec<(usize, PathBuf)> = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            // A dangling symlink is not a photo; a root that can't be read is fatal.
            Err(e) if e.depth() > 0 => {
                debug!("skipping unreadable entry: {}", e);
                continue;
            }
            Err(e) => {
                return Err(ScanError::Walk {
                    path: dir.to_path_buf(),
                    source: e,
                });
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(group) = extensions.group_of(entry.path()) {
            grouped.push((group, entry.into_path()));
        }
    }

    // Stable: listing order survives inside each group.
    grouped.sort_by_key(|(group, _)| *group);
    Ok(grouped.into_iter().map(|(_, path)| path).collect())
}
