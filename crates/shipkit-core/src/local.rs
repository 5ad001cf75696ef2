//! Local release reader
//!
//! Reads an unpacked release from a directory tree instead of the
//! distribution service. Used for offline installs and development.

use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{CoreError, Result};
use crate::release::Release;

/// Read every regular file under `root` into a release
///
/// Manifest keys are root-relative, slash separated, with no leading
/// separator. The update cursor is the offline sentinel.
pub fn read_local_release(root: &Path) -> Result<Release> {
    if !root.is_dir() {
        return Err(CoreError::LocalRelease {
            path: root.display().to_string(),
            message: "not a directory".to_string(),
        });
    }

    let mut release = Release::offline();

    let mut entries: Vec<_> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| CoreError::LocalRelease {
            path: root.display().to_string(),
            message: e.to_string(),
        })?;
    entries.retain(|entry| entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file()));

    for entry in entries {
        let rel_path = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let key = rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let content = std::fs::read(entry.path())?;
        release.insert(key, content);
    }

    debug!(root = %root.display(), manifests = release.len(), "read local release");
    Ok(release)
}
