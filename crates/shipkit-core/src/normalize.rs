//! Upstream path normalization
//!
//! Release archives usually wrap their manifests in one or more directories
//! (`myapp-1.2.0/manifests/...`). That nesting is stripped so the
//! materialized tree starts at the first directory where files diverge.
//! Files under the reserved `userdata/` directory are generated at retrieval
//! time and are never rewritten.

use tracing::debug;

use crate::release::is_userdata_path;
use crate::upstream::UpstreamFile;

/// Split a slash separated path into its directory segments and file name
///
/// Empty and `.` segments are dropped, so `./a//b/c.yaml` yields
/// `(["a", "b"], "c.yaml")`.
pub fn split_path(path: &str) -> (Vec<&str>, &str) {
    let (dir, name) = path.rsplit_once('/').unwrap_or(("", path));
    let segments = dir
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();
    (segments, name)
}

/// Longest run of leading directory segments shared by every path
///
/// Comparison is segment-wise: `app/a.yaml` and `apps/b.yaml` share nothing.
pub fn common_dir_prefix<'a, I>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut paths = paths.into_iter();
    let Some(first) = paths.next() else {
        return Vec::new();
    };

    let (mut prefix, _) = split_path(first);
    for path in paths {
        if prefix.is_empty() {
            break;
        }
        let (segments, _) = split_path(path);
        let shared = prefix
            .iter()
            .zip(&segments)
            .take_while(|(a, b)| a == b)
            .count();
        prefix.truncate(shared);
    }

    prefix.into_iter().map(str::to_string).collect()
}

/// Strip the common directory prefix of all non-userdata files
///
/// Returns the normalized files followed by the untouched userdata files.
/// With no non-userdata files the input is returned as is.
pub fn normalize_files(files: Vec<UpstreamFile>) -> Vec<UpstreamFile> {
    let (userdata, regular): (Vec<_>, Vec<_>) = files
        .into_iter()
        .partition(|file| is_userdata_path(&file.path));

    if regular.is_empty() {
        return userdata;
    }

    let prefix = common_dir_prefix(regular.iter().map(|file| file.path.as_str()));
    if !prefix.is_empty() {
        debug!(prefix = %prefix.join("/"), files = regular.len(), "stripping common directory prefix");
    }

    let mut normalized: Vec<UpstreamFile> = regular
        .into_iter()
        .map(|file| {
            let path = strip_dir_prefix(&file.path, prefix.len());
            UpstreamFile { path, ..file }
        })
        .collect();

    normalized.extend(userdata);
    normalized
}

fn strip_dir_prefix(path: &str, depth: usize) -> String {
    let (segments, name) = split_path(path);
    let remaining = &segments[depth.min(segments.len())..];
    if remaining.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", remaining.join("/"), name)
    }
}
