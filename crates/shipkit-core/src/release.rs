//! Release snapshot: the raw manifests of one upstream version

use indexmap::IndexMap;

use crate::normalize::split_path;
use crate::upstream::UpstreamFile;

/// Reserved top-level directory for files generated at retrieval time
pub const USERDATA_DIR: &str = "userdata";

/// Update cursor of releases read from disk
pub const OFFLINE_UPDATE_CURSOR: &str = "-1";

/// One fetched or locally read snapshot of an upstream
///
/// Manifests keep the order they were read in (archive order or directory
/// walk order); classification relies on that order when a release carries
/// more than one candidate document of a kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Release {
    /// Opaque token identifying this release for update checks
    pub update_cursor: String,

    /// Human readable version
    pub version_label: String,

    /// Raw file contents keyed by release-relative path
    pub manifests: IndexMap<String, Vec<u8>>,
}

impl Release {
    pub fn new(update_cursor: impl Into<String>, version_label: impl Into<String>) -> Self {
        Self {
            update_cursor: update_cursor.into(),
            version_label: version_label.into(),
            manifests: IndexMap::new(),
        }
    }

    /// An empty release with the offline update cursor
    pub fn offline() -> Self {
        Self::new(OFFLINE_UPDATE_CURSOR, "")
    }

    /// Add a manifest, replacing any previous content at the same path
    pub fn insert(&mut self, path: impl Into<String>, content: Vec<u8>) {
        self.manifests.insert(path.into(), content);
    }

    /// Add a generated file under the reserved userdata directory
    pub fn insert_userdata(&mut self, file_name: &str, content: Vec<u8>) {
        self.insert(format!("{}/{}", USERDATA_DIR, file_name), content);
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    /// Convert the manifests into upstream files, keeping their order
    pub fn into_files(self) -> Vec<UpstreamFile> {
        self.manifests
            .into_iter()
            .map(|(path, content)| UpstreamFile { path, content })
            .collect()
    }
}

/// Whether a release path lives in the reserved userdata directory
pub fn is_userdata_path(path: &str) -> bool {
    let (segments, _) = split_path(path);
    segments.first() == Some(&USERDATA_DIR)
}
