//! Materialized upstream handed to the overlay stages

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_files;
use crate::release::Release;

/// A file of the materialized upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFile {
    /// Slash separated, relative path
    pub path: String,
    pub content: Vec<u8>,
}

/// Where an upstream came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamType {
    /// Licensed distribution service (or a local copy of one of its releases)
    #[default]
    Replicated,
}

impl UpstreamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replicated => "replicated",
        }
    }
}

impl fmt::Display for UpstreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The as-authored application manifests, ready for overlay generation
#[derive(Debug, Clone, PartialEq)]
pub struct Upstream {
    /// URI the upstream was requested with
    pub uri: String,

    /// Application name, never empty
    pub name: String,

    /// Normalized files; userdata files come last
    pub files: Vec<UpstreamFile>,

    pub upstream_type: UpstreamType,

    pub update_cursor: String,

    pub version_label: String,
}

impl Upstream {
    /// Materialize a release: normalize its layout and attach its identity
    pub fn from_release(
        uri: impl Into<String>,
        name: impl Into<String>,
        upstream_type: UpstreamType,
        release: Release,
    ) -> Self {
        let update_cursor = release.update_cursor.clone();
        let version_label = release.version_label.clone();

        Self {
            uri: uri.into(),
            name: name.into(),
            files: normalize_files(release.into_files()),
            upstream_type,
            update_cursor,
            version_label,
        }
    }

    /// Find a file by its normalized path
    pub fn file(&self, path: &str) -> Option<&UpstreamFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_release() {
        let mut release = Release::new("42", "1.2.0");
        release.insert("app/web.yaml", b"kind: Deployment".to_vec());
        release.insert("app/db.yaml", b"kind: StatefulSet".to_vec());
        release.insert_userdata("config.yaml", b"kind: ConfigValues".to_vec());

        let upstream = Upstream::from_release("replicated://myapp", "myapp", UpstreamType::Replicated, release);

        assert_eq!(upstream.name, "myapp");
        assert_eq!(upstream.update_cursor, "42");
        assert_eq!(upstream.version_label, "1.2.0");
        assert_eq!(upstream.upstream_type.to_string(), "replicated");

        let paths: Vec<_> = upstream.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["web.yaml", "db.yaml", "userdata/config.yaml"]);
        assert!(upstream.file("userdata/config.yaml").is_some());
    }
}
