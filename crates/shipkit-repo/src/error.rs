//! Error types for release retrieval

use shipkit_core::CoreError;
use shipkit_engine::EngineError;
use thiserror::Error;

use crate::fetch::FetchStage;
use crate::probe::ProbeError;

/// Release retrieval errors
#[derive(Debug, Error)]
pub enum RepoError {
    // ============ Input Errors ============
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("A license is required to fetch {uri}")]
    MissingCredential { uri: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // ============ Distribution Errors ============
    #[error("Access denied by {url}: the license does not grant access to this release")]
    AccessDenied { url: String },

    #[error("Upstream unavailable: {url} returned HTTP {status}")]
    UpstreamUnavailable { status: u16, url: String },

    #[error("Release archive is corrupt: {message}")]
    ArchiveCorrupt { message: String },

    #[error("Failed to render config defaults")]
    Template(#[from] EngineError),

    // ============ Image Errors ============
    #[error("Failed to probe image {image}")]
    Probe {
        image: String,
        #[source]
        source: ProbeError,
    },

    // ============ Pipeline Errors ============
    #[error("Fetch failed while {stage}")]
    Stage {
        stage: FetchStage,
        #[source]
        source: Box<RepoError>,
    },

    #[error("Fetch cancelled while {stage}")]
    Cancelled { stage: FetchStage },

    // ============ Network Errors ============
    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Request timeout: {message}")]
    Timeout { message: String },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RepoError {
    /// The originating error, with stage wrappers removed
    pub fn root(&self) -> &RepoError {
        match self {
            RepoError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stage the fetch failed or was cancelled in
    pub fn stage(&self) -> Option<FetchStage> {
        match self {
            RepoError::Stage { stage, .. } | RepoError::Cancelled { stage } => Some(*stage),
            _ => None,
        }
    }

    pub(crate) fn at(self, stage: FetchStage) -> Self {
        match self {
            e @ (RepoError::Stage { .. } | RepoError::Cancelled { .. }) => e,
            e => RepoError::Stage {
                stage,
                source: Box::new(e),
            },
        }
    }
}

/// Result type for retrieval operations
pub type Result<T> = std::result::Result<T, RepoError>;

impl From<reqwest::Error> for RepoError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RepoError::Timeout {
                message: e.to_string(),
            }
        } else if e.is_connect() {
            RepoError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else {
            RepoError::NetworkError {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_yaml::Error> for RepoError {
    fn from(e: serde_yaml::Error) -> Self {
        RepoError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_unwraps_stages() {
        let err = RepoError::AccessDenied {
            url: "https://replicated.app/release/app".to_string(),
        }
        .at(FetchStage::Probing);

        assert_eq!(err.stage(), Some(FetchStage::Probing));
        assert!(matches!(err.root(), RepoError::AccessDenied { .. }));

        // an already staged error keeps its original stage
        let restaged = err.at(FetchStage::Downloading);
        assert_eq!(restaged.stage(), Some(FetchStage::Probing));
    }

    #[test]
    fn test_cancelled_keeps_stage() {
        let err = RepoError::Cancelled {
            stage: FetchStage::Downloading,
        }
        .at(FetchStage::Classifying);
        assert_eq!(err.stage(), Some(FetchStage::Downloading));
        assert_eq!(err.to_string(), "Fetch cancelled while downloading");
    }

    #[tokio::test]
    async fn test_refused_connection_is_network_error() {
        let err: RepoError = reqwest::Client::new()
            .head("http://127.0.0.1:1/release/app")
            .send()
            .await
            .unwrap_err()
            .into();

        match err {
            RepoError::NetworkError { message } => assert!(message.starts_with("Connection failed")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
