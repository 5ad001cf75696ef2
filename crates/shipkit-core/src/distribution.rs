//! Distribution URI resolution
//!
//! A distribution URI names an application release on the distribution
//! service. Two shapes are accepted:
//!
//! - `replicated://myapp/unstable` - app slug `myapp`, channel `unstable`
//! - `replicated://myapp@1.2.0` - app slug `myapp`, version label `1.2.0`

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CoreError, Result};

/// URI scheme served by the distribution service
pub const DISTRIBUTION_SCHEME: &str = "replicated";

/// Reference to an application release, derived once from a distribution URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionRef {
    /// Application slug on the distribution service
    pub app_slug: String,

    /// Release channel, taken from the URI path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    /// Version label, taken from the URI host when a user part names the app
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_label: Option<String>,

    /// Release sequence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,
}

impl DistributionRef {
    /// Parse a distribution URI
    ///
    /// The scheme is not checked here; callers decide which schemes they serve.
    pub fn parse(uri: &str) -> Result<Self> {
        let url = Url::parse(uri).map_err(|e| CoreError::InvalidUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_url(&url)
    }

    /// Build a reference from an already parsed URL
    pub fn from_url(url: &Url) -> Result<Self> {
        let hostname = url.host_str().unwrap_or_default();

        if !url.username().is_empty() {
            return Ok(Self {
                app_slug: url.username().to_string(),
                channel: None,
                version_label: Some(hostname.to_string()).filter(|h| !h.is_empty()),
                sequence: None,
            });
        }

        if hostname.is_empty() {
            return Err(CoreError::InvalidUri {
                uri: url.to_string(),
                reason: "missing application slug".to_string(),
            });
        }

        let channel = url.path().trim_start_matches('/');

        Ok(Self {
            app_slug: hostname.to_string(),
            channel: (!channel.is_empty()).then(|| channel.to_string()),
            version_label: None,
            sequence: None,
        })
    }

    /// Path of this release relative to a service root: `{app}[/{channel}]`
    pub fn release_path(&self) -> String {
        match &self.channel {
            Some(channel) => format!("{}/{}", self.app_slug, channel),
            None => self.app_slug.clone(),
        }
    }
}

/// Check whether a URI uses the distribution scheme
pub fn is_distribution_uri(url: &Url) -> bool {
    url.scheme() == DISTRIBUTION_SCHEME
}
