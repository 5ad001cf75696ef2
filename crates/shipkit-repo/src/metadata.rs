//! Application metadata lookup
//!
//! Metadata is served per application (and channel) by the distribution
//! service. A 404 only means "no metadata here": the fallback host is tried
//! next, then a built-in descriptor is used.

use std::time::Duration;

use shipkit_core::{DistributionRef, is_distribution_uri};
use tracing::{debug, warn};
use url::Url;

use crate::config::{DEFAULT_HTTP_TIMEOUT_SECS, MetadataHosts};
use crate::error::{RepoError, Result};

/// Descriptor returned when no host has metadata for the application
pub const DEFAULT_METADATA: &str = r#"apiVersion: kots.io/v1beta1
kind: Application
metadata:
  name: "Application"
spec:
  title: "Application"
  icon: https://cdn1.iconfinder.com/data/icons/ninja-things-1/1772/ninja-simple-512.png
"#;

/// Client for the metadata endpoints
pub struct MetadataClient {
    client: reqwest::Client,
    hosts: MetadataHosts,
}

impl MetadataClient {
    pub fn new(hosts: MetadataHosts, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RepoError::NetworkError {
                message: e.to_string(),
            })?;

        Ok(Self { client, hosts })
    }

    /// Client for the default hosts
    pub fn with_defaults() -> Result<Self> {
        Self::new(
            MetadataHosts::default(),
            Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        )
    }

    /// Metadata document for an upstream URI
    ///
    /// `None` for schemes without metadata. For the distribution scheme the
    /// first successful body wins; with none, the built-in descriptor is
    /// returned.
    pub async fn application_metadata(&self, uri: &str) -> Result<Option<Vec<u8>>> {
        let url = Url::parse(uri).map_err(|e| shipkit_core::CoreError::InvalidUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        if !is_distribution_uri(&url) {
            return Ok(None);
        }

        let dist = DistributionRef::from_url(&url)?;
        if let Some(body) = self.fetch_from_host(&self.hosts.primary, &dist).await? {
            return Ok(Some(body));
        }
        warn!(
            host = %self.hosts.primary,
            app = %dist.app_slug,
            "no metadata on primary host, trying fallback"
        );
        if let Some(body) = self.fetch_from_host(&self.hosts.fallback, &dist).await? {
            return Ok(Some(body));
        }

        debug!(app = %dist.app_slug, "no metadata published, using default");
        Ok(Some(DEFAULT_METADATA.as_bytes().to_vec()))
    }

    async fn fetch_from_host(&self, host: &str, dist: &DistributionRef) -> Result<Option<Vec<u8>>> {
        let url = format!(
            "{}/metadata/{}",
            host.trim_end_matches('/'),
            dist.release_path()
        );
        debug!(%url, "fetching application metadata");

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status.as_u16() >= 400 {
            return Err(RepoError::UpstreamUnavailable {
                status: status.as_u16(),
                url,
            });
        }

        Ok(Some(response.bytes().await?.to_vec()))
    }
}
