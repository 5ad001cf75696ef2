//! Distribution service client
//!
//! Talks to the release endpoint named by a license:
//! `{scheme}://{host[:port]}/release/{app}[/{channel}]`. A cheap `HEAD`
//! checks that the license is accepted before the archive is downloaded
//! with `GET`.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap};
use shipkit_core::{CoreError, DistributionRef, License, Release};
use tracing::debug;
use url::Url;

use crate::archive::read_release_archive;
use crate::error::{RepoError, Result};

/// Response header carrying the release sequence
pub const SEQUENCE_HEADER: &str = "X-Replicated-Sequence";

/// Response header carrying the human readable version
pub const VERSION_LABEL_HEADER: &str = "X-Replicated-VersionLabel";

/// Basic authorization value for a license: `base64(id:id)`
pub fn license_auth_header(license: &License) -> String {
    let id = license.license_id();
    format!("Basic {}", STANDARD.encode(format!("{}:{}", id, id)))
}

/// Release endpoint for `dist` on the service named by `license`
pub fn release_url(dist: &DistributionRef, license: &License) -> Result<String> {
    let endpoint = Url::parse(license.endpoint()).map_err(|e| CoreError::InvalidLicense {
        message: format!("invalid endpoint '{}': {}", license.endpoint(), e),
    })?;

    let host = endpoint.host_str().ok_or_else(|| CoreError::InvalidLicense {
        message: format!("endpoint '{}' has no host", license.endpoint()),
    })?;
    let authority = match endpoint.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    Ok(format!(
        "{}://{}/release/{}",
        endpoint.scheme(),
        authority,
        dist.release_path()
    ))
}

/// HTTP client for the release endpoint
pub struct ReleaseClient {
    client: reqwest::Client,
}

impl ReleaseClient {
    /// Create a client with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RepoError::NetworkError {
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }

    /// Check that the service accepts `license` for `dist`
    pub async fn probe(&self, dist: &DistributionRef, license: &License) -> Result<()> {
        let url = release_url(dist, license)?;
        debug!(%url, "probing release endpoint");

        let response = self
            .client
            .head(&url)
            .header(AUTHORIZATION, license_auth_header(license))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(RepoError::AccessDenied { url });
        }
        if status.as_u16() >= 400 {
            return Err(RepoError::UpstreamUnavailable {
                status: status.as_u16(),
                url,
            });
        }

        Ok(())
    }

    /// Download and decode the release archive
    pub async fn download(&self, dist: &DistributionRef, license: &License) -> Result<Release> {
        let url = release_url(dist, license)?;
        debug!(%url, "downloading release");

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, license_auth_header(license))
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(RepoError::UpstreamUnavailable {
                status: status.as_u16(),
                url,
            });
        }

        let mut release = Release::new(
            header_value(response.headers(), SEQUENCE_HEADER),
            header_value(response.headers(), VERSION_LABEL_HEADER),
        );

        let body = response.bytes().await?;
        let (release, count) = tokio::task::spawn_blocking(move || {
            read_release_archive(body.as_ref(), &mut release).map(|count| (release, count))
        })
        .await
        .map_err(|e| RepoError::Io(std::io::Error::other(e)))??;
        debug!(
            files = count,
            update_cursor = %release.update_cursor,
            version_label = %release.version_label,
            "decoded release archive"
        );

        Ok(release)
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
