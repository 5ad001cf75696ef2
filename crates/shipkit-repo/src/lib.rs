//! Shipkit Repo - release retrieval
//!
//! This crate fetches upstream releases and inspects their images:
//!
//! - **Release endpoint**: license checked `HEAD` probe, then a gzipped tar download
//! - **Local releases**: unpacked directories read instead of the service
//! - **Metadata**: per application descriptor lookup with host fallback
//! - **Image privacy**: anonymous registry probes with bounded concurrency
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use shipkit_core::License;
//! use shipkit_repo::{FetchOptions, ReleaseClient, UpstreamFetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let license = License::load("license.yaml".as_ref())?;
//! let options = FetchOptions {
//!     license: Some(license),
//!     ..Default::default()
//! };
//!
//! let client = ReleaseClient::new(Duration::from_secs(30))?;
//! let upstream = UpstreamFetcher::new(client)
//!     .fetch_upstream("replicated://myapp/stable", &options)
//!     .await?;
//! println!("{} files at cursor {}", upstream.files.len(), upstream.update_cursor);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod images;
pub mod metadata;
pub mod probe;

// Re-exports for convenience
pub use archive::{read_release_archive, write_release_archive};
pub use client::{ReleaseClient, license_auth_header, release_url};
pub use config::{MetadataHosts, ShipkitConfig};
pub use error::{RepoError, Result};
pub use fetch::{FetchOptions, FetchStage, UpstreamFetcher, can_pull_upstream};
pub use images::{ImageClassification, ImagePrivacy, ImagePrivacyProber, ImageRegistry, OciImageRegistry};
pub use metadata::{DEFAULT_METADATA, MetadataClient};
pub use probe::ProbeError;
