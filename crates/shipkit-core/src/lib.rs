//! Shipkit Core - types shared by the release retrieval pipeline
//!
//! This crate provides the foundational pieces used throughout Shipkit:
//! - `DistributionRef`: Parsed distribution URI (app, channel, version)
//! - `Release`: Raw manifests of one upstream version
//! - `classify`: Content based discovery of the application and config kinds
//! - `normalize`: Common prefix stripping with the reserved userdata directory
//! - `Upstream`: The materialized result handed to later stages

pub mod classify;
pub mod distribution;
pub mod error;
pub mod kinds;
pub mod license;
pub mod local;
pub mod normalize;
pub mod release;
pub mod upstream;

pub use classify::{Classification, DecoderRegistry, KnownDocument, classify};
pub use distribution::{DISTRIBUTION_SCHEME, DistributionRef, is_distribution_uri};
pub use error::{CoreError, Result};
pub use kinds::{
    Application, Config, ConfigGroup, ConfigItem, ConfigValues, GroupVersionKind, ObjectMeta,
    PLACEHOLDER_APP_NAME, PLACEHOLDER_APP_TITLE,
};
pub use license::{EntitlementField, License};
pub use local::read_local_release;
pub use normalize::normalize_files;
pub use release::{OFFLINE_UPDATE_CURSOR, Release, USERDATA_DIR};
pub use upstream::{Upstream, UpstreamFile, UpstreamType};
