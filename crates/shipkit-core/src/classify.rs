//! Manifest classification
//!
//! Release files are not named in any particular way, so the application
//! descriptor and the configuration schema are found by content: every
//! manifest is decoded as a generic document, its `(group, version, kind)` is
//! matched against an ordered list of known kinds, and the first match wins.
//! Anything that does not decode, or decodes to an unknown kind, is ordinary
//! deployment material and is skipped.

use serde::Deserialize;
use tracing::debug;

use crate::kinds::{Application, Config, GroupVersionKind};
use crate::release::Release;

/// A manifest decoded into one of the known kinds
#[derive(Debug, Clone, PartialEq)]
pub enum KnownDocument {
    Application(Application),
    Config(Config),
}

type DecodeFn = fn(serde_yaml::Value) -> Result<KnownDocument, serde_yaml::Error>;

/// A (group, version, kind) matcher and the decoder for its documents
struct KindMatcher {
    gvk: GroupVersionKind,
    decode: DecodeFn,
}

/// Ordered set of document kinds the classifier recognizes
///
/// Built once per run and handed to the classifier; there is no global
/// registration.
pub struct DecoderRegistry {
    matchers: Vec<KindMatcher>,
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::kots()
    }
}

impl DecoderRegistry {
    /// A registry that recognizes nothing
    pub fn empty() -> Self {
        Self {
            matchers: Vec::new(),
        }
    }

    /// Registry for the application descriptor and the configuration schema
    pub fn kots() -> Self {
        Self::empty()
            .register(GroupVersionKind::kots("Application"), |v| {
                serde_yaml::from_value(v).map(KnownDocument::Application)
            })
            .register(GroupVersionKind::kots("Config"), |v| {
                serde_yaml::from_value(v).map(KnownDocument::Config)
            })
    }

    /// Append a matcher; earlier matchers take precedence
    pub fn register(mut self, gvk: GroupVersionKind, decode: DecodeFn) -> Self {
        self.matchers.push(KindMatcher { gvk, decode });
        self
    }

    pub fn kinds(&self) -> impl Iterator<Item = &GroupVersionKind> {
        self.matchers.iter().map(|m| &m.gvk)
    }

    /// Decode raw manifest bytes into a known document
    ///
    /// Only the first document of a multi-document stream is looked at.
    /// Returns `None` when that document has no `apiVersion` and `kind`, for
    /// unknown kinds, and for known kinds whose body does not fit the typed
    /// model.
    pub fn decode(&self, content: &[u8]) -> Option<KnownDocument> {
        let first = serde_yaml::Deserializer::from_slice(content).next()?;
        let value = serde_yaml::Value::deserialize(first).ok()?;
        let api_version = value.get("apiVersion")?.as_str()?;
        let kind = value.get("kind")?.as_str()?;
        let gvk = GroupVersionKind::from_api_version(api_version, kind);

        let matcher = self.matchers.iter().find(|m| m.gvk == gvk)?;
        match (matcher.decode)(value) {
            Ok(document) => Some(document),
            Err(e) => {
                debug!(%gvk, error = %e, "skipping malformed document");
                None
            }
        }
    }
}

/// What the classifier found in a release
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// The application descriptor, or the placeholder when none was shipped
    pub application: Application,

    /// Whether `application` came from the release
    pub application_found: bool,

    /// The configuration schema, if shipped
    pub config: Option<Config>,
}

/// Find the application descriptor and configuration schema of a release
///
/// When several candidates of a kind exist, the first one in manifest order
/// is returned; the others are ignored.
pub fn classify(release: &Release, registry: &DecoderRegistry) -> Classification {
    let mut application = None;
    let mut config = None;

    for (path, content) in &release.manifests {
        match registry.decode(content) {
            Some(KnownDocument::Application(app)) => {
                if application.is_none() {
                    debug!(%path, name = %app.metadata.name, "found application descriptor");
                    application = Some(app);
                } else {
                    debug!(%path, "ignoring additional application descriptor");
                }
            }
            Some(KnownDocument::Config(cfg)) => {
                if config.is_none() {
                    debug!(%path, "found configuration schema");
                    config = Some(cfg);
                } else {
                    debug!(%path, "ignoring additional configuration schema");
                }
            }
            None => {}
        }
    }

    let application_found = application.is_some();
    Classification {
        application: application.unwrap_or_else(Application::placeholder),
        application_found,
        config,
    }
}
