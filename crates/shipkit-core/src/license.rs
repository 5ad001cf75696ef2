//! Application license
//!
//! The license is an external credential. Only the identifier and endpoint are
//! interpreted here; everything else is carried through untouched so the
//! document written to `userdata/license.yaml` matches what was supplied.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CoreError, Result};
use crate::kinds::{GroupVersionKind, ObjectMeta};

/// Registry serving private images for production endpoints
pub const DEFAULT_REGISTRY: &str = "registry.replicated.com";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    pub spec: LicenseSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseSpec {
    #[serde(rename = "licenseID")]
    pub license_id: String,

    #[serde(default)]
    pub app_slug: String,

    #[serde(default)]
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub entitlements: BTreeMap<String, EntitlementField>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// A single license entitlement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementField {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default)]
    pub value: serde_yaml::Value,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value_type: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl EntitlementField {
    /// String form of the entitlement value (`""` when unset)
    pub fn value_string(&self) -> String {
        match &self.value {
            serde_yaml::Value::Null => String::new(),
            serde_yaml::Value::String(s) => s.clone(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            serde_yaml::Value::Number(n) => n.to_string(),
            other => serde_yaml::to_string(other)
                .map(|s| s.trim_end().to_string())
                .unwrap_or_default(),
        }
    }
}

impl License {
    /// Decode a license document, rejecting any other kind
    pub fn from_yaml(content: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        let api_version = value
            .get("apiVersion")
            .and_then(serde_yaml::Value::as_str)
            .unwrap_or_default();
        let kind = value
            .get("kind")
            .and_then(serde_yaml::Value::as_str)
            .unwrap_or_default();

        if GroupVersionKind::from_api_version(api_version, kind) != GroupVersionKind::kots("License") {
            return Err(CoreError::InvalidLicense {
                message: "not an application license".to_string(),
            });
        }

        let license: License = serde_yaml::from_value(value)?;
        if license.spec.license_id.is_empty() {
            return Err(CoreError::InvalidLicense {
                message: "license has no licenseID".to_string(),
            });
        }
        Ok(license)
    }

    /// Read and decode a license file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn license_id(&self) -> &str {
        &self.spec.license_id
    }

    pub fn endpoint(&self) -> &str {
        &self.spec.endpoint
    }

    /// Private registry host matching the license endpoint
    pub fn registry_endpoint(&self) -> &'static str {
        let Ok(url) = Url::parse(&self.spec.endpoint) else {
            return DEFAULT_REGISTRY;
        };

        match url.host_str() {
            Some("staging.replicated.app") => "registry.staging.replicated.com",
            Some("localhost") => "localhost:1234",
            _ => DEFAULT_REGISTRY,
        }
    }
}
