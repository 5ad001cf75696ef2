//! Application kinds shipped inside a release
//!
//! Only the handful of `kots.io/v1beta1` documents this crate reads or
//! writes are modeled: `Application`, `Config`, `ConfigValues` and `License`
//! (see [`crate::license`]). Unknown fields are kept so documents survive a
//! decode/encode cycle.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// API group of the application kinds
pub const KOTS_GROUP: &str = "kots.io";

/// API version of the application kinds
pub const KOTS_VERSION: &str = "v1beta1";

/// Fixed name of the synthesized application descriptor
pub const PLACEHOLDER_APP_NAME: &str = "replicated-kots-app";

/// Fixed title of the synthesized application descriptor
pub const PLACEHOLDER_APP_TITLE: &str = "Replicated Kots App";

fn kots_api_version() -> String {
    format!("{}/{}", KOTS_GROUP, KOTS_VERSION)
}

/// (group, version, kind) identity of a structured document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Identity of an application kind
    pub fn kots(kind: &str) -> Self {
        Self::new(KOTS_GROUP, KOTS_VERSION, kind)
    }

    /// Split an `apiVersion` (`group/version` or bare `version`) and pair it with a kind
    pub fn from_api_version(api_version: &str, kind: &str) -> Self {
        match api_version.split_once('/') {
            Some((group, version)) => Self::new(group, version, kind),
            None => Self::new("", api_version, kind),
        }
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Kind={}", self.api_version(), self.kind)
    }
}

/// Object metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

// ============ Application ============

/// Application descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ApplicationSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub icon: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Application {
    /// Descriptor used when a release ships none
    pub fn placeholder() -> Self {
        Self {
            api_version: kots_api_version(),
            kind: "Application".to_string(),
            metadata: ObjectMeta::named(PLACEHOLDER_APP_NAME),
            spec: ApplicationSpec {
                title: PLACEHOLDER_APP_TITLE.to_string(),
                icon: String::new(),
                extra: BTreeMap::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

// ============ Config ============

/// Configuration schema: groups of configurable items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: ConfigSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSpec {
    #[serde(default)]
    pub groups: Vec<ConfigGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigGroup {
    pub name: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default)]
    pub items: Vec<ConfigItem>,
}

/// A single configurable item
///
/// `default` and `value` are templates. Scalars of any YAML type are
/// accepted and kept as their string form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigItem {
    pub name: String,

    #[serde(default)]
    pub title: String,

    #[serde(rename = "type", default)]
    pub item_type: String,

    #[serde(default, deserialize_with = "scalar_string")]
    pub default: String,

    #[serde(default, deserialize_with = "scalar_string")]
    pub value: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl ConfigItem {
    /// Template producing this item's default value
    ///
    /// `value` wins when set, otherwise the declared `default` is used.
    pub fn default_template(&self) -> Option<&str> {
        [self.value.as_str(), self.default.as_str()]
            .into_iter()
            .find(|t| !t.is_empty())
    }
}

fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    match value {
        serde_yaml::Value::Null => Ok(String::new()),
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar, found {:?}",
            other
        ))),
    }
}

// ============ ConfigValues ============

/// Rendered configuration values for an application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigValues {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ConfigValuesSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigValuesSpec {
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl ConfigValues {
    pub fn new(application_name: &str, values: BTreeMap<String, String>) -> Self {
        Self {
            api_version: kots_api_version(),
            kind: "ConfigValues".to_string(),
            metadata: ObjectMeta::named(application_name),
            spec: ConfigValuesSpec { values },
        }
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.spec.values
    }

    pub fn to_yaml(&self) -> crate::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
