//! Config defaulter
//!
//! Renders the default of every config item into a `ConfigValues` document.
//! Only the static helpers are available: defaults are computed before any
//! user input or license data exists.

use std::collections::BTreeMap;

use shipkit_core::{Config, ConfigValues};
use tracing::debug;

use crate::engine::Engine;
use crate::error::{EngineError, Result};

/// Render the defaults of `config` with `engine`
///
/// Items with no default template are left out. The first failing item
/// aborts the whole document.
pub fn create_config_values(app_name: &str, config: &Config, engine: &Engine) -> Result<ConfigValues> {
    let mut values = BTreeMap::new();

    for group in &config.spec.groups {
        for item in &group.items {
            let Some(template) = item.default_template() else {
                continue;
            };

            let name = format!("{}/{}", group.name, item.name);
            let rendered = engine.render_string(template, &name).map_err(|e| match e {
                EngineError::Template(source) => EngineError::ConfigItem {
                    item: item.name.clone(),
                    source,
                },
                other => other,
            })?;

            values.insert(item.name.clone(), rendered);
        }
    }

    debug!(app = %app_name, items = values.len(), "rendered config defaults");
    Ok(ConfigValues::new(app_name, values))
}

/// Render the defaults of `config` with a static-only engine
pub fn default_config_values(app_name: &str, config: &Config) -> Result<ConfigValues> {
    create_config_values(app_name, config, &Engine::static_only())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateErrorKind;

    fn config(yaml: &str) -> Config {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_plain_value() {
        let config = config(
            r#"apiVersion: kots.io/v1beta1
kind: Config
metadata:
  name: config
spec:
  groups:
    - name: g
      items:
        - name: item
          value: foo
"#,
        );

        let values = default_config_values("myapp", &config).unwrap();
        assert_eq!(values.metadata.name, "myapp");
        assert_eq!(values.values().get("item").map(String::as_str), Some("foo"));
        assert_eq!(values.values().len(), 1);
    }

    #[test]
    fn test_items_without_template_are_skipped() {
        let config = config(
            r#"apiVersion: kots.io/v1beta1
kind: Config
metadata:
  name: config
spec:
  groups:
    - name: g
      items:
        - name: label
          type: label
        - name: port
          default: 8080
"#,
        );

        let values = default_config_values("myapp", &config).unwrap();
        assert!(!values.values().contains_key("label"));
        assert_eq!(values.values()["port"], "8080");
    }

    #[test]
    fn test_value_wins_over_default() {
        let config = config(
            r#"apiVersion: kots.io/v1beta1
kind: Config
metadata:
  name: config
spec:
  groups:
    - name: g
      items:
        - name: both
          default: from-default
          value: from-value
        - name: only_default
          default: from-default
        - name: empty_value
          default: fallback
          value: ""
"#,
        );

        let values = default_config_values("myapp", &config).unwrap();
        assert_eq!(values.values()["both"], "from-value");
        assert_eq!(values.values()["only_default"], "from-default");
        assert_eq!(values.values()["empty_value"], "fallback");
    }

    #[test]
    fn test_failure_aborts() {
        let config = config(
            r#"apiVersion: kots.io/v1beta1
kind: Config
metadata:
  name: config
spec:
  groups:
    - name: g
      items:
        - name: ok
          value: fine
        - name: seats
          value: '{{ LicenseFieldValue("seats") }}'
"#,
        );

        let err = default_config_values("myapp", &config).unwrap_err();
        match &err {
            EngineError::ConfigItem { item, source } => {
                assert_eq!(item, "seats");
                assert_eq!(source.kind(), TemplateErrorKind::UnknownFunction);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_snapshot_config_values() {
        let config = config(
            r#"apiVersion: kots.io/v1beta1
kind: Config
metadata:
  name: config
spec:
  groups:
    - name: database
      title: Database
      items:
        - name: db_host
          value: '{{ ToLower("POSTGRES.internal") }}'
        - name: db_port
          default: '{{ Add(5000, 432) }}'
        - name: db_user
          value: '{{ TrimSpace("  admin ") }}'
    - name: storage
      items:
        - name: volume_size
          value: '{{ HumanSize(10000000000) }}'
        - name: bucket
          value: '{{ Split("s3://bucket/path", "/")[2] }}'
"#,
        );

        let values = default_config_values("sentry", &config).unwrap();
        insta::assert_yaml_snapshot!(values);
    }
}
