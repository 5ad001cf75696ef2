//! License template context
//!
//! Functions that expose the customer license to templates. Both return an
//! empty string when no license is present, so a template referencing them
//! still renders.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use minijinja::Environment;
use serde_json::json;
use shipkit_core::License;

/// Registries the license grants pull access to
pub const LICENSED_REGISTRIES: &[&str] = &["proxy.replicated.com", "registry.replicated.com"];

/// Names of the license functions, as registered in templates
pub const LICENSE_FUNCTIONS: &[&str] = &["LicenseFieldValue", "LicenseDockerCfg"];

/// Register `LicenseFieldValue` and `LicenseDockerCfg` on an environment
pub fn register(env: &mut Environment<'static>, license: Option<Arc<License>>) {
    let field_license = license.clone();
    env.add_function("LicenseFieldValue", move |name: String| -> String {
        field_license
            .as_deref()
            .map(|license| license_field_value(license, &name))
            .unwrap_or_default()
    });

    env.add_function("LicenseDockerCfg", move || -> String {
        license.as_deref().map(license_docker_cfg).unwrap_or_default()
    });
}

/// String form of an entitlement value, `""` when the field is absent
pub fn license_field_value(license: &License, name: &str) -> String {
    license
        .spec
        .entitlements
        .get(name)
        .map(|field| field.value_string())
        .unwrap_or_default()
}

/// Base64 encoded docker config with credentials for the licensed registries
pub fn license_docker_cfg(license: &License) -> String {
    let id = license.license_id();
    let auth = STANDARD.encode(format!("{}:{}", id, id));

    let auths: serde_json::Map<String, serde_json::Value> = LICENSED_REGISTRIES
        .iter()
        .map(|host| (host.to_string(), json!({ "auth": auth })))
        .collect();
    let dockercfg = json!({ "auths": auths });

    STANDARD.encode(dockercfg.to_string())
}
