//! Shipkit Engine - MiniJinja templating for config defaults
//!
//! This crate provides a MiniJinja-based template engine with:
//! - Static helper functions (`Now`, `RandomString`, `HumanSize`, ...)
//! - An optional license context (`LicenseFieldValue`, `LicenseDockerCfg`)
//! - The config defaulter producing `ConfigValues`
//! - Human-readable error messages with source spans

pub mod defaults;
pub mod engine;
pub mod error;
pub mod functions;
pub mod license;

pub use defaults::{create_config_values, default_config_values};
pub use engine::{Engine, EngineBuilder};
pub use error::{EngineError, Result, TemplateError, TemplateErrorKind};
pub use functions::STATIC_FUNCTIONS;
