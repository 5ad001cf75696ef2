//! Template engine based on MiniJinja

use std::sync::Arc;

use minijinja::Environment;
use shipkit_core::License;

use crate::error::{EngineError, Result, TemplateError};
use crate::functions;
use crate::license;

/// Template engine builder
pub struct EngineBuilder {
    strict_mode: bool,
    license_context: bool,
    license: Option<Arc<License>>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            strict_mode: true,
            license_context: false,
            license: None,
        }
    }

    /// Set strict mode (fail on undefined variables)
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Expose the license functions, backed by `license` when present
    pub fn with_license(mut self, license: Option<License>) -> Self {
        self.license_context = true;
        self.license = license.map(Arc::new);
        self
    }

    /// Build the engine
    pub fn build(self) -> Engine {
        let mut env = Environment::new();

        if self.strict_mode {
            env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);
        } else {
            env.set_undefined_behavior(minijinja::UndefinedBehavior::Lenient);
        }

        functions::register(&mut env);
        if self.license_context {
            license::register(&mut env, self.license);
        }

        Engine {
            env,
            license_context: self.license_context,
        }
    }
}

/// The template engine
///
/// The environment is configured once; rendering never mutates it, so an
/// engine can be shared across threads.
pub struct Engine {
    env: Environment<'static>,
    license_context: bool,
}

impl Default for Engine {
    fn default() -> Self {
        Self::static_only()
    }
}

impl Engine {
    /// Create a builder
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Strict engine with the static helpers and nothing else
    pub fn static_only() -> Self {
        EngineBuilder::new().build()
    }

    /// Render a single template string without variables
    pub fn render_string(&self, template: &str, template_name: &str) -> Result<String> {
        self.env
            .render_named_str(template_name, template, minijinja::context! {})
            .map_err(|e| EngineError::Template(TemplateError::from_minijinja(e, template_name, template)))
    }

    /// Whether a function of that name is callable from templates
    pub fn has_function(&self, name: &str) -> bool {
        functions::STATIC_FUNCTIONS.contains(&name)
            || (self.license_context && license::LICENSE_FUNCTIONS.contains(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateErrorKind;

    #[test]
    fn test_render_plain_text() {
        let engine = Engine::static_only();
        assert_eq!(engine.render_string("foo", "item").unwrap(), "foo");
        assert_eq!(engine.render_string("", "item").unwrap(), "");
    }

    #[test]
    fn test_render_static_helpers() {
        let engine = Engine::static_only();
        assert_eq!(
            engine.render_string(r#"{{ ToUpper("abc") }}-{{ Add(2, 3) }}"#, "item").unwrap(),
            "ABC-5"
        );
        assert_eq!(
            engine.render_string(r#"{{ RandomString(12) | length }}"#, "item").unwrap(),
            "12"
        );
    }

    #[test]
    fn test_strict_undefined() {
        let engine = Engine::static_only();
        let err = engine.render_string("{{ hostname }}", "item").unwrap_err();
        let template_err = err.template_error();
        assert_eq!(template_err.kind(), TemplateErrorKind::UndefinedVariable);
    }

    #[test]
    fn test_lenient_undefined() {
        let engine = Engine::builder().strict(false).build();
        assert_eq!(engine.render_string("a{{ hostname }}b", "item").unwrap(), "ab");
    }

    #[test]
    fn test_license_functions_not_static() {
        let engine = Engine::static_only();
        assert!(engine.has_function("Now"));
        assert!(!engine.has_function("LicenseFieldValue"));
        assert!(engine.render_string(r#"{{ LicenseFieldValue("seats") }}"#, "item").is_err());
    }

    #[test]
    fn test_license_functions_without_license() {
        let engine = Engine::builder().with_license(None).build();
        assert!(engine.has_function("LicenseDockerCfg"));
        assert_eq!(
            engine.render_string(r#"[{{ LicenseFieldValue("seats") }}{{ LicenseDockerCfg() }}]"#, "item").unwrap(),
            "[]"
        );
    }

    #[test]
    fn test_syntax_error_has_span() {
        let engine = Engine::static_only();
        let err = engine.render_string("ok\n{{ Now( }}", "broken").unwrap_err();
        let template_err = err.template_error();
        assert_eq!(template_err.kind(), TemplateErrorKind::SyntaxError);
        assert!(template_err.span.is_some());
    }
}
