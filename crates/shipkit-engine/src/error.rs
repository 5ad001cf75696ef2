//! Engine error types

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::functions::STATIC_FUNCTIONS;

/// Main engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Template error")]
    Template(#[from] TemplateError),

    #[error("Failed to render config item '{item}'")]
    ConfigItem {
        item: String,
        #[source]
        source: TemplateError,
    },
}

impl EngineError {
    /// The template error behind this error
    pub fn template_error(&self) -> &TemplateError {
        match self {
            Self::Template(e) | Self::ConfigItem { source: e, .. } => e,
        }
    }
}

/// Error kind for categorizing template errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TemplateErrorKind {
    UndefinedVariable,
    UnknownFilter,
    UnknownFunction,
    SyntaxError,
    TypeError,
    InvalidOperation,
    Other,
}

/// Template-specific error with source information
#[derive(Error, Debug, Diagnostic, Clone)]
#[error("{message}")]
#[diagnostic(code(shipkit::template::render))]
pub struct TemplateError {
    /// Error message
    pub message: String,

    /// Error kind for categorization
    pub kind: TemplateErrorKind,

    /// Template source code
    #[source_code]
    pub src: NamedSource<String>,

    /// Error location in source
    #[label("error occurred here")]
    pub span: Option<SourceSpan>,

    /// Suggestion for fixing the error
    #[help]
    pub suggestion: Option<String>,
}

impl TemplateError {
    /// Create a new template error from a MiniJinja error
    pub fn from_minijinja(err: minijinja::Error, template_name: &str, template_source: &str) -> Self {
        let kind = categorize(&err);
        let message = err
            .to_string()
            .replace("invalid operation: ", "")
            .replace("syntax error: ", "")
            .replace("undefined value", "undefined variable");

        let span = err
            .line()
            .and_then(|line_num| calculate_span(template_source, line_num));

        Self {
            message,
            kind,
            src: NamedSource::new(template_name, template_source.to_string()),
            span,
            suggestion: suggestion_for(kind),
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> TemplateErrorKind {
        self.kind
    }
}

fn categorize(err: &minijinja::Error) -> TemplateErrorKind {
    match err.kind() {
        minijinja::ErrorKind::UndefinedError => TemplateErrorKind::UndefinedVariable,
        minijinja::ErrorKind::UnknownFilter => TemplateErrorKind::UnknownFilter,
        minijinja::ErrorKind::UnknownFunction => TemplateErrorKind::UnknownFunction,
        minijinja::ErrorKind::SyntaxError => TemplateErrorKind::SyntaxError,
        minijinja::ErrorKind::InvalidOperation => TemplateErrorKind::InvalidOperation,
        minijinja::ErrorKind::NonPrimitive | minijinja::ErrorKind::NonKey => {
            TemplateErrorKind::TypeError
        }
        _ => TemplateErrorKind::Other,
    }
}

fn suggestion_for(kind: TemplateErrorKind) -> Option<String> {
    match kind {
        TemplateErrorKind::UnknownFunction => Some(format!(
            "Config defaults can only call static helpers: {}",
            STATIC_FUNCTIONS.join(", ")
        )),
        TemplateErrorKind::UndefinedVariable => Some(
            "Config defaults are rendered without variables; call a helper such as `{{ Now() }}` instead"
                .to_string(),
        ),
        TemplateErrorKind::SyntaxError => {
            Some("Check for unclosed `{{`, `{%` or mismatched quotes".to_string())
        }
        _ => None,
    }
}

/// Calculate the source span for a given line number
fn calculate_span(source: &str, line_num: usize) -> Option<SourceSpan> {
    let mut offset = 0;

    for (idx, line) in source.lines().enumerate() {
        if idx + 1 == line_num {
            return Some(SourceSpan::new(offset.into(), line.len()));
        }
        offset += line.len() + 1;
    }

    None
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
