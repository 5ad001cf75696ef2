//! CLI error types with exit code handling
//!
//! Library errors are mapped onto a small set of user facing categories,
//! each with its own exit code.

use std::error::Error as StdError;

use miette::Diagnostic;
use shipkit_core::CoreError;
use shipkit_repo::RepoError;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Malformed URI, license, configuration or arguments
    #[error("Invalid input: {message}")]
    #[diagnostic(code(shipkit::cli::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The distribution service rejected the license
    #[error("Access denied: {message}")]
    #[diagnostic(
        code(shipkit::cli::access),
        help("check that the license is current and grants access to this channel")
    )]
    AccessDenied { message: String },

    /// Config defaults failed to render
    #[error("Template error: {message}")]
    #[diagnostic(code(shipkit::cli::template))]
    Template { message: String },

    /// The distribution service or a registry failed
    #[error("Upstream error: {message}")]
    #[diagnostic(code(shipkit::cli::upstream))]
    Upstream { message: String },

    /// A deadline expired
    #[error("Timed out: {message}")]
    #[diagnostic(code(shipkit::cli::timeout))]
    Timeout { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(shipkit::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(shipkit::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Input { .. } => exit_codes::INPUT_ERROR,
            CliError::AccessDenied { .. } => exit_codes::ACCESS_DENIED,
            CliError::Template { .. } => exit_codes::TEMPLATE_ERROR,
            CliError::Upstream { .. } => exit_codes::UPSTREAM_ERROR,
            CliError::Timeout { .. } => exit_codes::TIMEOUT,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create an input error (user provided invalid input)
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: None,
        }
    }

    /// Create an input error with help text
    pub fn input_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Render an error and all of its sources as one line
pub fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

impl From<RepoError> for CliError {
    fn from(err: RepoError) -> Self {
        let message = error_chain(&err);
        match err.root() {
            RepoError::Core(CoreError::Io(_)) | RepoError::Io(_) => CliError::Io { message },
            RepoError::Core(_) | RepoError::InvalidConfig { .. } => CliError::input(message),
            RepoError::MissingCredential { .. } => {
                CliError::input_with_help(message, "pass a license file with --license")
            }
            RepoError::AccessDenied { .. } => CliError::AccessDenied { message },
            RepoError::Template(_) => CliError::Template { message },
            RepoError::Cancelled { .. } | RepoError::Timeout { .. } => CliError::Timeout { message },
            RepoError::UpstreamUnavailable { .. }
            | RepoError::ArchiveCorrupt { .. }
            | RepoError::Probe { .. }
            | RepoError::NetworkError { .. } => CliError::Upstream { message },
            RepoError::Stage { .. } | RepoError::Serialization(_) => CliError::Internal { message },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        CliError::from(RepoError::from(err))
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
