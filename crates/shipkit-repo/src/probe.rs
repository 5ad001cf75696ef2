//! Image probe errors
//!
//! Registry failures arrive nested: an aggregate of registry error codes,
//! wrapped by transport context, wrapped again by the caller. Whether an
//! image is private is decided by walking that tree for an authorization
//! failure.

use oci_distribution::errors::{OciDistributionError, OciErrorCode};
use thiserror::Error;

/// Error code registries use for missing or rejected credentials
pub const UNAUTHORIZED_CODE: &str = "UNAUTHORIZED";

/// Failure to open a remote image
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("registry returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("{code}: {message}")]
    Registry { code: String, message: String },

    #[error("{}", join_messages(.0))]
    Multiple(Vec<ProbeError>),

    #[error("{context}")]
    Wrapped {
        context: String,
        #[source]
        source: Box<ProbeError>,
    },

    #[error("invalid image reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("registry request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Other(String),
}

fn join_messages(errors: &[ProbeError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ProbeError {
    /// Add context around this error
    pub fn wrap(self, context: impl Into<String>) -> Self {
        ProbeError::Wrapped {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether an authorization failure is the cause of this error
    ///
    /// Looks through wrappers and into every member of an aggregate.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            ProbeError::Unauthorized { .. } => true,
            ProbeError::Status { status, .. } => *status == 401,
            ProbeError::Registry { code, .. } => code == UNAUTHORIZED_CODE,
            ProbeError::Multiple(errors) => errors.iter().any(ProbeError::is_unauthorized),
            ProbeError::Wrapped { source, .. } => source.is_unauthorized(),
            _ => false,
        }
    }

    /// Innermost error, following wrappers only
    pub fn cause(&self) -> &ProbeError {
        match self {
            ProbeError::Wrapped { source, .. } => source.cause(),
            other => other,
        }
    }
}

/// Registry error code in its wire form (`MANIFEST_UNKNOWN`)
fn error_code(code: &OciErrorCode) -> String {
    if matches!(code, OciErrorCode::Unauthorized) {
        return UNAUTHORIZED_CODE.to_string();
    }

    let name = format!("{:?}", code);
    let mut wire = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            wire.push('_');
        }
        wire.push(c.to_ascii_uppercase());
    }
    wire
}

impl From<OciDistributionError> for ProbeError {
    fn from(e: OciDistributionError) -> Self {
        match e {
            OciDistributionError::AuthenticationFailure(message) => {
                ProbeError::Unauthorized { message }
            }
            OciDistributionError::UnauthorizedError { url } => ProbeError::Unauthorized {
                message: format!("not authorized to access {}", url),
            },
            OciDistributionError::RegistryError { envelope, url } => {
                let errors = envelope
                    .errors
                    .into_iter()
                    .map(|err| ProbeError::Registry {
                        code: error_code(&err.code),
                        message: err.message,
                    })
                    .collect();
                ProbeError::Multiple(errors).wrap(format!("registry error from {}", url))
            }
            OciDistributionError::ServerError { code, url, message } => ProbeError::Status {
                status: code,
                message: format!("{}: {}", url, message),
            },
            OciDistributionError::RequestError(err) => {
                if err.is_timeout() {
                    ProbeError::Timeout
                } else {
                    ProbeError::Network(err.to_string())
                }
            }
            other => ProbeError::Other(other.to_string()),
        }
    }
}
