//! ---
//! studio_section: "05-external-interfaces"
//! studio_subsection: "module"
//! studio_type: "source"
//! studio_scope: "code"
//! studio_description: "Hosted backend collaborators consumed by the console."
//! studio_version: "v0.1.0"
//! studio_owner: "tbd"
//! ---
use thiserror::Error;

/// Failures reported by a collaborator. Display strings are the backend's own
/// message where one was provided, so they can be surfaced verbatim.
#[derive(Debug, Error)]
pub enum BackendError {
    /// No row or object matched.
    #[error("not found")]
    NotFound,
    /// Missing or rejected credentials.
    #[error("{0}")]
    Unauthorized(String),
    /// Non-success response from a REST endpoint.
    #[error("{message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },
    /// Edge function reported an error.
    #[error("{message}")]
    Function {
        /// Function name.
        name: String,
        /// Error field of the reply, or `Server error: <status>`.
        message: String,
    },
    /// Media object could not be removed from its bucket.
    #[error("Storage error: {0}")]
    Storage(String),
    /// Connection, TLS or timeout failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// Response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
    /// Client could not be built from configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Endpoint URL could not be built.
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl BackendError {
    /// HTTP status when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Http { status, .. } => Some(*status),
            BackendError::Unauthorized(_) => Some(401),
            BackendError::NotFound => Some(404),
            _ => None,
        }
    }
}
