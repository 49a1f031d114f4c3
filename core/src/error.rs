//! Error types for the Umami client.
//!
//! # Design
//! `Validation` and `OperationNotAllowed` are raised locally, before any
//! request leaves the process. Everything the server or the network can
//! produce lands in `Http`, `Transport` or `Deserialization`. Non-2xx
//! responses keep the raw status code and body for debugging.

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, UmamiError>;

/// Errors returned by `UmamiClient` operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UmamiError {
    /// The caller supplied missing or malformed input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The session is not in a state that permits the operation
    /// (no base URL set, or not logged in).
    #[error("operation not allowed: {0}")]
    OperationNotAllowed(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (DNS, connect, TLS, I/O).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl UmamiError {
    /// True for the errors raised before any network I/O was attempted.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            UmamiError::Validation(_) | UmamiError::OperationNotAllowed(_)
        )
    }
}
