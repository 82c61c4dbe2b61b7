//! Error types for assertion building, signing and token requests.
//!
//! Error text never carries key material, bearer credentials or issued tokens.
//! Bodies returned by the authorization server and status/messages returned by
//! the key-management service are kept verbatim for diagnosis.

use thiserror::Error;

/// Errors surfaced by the token client.
#[derive(Error, Debug)]
pub enum TokenClientError {
    /// An input was empty or otherwise unusable
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No certificate in the local store matches the thumbprint
    #[error("No certificate found for thumbprint {0}")]
    KeyNotFound(String),

    /// The certificate was found but its private key cannot sign
    #[error("Key access denied: {0}")]
    KeyAccessDenied(String),

    /// The cryptographic signing operation failed
    #[error("Signature error: {0}")]
    SignatureError(String),

    /// Credential acquisition for the key-management service failed
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// The key-management service rejected or failed the sign call
    #[error("Remote signing failed with status {status}: {message}")]
    RemoteSigningError {
        /// HTTP status returned by the service (0 when no response was received)
        status: u16,
        /// Service error code, when the body carried one
        code: Option<String>,
        /// Service error message, or the raw body
        message: String,
    },

    /// The token endpoint answered with a non-success status
    #[error("Token request failed with status {status}: {body}")]
    TokenRequestFailed {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// A success response could not be decoded
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The caller cancelled the request before it completed
    #[error("Request cancelled")]
    Cancelled,

    /// The HTTP collaborator timed out
    #[error("Request timed out")]
    Timeout,

    /// The configured backend does not implement the operation
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Connection-level HTTP failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for token client operations.
pub type TokenClientResult<T> = Result<T, TokenClientError>;

impl TokenClientError {
    /// Check if the caller may reasonably retry.
    ///
    /// The client itself never retries; this only classifies.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Transport(_) => true,
            Self::TokenRequestFailed { status, .. } | Self::RemoteSigningError { status, .. } => {
                *status == 429 || *status >= 500
            }
            _ => false,
        }
    }

    /// Create an invalid argument error.
    #[must_use]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a key not found error.
    #[must_use]
    pub fn key_not_found(thumbprint: impl Into<String>) -> Self {
        Self::KeyNotFound(thumbprint.into())
    }

    /// Create a key access denied error.
    #[must_use]
    pub fn key_access_denied(msg: impl Into<String>) -> Self {
        Self::KeyAccessDenied(msg.into())
    }

    /// Create a signature error.
    #[must_use]
    pub fn signature(msg: impl Into<String>) -> Self {
        Self::SignatureError(msg.into())
    }

    /// Create an authentication error.
    #[must_use]
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::AuthenticationError(msg.into())
    }

    /// Create a remote signing error.
    #[must_use]
    pub fn remote_signing(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        Self::RemoteSigningError {
            status,
            code,
            message: message.into(),
        }
    }

    /// Create a malformed response error.
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create a not supported error.
    #[must_use]
    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<reqwest::Error> for TokenClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.without_url().to_string())
        }
    }
}

impl From<serde_json::Error> for TokenClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedResponse(err.to_string())
    }
}
