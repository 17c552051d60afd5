//! Error types for Proxmox API operations.

use std::io;

/// Result type alias for Proxmox API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a Proxmox VE node.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure (connection refused, TLS, bad status).
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if the server answered at all.
        status: Option<u16>,
    },

    /// Authentication rejected by the API.
    #[error("authentication failed for {username}: {message}")]
    Auth {
        /// Username the ticket was requested for.
        username: String,
        /// Error message.
        message: String,
    },

    /// The configured node does not exist on this cluster.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// The API rejected an operation on a specific VM.
    #[error("{operation} failed for vm {vmid}: {message}")]
    Api {
        /// Operation that was attempted ("start", "stop", ...).
        operation: &'static str,
        /// VM the operation targeted.
        vmid: u64,
        /// Error message from the API.
        message: String,
    },

    /// Response body did not match the expected shape.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// IO error while reading a response body.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// Create an API rejection error for a VM operation.
    pub fn api(operation: &'static str, vmid: u64, message: impl Into<String>) -> Self {
        Self::Api {
            operation,
            vmid,
            message: message.into(),
        }
    }

    /// Whether this error came from the transport layer rather than the API.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Io(_))
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {}", code),
                status: Some(code),
            },
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
