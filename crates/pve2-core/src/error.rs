//! Error types for PVE API operations.
//!
//! Every failure path in this workspace surfaces as a variant of [`Error`];
//! nothing is collapsed into a bare boolean. The variants follow the
//! lifecycle of one API call: configuration, method gating, the network
//! round trip, response parsing, and the semantic layer on top.

use thiserror::Error;

/// Main error type for PVE API operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid construction input: empty field, unresolvable host, or
    /// out-of-range port. Fatal to construction, never retried.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Caller passed an HTTP method outside GET/PUT/POST/DELETE. No request
    /// is sent.
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// DNS, connect, TLS or timeout failure before a response arrived.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The response could not be split into header block and body, or its
    /// status line was not the expected `HTTP/1.1` form.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The remote answered with a non-200 status.
    #[error("Request rejected by server: {status} {reason}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Reason phrase from the status line.
        reason: String,
    },

    /// `/nodes` returned zero entries; the node cache is left untouched.
    #[error("Cluster returned an empty node list")]
    EmptyNodeList,

    /// A 200 response whose `data` field was absent, null, or not of the
    /// shape the operation requires.
    #[error("Response carried no usable data: {0}")]
    MissingData(String),
}

/// Specialized result type for PVE API operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::UnsupportedMethod(_) => "UNSUPPORTED_METHOD",
            Self::Transport(_) => "TRANSPORT_FAILURE",
            Self::MalformedResponse(_) => "MALFORMED_RESPONSE",
            Self::Rejected { .. } => "REJECTED",
            Self::EmptyNodeList => "EMPTY_NODE_LIST",
            Self::MissingData(_) => "MISSING_DATA",
        }
    }

    /// Returns the HTTP status the remote rejected with, when that is what
    /// happened. Lets callers branch on 401 vs 404 vs 5xx.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("timeout: {err}"))
        } else if err.is_connect() {
            Self::Transport(format!("connect: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid request URL: {err}"))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Config(err.to_string())
    }
}
