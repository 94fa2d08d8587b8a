//! Error handling for proc.
//!
//! [`ProcError`] is what every dispatch returns on failure. Its [`ErrorKind`]
//! is the stable classification callers match on; the variants carry the
//! diagnostic payload, which differs between failures reported by the remote
//! evaluator (a server-provided message and HTTP status) and failures to reach
//! it at all (the transport's own error).

/// Builder misuse.
pub mod expr;
/// Error kinds and HTTP status mapping.
pub mod kind;
/// Wire codec failures.
pub mod wire;

pub use expr::ExprError;
pub use kind::ErrorKind;
pub use wire::WireError;

use thiserror::Error;

/// Boxed transport-level cause of an [`ProcError::Unavailable`].
pub type TransportCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while building, encoding, or dispatching an expression.
#[derive(Debug, Error)]
pub enum ProcError {
    /// The evaluator was reached and answered with a failure status.
    #[error("{message}")]
    Remote {
        kind: ErrorKind,
        status: u16,
        message: String,
    },

    /// The evaluator could not be reached.
    #[error("proc is unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<TransportCause>,
    },

    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    Protocol(String),

    #[error(transparent)]
    Expr(#[from] ExprError),

    #[error(transparent)]
    Wire(#[from] WireError),
}

impl ProcError {
    /// Builds the error for a failure status, using the server's message.
    ///
    /// Statuses outside the protocol contract become [`ErrorKind::Error`]
    /// with the message `unhandled`.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match ErrorKind::from_status(status) {
            Some(kind) => ProcError::Remote {
                kind,
                status,
                message: message
                    .unwrap_or_else(|| format!("request failed with status {status}")),
            },
            None => ProcError::Remote {
                kind: ErrorKind::Error,
                status,
                message: "unhandled".to_string(),
            },
        }
    }

    /// Wraps a transport failure, keeping its raw message.
    pub fn unavailable<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ProcError::Unavailable {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcError::Remote { kind, .. } => *kind,
            ProcError::Unavailable { .. } => ErrorKind::Unavailable,
            ProcError::Protocol(_) => ErrorKind::Error,
            ProcError::Expr(_) | ProcError::Wire(_) => ErrorKind::Invalid,
        }
    }

    /// HTTP status of a remote failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProcError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message without the kind prefix added by `Display`.
    pub fn message(&self) -> String {
        match self {
            ProcError::Remote { message, .. } | ProcError::Unavailable { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

/// Result type for proc operations.
pub type ProcResult<T> = Result<T, ProcError>;
