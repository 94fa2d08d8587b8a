use std::fmt;

/// Classification of a failed proc call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input or arguments, or an oversized request.
    Invalid,
    /// Missing, invalid, or insufficiently scoped authorization.
    Unauthorized,
    /// Authorized but blocked.
    Forbidden,
    /// Unknown proc.
    Undefined,
    /// The call exceeded the evaluator's execution budget.
    Timeout,
    /// Rate limit exceeded.
    Limited,
    /// The evaluator could not be reached.
    Unavailable,
    /// Any other failure.
    Error,
}

impl ErrorKind {
    /// Maps a failure status to its kind.
    ///
    /// Returns `None` for `200` and for statuses outside the protocol contract.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            400 | 413 => Some(ErrorKind::Invalid),
            401 => Some(ErrorKind::Unauthorized),
            403 => Some(ErrorKind::Forbidden),
            404 => Some(ErrorKind::Undefined),
            408 => Some(ErrorKind::Timeout),
            429 => Some(ErrorKind::Limited),
            500 | 508 => Some(ErrorKind::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Invalid => "invalid",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Undefined => "undefined",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Limited => "limited",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Error => "error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
