use std::fmt;

/// Transport-level failure talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
}

impl BackendError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Maps a non-success status, keeping the backend's `detail` text when
    /// the body carries one.
    pub(crate) fn from_status(status: u16, body: &str) -> Self {
        let kind = if status == 401 {
            FailureKind::Unauthorized
        } else {
            FailureKind::HttpStatus(status)
        };
        let message = crate::wire::error_detail(body).unwrap_or_else(|| body.trim().to_owned());
        Self::new(kind, message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Unauthorized,
    HttpStatus(u16),
    Timeout,
    Decode,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Unauthorized => write!(f, "unauthorized"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Decode => write!(f, "unexpected response body"),
            FailureKind::TooLarge { max_bytes, actual } => match actual {
                Some(actual) => write!(f, "body of {actual} bytes exceeds {max_bytes}"),
                None => write!(f, "body exceeds {max_bytes} bytes"),
            },
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
