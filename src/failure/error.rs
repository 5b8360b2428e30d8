//! Dispatch error types

use thiserror::Error;

/// Failure reported by a dispatcher, with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DispatchError {
    pub kind: FailureKind,
    /// HTTP status, when the backend answered at all
    pub status: Option<u16>,
    pub message: String,
}

impl DispatchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::from_status(status),
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Connectivity, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(FailureKind::RateLimited, message)
    }

    pub fn server_fault(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ServerFault, message)
    }

    pub fn auth_required(message: impl Into<String>) -> Self {
        Self::new(FailureKind::AuthRequired, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Other, message)
    }
}

/// Failure category driving the user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No connection to the backend (status 0, refused, DNS, timeout)
    Connectivity,
    /// Rate limited (429)
    RateLimited,
    /// Server error (5xx)
    ServerFault,
    /// Authentication required (401)
    AuthRequired,
    /// Anything else
    Other,
}

impl FailureKind {
    /// Gateway errors (502, 503, 504) count as server faults like 500.
    pub fn from_status(status: u16) -> Self {
        match status {
            0 => Self::Connectivity,
            429 => Self::RateLimited,
            500..=599 => Self::ServerFault,
            401 => Self::AuthRequired,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connectivity => "connectivity",
            Self::RateLimited => "rate_limited",
            Self::ServerFault => "server_fault",
            Self::AuthRequired => "auth_required",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
