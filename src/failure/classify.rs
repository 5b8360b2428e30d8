//! Mapping failures onto conversational replies
//!
//! A failed dispatch is shown to the user as an ordinary assistant turn: a
//! fixed apology for the failure category plus recovery buttons. The button
//! tokens are a closed vocabulary the presentation layer acts on.

use super::error::{DispatchError, FailureKind};
use crate::response::{ActionGroup, CanonicalResponse, CtaItem, Usage};

pub const CONNECTIVITY_MESSAGE: &str =
    "Unable to connect to the server. Please check your internet connection.";
pub const RATE_LIMITED_MESSAGE: &str =
    "Too many requests. Please wait a moment before trying again.";
pub const SERVER_FAULT_MESSAGE: &str = "Server error occurred. Our team has been notified.";
pub const AUTH_REQUIRED_MESSAGE: &str =
    "Authentication required. Please refresh the page and try again.";
pub const GENERIC_MESSAGE: &str = "I apologize, but I encountered an error. Please try again.";

/// Recovery actions offered with a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoveryAction {
    Retry,
    Support,
    Refresh,
    WaitRetry,
}

impl RecoveryAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Retry => "Try Again",
            Self::Support => "Contact Support",
            Self::Refresh => "Refresh Page",
            Self::WaitRetry => "Wait and Retry",
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::Retry => "retry",
            Self::Support => "support",
            Self::Refresh => "refresh",
            Self::WaitRetry => "wait_retry",
        }
    }

    /// Parse a button token back into a recovery action
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "retry" => Some(Self::Retry),
            "support" => Some(Self::Support),
            "refresh" => Some(Self::Refresh),
            "wait_retry" => Some(Self::WaitRetry),
            _ => None,
        }
    }

    pub fn to_cta(self) -> CtaItem {
        CtaItem::new(self.label(), self.token())
    }
}

/// User-facing message and recovery actions for a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureClassification {
    pub user_message: &'static str,
    pub actions: Vec<ActionGroup>,
}

impl FailureClassification {
    fn new(user_message: &'static str, actions: &[RecoveryAction]) -> Self {
        Self {
            user_message,
            actions: vec![ActionGroup::buttons(
                actions.iter().map(|a| a.to_cta()).collect(),
            )],
        }
    }

    /// Present the classification as an assistant reply
    pub fn into_response(self) -> CanonicalResponse {
        CanonicalResponse::new(self.user_message, self.actions, Usage::default())
    }
}

pub fn classify(error: &DispatchError) -> FailureClassification {
    classify_kind(error.kind)
}

pub fn classify_kind(kind: FailureKind) -> FailureClassification {
    use RecoveryAction::{Refresh, Retry, Support, WaitRetry};

    match kind {
        FailureKind::Connectivity => {
            FailureClassification::new(CONNECTIVITY_MESSAGE, &[Retry, Support])
        }
        FailureKind::RateLimited => FailureClassification::new(RATE_LIMITED_MESSAGE, &[WaitRetry]),
        FailureKind::ServerFault => {
            FailureClassification::new(SERVER_FAULT_MESSAGE, &[Retry, Support])
        }
        FailureKind::AuthRequired => FailureClassification::new(AUTH_REQUIRED_MESSAGE, &[Refresh]),
        FailureKind::Other => FailureClassification::new(GENERIC_MESSAGE, &[Retry, Support]),
    }
}
