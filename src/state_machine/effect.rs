//! Effects produced by state transitions

use crate::response::CanonicalResponse;

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append the user's message to the history
    AppendUserMessage { text: String },

    /// Append an assistant reply to the history
    AppendAssistantMessage { response: CanonicalResponse },

    /// Send the message to the backend
    Dispatch { text: String },

    /// Produce a simulated reply for the message
    Simulate { text: String },

    /// Notify subscribers of a busy/idle change
    NotifyStateChange { busy: bool },
}

impl Effect {
    pub fn append_reply(response: CanonicalResponse) -> Self {
        Effect::AppendAssistantMessage { response }
    }

    pub fn notify_busy() -> Self {
        Effect::NotifyStateChange { busy: true }
    }

    pub fn notify_idle() -> Self {
        Effect::NotifyStateChange { busy: false }
    }
}
