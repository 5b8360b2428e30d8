//! Events that drive the session

use crate::failure::DispatchError;
use crate::response::CanonicalResponse;
use serde_json::Value;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserMessage { text: String },

    // Dispatcher events
    ReplyReceived { payload: Value },
    DispatchFailed { error: DispatchError },

    // Simulator events
    SimulatedReply { response: CanonicalResponse },

    /// Session cleared; drop whatever was in flight
    Reset,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::UserMessage { .. } => "user_message",
            Event::ReplyReceived { .. } => "reply_received",
            Event::DispatchFailed { .. } => "dispatch_failed",
            Event::SimulatedReply { .. } => "simulated_reply",
            Event::Reset => "reset",
        }
    }
}
