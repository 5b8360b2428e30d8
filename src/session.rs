//! Session identity, message history and the send/reply cycle

mod history;
mod identity;
mod manager;

pub use history::{History, Message};
pub use identity::{generate_session_id, SESSION_ID_KEY};
pub use manager::{
    ClearOutcome, Rejection, SendOutcome, SessionInfo, SessionManager, MIN_COMPLETION_CHARS,
    SIMULATED_MODE_KEY,
};

/// Notifications published by the session manager
#[derive(Debug, Clone)]
pub enum SessionEvent {
    MessageAppended {
        message: Message,
    },
    StateChange {
        busy: bool,
    },
    SessionCleared {
        session_id: String,
        /// Set when the backend could not be told about the clear
        warning: Option<String>,
    },
}
