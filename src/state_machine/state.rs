//! Session state types

/// Whether a reply is outstanding
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    /// A message has been dispatched and its reply has not arrived yet
    AwaitingReply {
        /// Text of the in-flight message, kept for simulated replies
        pending: String,
    },
}

impl SessionState {
    pub fn is_busy(&self) -> bool {
        matches!(self, SessionState::AwaitingReply { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::AwaitingReply { .. } => "awaiting_reply",
        }
    }
}

/// Read-only inputs to a transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionContext {
    /// Answer failed dispatches with simulated replies
    pub simulated: bool,
}

impl SessionContext {
    pub fn new(simulated: bool) -> Self {
        Self { simulated }
    }
}
