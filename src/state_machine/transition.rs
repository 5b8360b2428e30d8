//! Pure state transition function

use super::{Effect, Event, SessionContext, SessionState};
use crate::failure::classify;
use crate::response::normalize;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyMessage,
    #[error("A reply is still pending, cannot accept message")]
    Busy,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs; all I/O is
/// expressed as returned effects.
pub fn transition(
    state: &SessionState,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // User messages
        // ============================================================

        (_, Event::UserMessage { text }) if text.trim().is_empty() => {
            Err(TransitionError::EmptyMessage)
        }

        (SessionState::Idle, Event::UserMessage { text }) => Ok(TransitionResult::new(
            SessionState::AwaitingReply {
                pending: text.clone(),
            },
        )
        .with_effect(Effect::AppendUserMessage { text: text.clone() })
        .with_effect(Effect::notify_busy())
        .with_effect(Effect::Dispatch { text })),

        (SessionState::AwaitingReply { .. }, Event::UserMessage { .. }) => {
            Err(TransitionError::Busy)
        }

        // ============================================================
        // Replies
        // ============================================================

        (SessionState::AwaitingReply { .. }, Event::ReplyReceived { payload }) => {
            Ok(TransitionResult::new(SessionState::Idle)
                .with_effect(Effect::append_reply(normalize(&payload)))
                .with_effect(Effect::notify_idle()))
        }

        // Simulated mode swaps the error message for a synthesized reply
        (SessionState::AwaitingReply { pending }, Event::DispatchFailed { .. })
            if context.simulated =>
        {
            Ok(TransitionResult::new(SessionState::AwaitingReply {
                pending: pending.clone(),
            })
            .with_effect(Effect::Simulate {
                text: pending.clone(),
            }))
        }

        (SessionState::AwaitingReply { .. }, Event::DispatchFailed { error }) => {
            Ok(TransitionResult::new(SessionState::Idle)
                .with_effect(Effect::append_reply(classify(&error).into_response()))
                .with_effect(Effect::notify_idle()))
        }

        (SessionState::AwaitingReply { .. }, Event::SimulatedReply { response }) => {
            Ok(TransitionResult::new(SessionState::Idle)
                .with_effect(Effect::append_reply(response))
                .with_effect(Effect::notify_idle()))
        }

        // ============================================================
        // Reset
        // ============================================================

        (SessionState::AwaitingReply { .. }, Event::Reset) => {
            Ok(TransitionResult::new(SessionState::Idle).with_effect(Effect::notify_idle()))
        }

        (SessionState::Idle, Event::Reset) => Ok(TransitionResult::new(SessionState::Idle)),

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{} cannot handle {}",
            state.name(),
            event.name()
        ))),
    }
}
