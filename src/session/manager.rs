//! Session manager
//!
//! Owns the session id, the message history and the busy flag. Sends run
//! through the pure state machine; the manager executes the resulting
//! effects (dispatching, simulating, appending, notifying) and never lets a
//! failure escape `send_message`: errors come back as ordinary replies.

use super::history::{History, Message};
use super::identity;
use super::SessionEvent;
use crate::dispatch::{Dispatcher, Feedback};
use crate::failure::DispatchError;
use crate::response::{CanonicalResponse, CtaItem};
use crate::simulate::Simulator;
use crate::state_machine::{
    transition, Effect, Event, SessionContext, SessionState, TransitionError, TransitionResult,
};
use crate::store::KeyValueStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// Preference key for simulated mode; `"true"` enables it
pub const SIMULATED_MODE_KEY: &str = "use_simulated_replies";

/// Shorter partial input never triggers a completion request; whitespace counts
pub const MIN_COMPLETION_CHARS: usize = 3;

const LOCAL_CLEAR_WARNING: &str = "Session cleared locally only";
const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Result of [`SessionManager::send_message`]
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The message was sent and answered (possibly with an error reply)
    Replied(CanonicalResponse),
    /// Nothing happened
    Ignored(Rejection),
}

impl SendOutcome {
    pub fn reply(&self) -> Option<&CanonicalResponse> {
        match self {
            SendOutcome::Replied(response) => Some(response),
            SendOutcome::Ignored(_) => None,
        }
    }
}

/// Why a send was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Blank,
    Busy,
}

/// Result of [`SessionManager::clear_session`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearOutcome {
    pub session_id: String,
    pub warning: Option<String>,
}

impl ClearOutcome {
    /// The backend was not told about the clear
    pub fn is_local_only(&self) -> bool {
        self.warning.is_some()
    }
}

/// Summary of the current session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub messages: usize,
    pub created: DateTime<Utc>,
    /// False when built locally because the backend was unavailable
    pub remote: bool,
}

impl SessionInfo {
    fn local(session_id: String, messages: usize) -> Self {
        Self {
            session_id,
            messages,
            created: Utc::now(),
            remote: false,
        }
    }

    fn from_remote(value: &Value, session_id: &str, local_messages: usize) -> Self {
        let messages = match value.get("messages") {
            Some(Value::Array(items)) => items.len(),
            Some(other) => other
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(local_messages),
            None => local_messages,
        };
        let created = value
            .get("created")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map_or_else(Utc::now, |d| d.with_timezone(&Utc));

        Self {
            session_id: value
                .get("sessionId")
                .and_then(Value::as_str)
                .unwrap_or(session_id)
                .to_string(),
            messages,
            created,
            remote: true,
        }
    }
}

struct Inner {
    state: SessionState,
    /// Created lazily on first use
    session_id: Option<String>,
    history: History,
    /// Bumped on every clear; replies for an older generation are not recorded
    generation: u64,
    /// A dispatcher call is running; outlives a clear so sends never overlap
    dispatch_in_flight: bool,
}

/// Releases the dispatch slot when dropped.
///
/// If the session was cleared meanwhile, nobody else will announce that the
/// manager is free again, so the release publishes it.
struct InFlight<'a> {
    inner: &'a Mutex<Inner>,
    events_tx: &'a broadcast::Sender<SessionEvent>,
    generation: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let stale = {
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.dispatch_in_flight = false;
            inner.generation != self.generation
        };
        if stale {
            tracing::debug!(generation = self.generation, "Stale dispatch settled");
            let _ = self.events_tx.send(SessionEvent::StateChange { busy: false });
        }
    }
}

/// Owner of one conversation's identity, history and busy flag
pub struct SessionManager<D> {
    dispatcher: D,
    preferences: Arc<dyn KeyValueStore>,
    identity: Arc<dyn KeyValueStore>,
    simulator: Simulator,
    inner: Mutex<Inner>,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl<D: Dispatcher> SessionManager<D> {
    pub fn new(
        dispatcher: D,
        preferences: Arc<dyn KeyValueStore>,
        identity: Arc<dyn KeyValueStore>,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            dispatcher,
            preferences,
            identity,
            simulator: Simulator::default(),
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                session_id: None,
                history: History::default(),
                generation: 0,
                dispatch_in_flight: false,
            }),
            events_tx,
        }
    }

    pub fn with_simulator(mut self, simulator: Simulator) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Subscribe to message and state notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    pub fn session_id(&self) -> String {
        let mut inner = self.lock();
        self.ensure_session_id(&mut inner)
    }

    /// Snapshot of the history, oldest first
    pub fn messages(&self) -> Vec<Message> {
        self.lock().history.messages().to_vec()
    }

    pub fn last_reply(&self) -> Option<CanonicalResponse> {
        self.lock().history.last_reply().cloned()
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// True while a reply is pending, including one left over from a cleared session
    pub fn is_busy(&self) -> bool {
        let inner = self.lock();
        inner.state.is_busy() || inner.dispatch_in_flight
    }

    // ------------------------------------------------------------------
    // Simulated mode
    // ------------------------------------------------------------------

    pub fn is_simulated_mode(&self) -> bool {
        self.preferences.get(SIMULATED_MODE_KEY).as_deref() == Some("true")
    }

    pub fn enable_simulated_mode(&self) {
        self.preferences.set(SIMULATED_MODE_KEY, "true");
    }

    pub fn disable_simulated_mode(&self) {
        self.preferences.remove(SIMULATED_MODE_KEY);
    }

    // ------------------------------------------------------------------
    // Send/reply cycle
    // ------------------------------------------------------------------

    /// Send a message and wait for its reply.
    ///
    /// Blank messages and sends while a reply is pending are ignored. Every
    /// other send resolves with a reply, including when the backend fails.
    pub async fn send_message(&self, text: &str) -> SendOutcome {
        let context = self.context();
        let (generation, session_id, state, effects) = {
            let mut inner = self.lock();
            if inner.dispatch_in_flight {
                tracing::debug!(
                    state = inner.state.name(),
                    "Dispatch still running, ignoring message"
                );
                return SendOutcome::Ignored(Rejection::Busy);
            }
            let event = Event::UserMessage {
                text: text.to_string(),
            };
            let result = match transition(&inner.state, &context, event) {
                Ok(result) => result,
                Err(e) => {
                    tracing::debug!(error = %e, state = inner.state.name(), "Ignoring message");
                    return SendOutcome::Ignored(match e {
                        TransitionError::EmptyMessage => Rejection::Blank,
                        TransitionError::Busy | TransitionError::InvalidTransition(_) => {
                            Rejection::Busy
                        }
                    });
                }
            };
            let session_id = self.ensure_session_id(&mut inner);
            inner.state = result.new_state.clone();
            inner.dispatch_in_flight = true;
            (inner.generation, session_id, result.new_state, result.effects)
        };
        let in_flight = InFlight {
            inner: &self.inner,
            events_tx: &self.events_tx,
            generation,
        };

        tracing::debug!(session_id = %session_id, "Message accepted, awaiting reply");
        match self
            .run_effects(generation, &session_id, state, effects, in_flight)
            .await
        {
            Some(response) => SendOutcome::Replied(response),
            None => {
                tracing::error!(session_id = %session_id, "Send finished without a reply");
                SendOutcome::Replied(CanonicalResponse::fallback())
            }
        }
    }

    /// Execute effects until the cycle settles, returning the reply appended.
    ///
    /// `local` mirrors the state this send believes it is in, so a send that
    /// outlives a clear can still run to completion without touching the new
    /// session.
    async fn run_effects(
        &self,
        generation: u64,
        session_id: &str,
        mut local: SessionState,
        effects: Vec<Effect>,
        in_flight: InFlight<'_>,
    ) -> Option<CanonicalResponse> {
        let mut in_flight = Some(in_flight);
        let mut queue = VecDeque::from(effects);
        let mut reply = None;

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::AppendUserMessage { text } => self.append(generation, Message::user(text)),
                Effect::AppendAssistantMessage { response } => {
                    self.append(generation, Message::assistant(response.clone()));
                    reply = Some(response);
                }
                Effect::NotifyStateChange { busy } => {
                    if self.is_current(generation) {
                        self.publish(SessionEvent::StateChange { busy });
                    }
                }
                Effect::Dispatch { text } => {
                    let result = self.dispatcher.send(&text, session_id).await;
                    drop(in_flight.take());
                    let event = match result {
                        Ok(payload) => Event::ReplyReceived { payload },
                        Err(error) => {
                            tracing::warn!(
                                session_id = %session_id,
                                kind = %error.kind,
                                status = ?error.status,
                                error = %error.message,
                                "Dispatch failed, replying with classified message"
                            );
                            Event::DispatchFailed { error }
                        }
                    };
                    queue.extend(self.apply(generation, &mut local, event));
                }
                Effect::Simulate { text } => {
                    let response = self.simulator.reply(&text).await;
                    queue.extend(self.apply(
                        generation,
                        &mut local,
                        Event::SimulatedReply { response },
                    ));
                }
            }
        }

        reply
    }

    fn apply(&self, generation: u64, local: &mut SessionState, event: Event) -> Vec<Effect> {
        let context = self.context();
        let mut inner = self.lock();
        let current = inner.generation == generation;
        let state = if current {
            inner.state.clone()
        } else {
            local.clone()
        };

        let event_name = event.name();
        match transition(&state, &context, event) {
            Ok(result) => {
                tracing::debug!(
                    from = state.name(),
                    to = result.new_state.name(),
                    event = event_name,
                    current,
                    "Session transition"
                );
                if current {
                    inner.state = result.new_state.clone();
                }
                *local = result.new_state;
                result.effects
            }
            Err(e) => {
                tracing::warn!(error = %e, event = event_name, "Dropping event");
                vec![]
            }
        }
    }

    fn append(&self, generation: u64, message: Message) {
        {
            let mut inner = self.lock();
            if inner.generation != generation {
                tracing::info!(
                    message_id = %message.id,
                    "Session cleared while reply was in flight, not recording"
                );
                return;
            }
            inner.history.push(message.clone());
        }
        self.publish(SessionEvent::MessageAppended { message });
    }

    // ------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------

    /// Start a fresh session.
    ///
    /// The backend is asked to forget the old session; if that fails the
    /// clear still happens locally and the outcome carries a warning.
    pub async fn clear_session(&self) -> ClearOutcome {
        let old_id = self.session_id();
        let warning = match self.dispatcher.end_session(&old_id).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(
                    session_id = %old_id,
                    kind = %e.kind,
                    error = %e,
                    "Session teardown failed, clearing locally"
                );
                Some(LOCAL_CLEAR_WARNING.to_string())
            }
        };

        let session_id = identity::regenerate(self.identity.as_ref());
        // A dispatch left running announces idle itself when it settles
        let (effects, dispatch_in_flight) = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.session_id = Some(session_id.clone());
            inner.history.clear();
            let result = transition(&inner.state, &SessionContext::default(), Event::Reset)
                .unwrap_or_else(|_| TransitionResult::new(SessionState::Idle));
            inner.state = result.new_state;
            (result.effects, inner.dispatch_in_flight)
        };

        for effect in effects {
            if let Effect::NotifyStateChange { busy } = effect {
                if dispatch_in_flight {
                    continue;
                }
                self.publish(SessionEvent::StateChange { busy });
            }
        }

        tracing::info!(
            old_session_id = %old_id,
            session_id = %session_id,
            local_only = warning.is_some(),
            "Session cleared"
        );
        self.publish(SessionEvent::SessionCleared {
            session_id: session_id.clone(),
            warning: warning.clone(),
        });

        ClearOutcome {
            session_id,
            warning,
        }
    }

    /// Session summary from the backend, or a local one if unavailable.
    pub async fn session_info(&self) -> SessionInfo {
        let session_id = self.session_id();
        let local_messages = self.lock().history.len();

        match self.dispatcher.session_info(&session_id).await {
            Ok(value) => SessionInfo::from_remote(&value, &session_id, local_messages),
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to get session info");
                SessionInfo::local(session_id, local_messages)
            }
        }
    }

    // ------------------------------------------------------------------
    // Side requests, independent of the send/reply cycle
    // ------------------------------------------------------------------

    /// Suggestions for partial input; empty on short input or any failure.
    pub async fn completions(&self, partial: &str) -> Vec<String> {
        if partial.chars().count() < MIN_COMPLETION_CHARS {
            return vec![];
        }

        let session_id = self.session_id();
        self.dispatcher
            .completions(partial, &session_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Auto-completion failed");
                vec![]
            })
    }

    /// Report a button press to the backend.
    pub async fn submit_action(&self, action: &CtaItem) -> Result<Value, DispatchError> {
        let session_id = self.session_id();
        self.dispatcher
            .submit_action(action, &session_id)
            .await
            .inspect_err(|e| {
                tracing::error!(action = %action.value, error = %e, "CTA action failed");
            })
    }

    /// Submit a rating for one message.
    pub async fn submit_feedback(
        &self,
        message_id: &str,
        rating: u8,
        comment: Option<String>,
    ) -> Result<(), DispatchError> {
        let session_id = self.session_id();
        let feedback = Feedback {
            message_id: message_id.to_string(),
            rating,
            comment,
        };
        self.dispatcher
            .submit_feedback(&feedback, &session_id)
            .await
            .inspect_err(|e| tracing::error!(message_id, error = %e, "Feedback submission failed"))
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_session_id(&self, inner: &mut Inner) -> String {
        inner
            .session_id
            .get_or_insert_with(|| identity::load_or_create(self.identity.as_ref()))
            .clone()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    fn context(&self) -> SessionContext {
        SessionContext::new(self.is_simulated_mode())
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events_tx.send(event);
    }
}
