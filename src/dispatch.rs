//! Backend dispatch abstraction
//!
//! The session manager never talks to the network directly; it goes through
//! a [`Dispatcher`], which lets the HTTP transport be swapped for mocks.

mod http;

#[cfg(test)]
pub mod testing;

pub use http::HttpDispatcher;

use crate::failure::DispatchError;
use crate::response::CtaItem;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Feedback about one assistant message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub message_id: String,
    pub rating: u8,
    pub comment: Option<String>,
}

/// Transport to the chat backend
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Send a chat message, returning the raw reply payload
    async fn send(&self, message: &str, session_id: &str) -> Result<Value, DispatchError>;

    /// Tear down the backend's view of a session
    async fn end_session(&self, session_id: &str) -> Result<(), DispatchError>;

    /// Fetch the backend's record of a session
    async fn session_info(&self, session_id: &str) -> Result<Value, DispatchError>;

    /// Auto-completion suggestions for partial input
    async fn completions(
        &self,
        partial: &str,
        session_id: &str,
    ) -> Result<Vec<String>, DispatchError>;

    /// Report that the user pressed a reply button
    async fn submit_action(
        &self,
        action: &CtaItem,
        session_id: &str,
    ) -> Result<Value, DispatchError>;

    /// Submit feedback about a message
    async fn submit_feedback(
        &self,
        feedback: &Feedback,
        session_id: &str,
    ) -> Result<(), DispatchError>;
}

// ============================================================================
// Arc implementation for trait objects
// ============================================================================

#[async_trait]
impl<T: Dispatcher + ?Sized> Dispatcher for Arc<T> {
    async fn send(&self, message: &str, session_id: &str) -> Result<Value, DispatchError> {
        (**self).send(message, session_id).await
    }

    async fn end_session(&self, session_id: &str) -> Result<(), DispatchError> {
        (**self).end_session(session_id).await
    }

    async fn session_info(&self, session_id: &str) -> Result<Value, DispatchError> {
        (**self).session_info(session_id).await
    }

    async fn completions(
        &self,
        partial: &str,
        session_id: &str,
    ) -> Result<Vec<String>, DispatchError> {
        (**self).completions(partial, session_id).await
    }

    async fn submit_action(
        &self,
        action: &CtaItem,
        session_id: &str,
    ) -> Result<Value, DispatchError> {
        (**self).submit_action(action, session_id).await
    }

    async fn submit_feedback(
        &self,
        feedback: &Feedback,
        session_id: &str,
    ) -> Result<(), DispatchError> {
        (**self).submit_feedback(feedback, session_id).await
    }
}

// ============================================================================
// Logging wrapper
// ============================================================================

/// Logs the duration and outcome of every call to the wrapped dispatcher
pub struct LoggingDispatcher<D> {
    inner: D,
}

impl<D: Dispatcher> LoggingDispatcher<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }
}

fn log_outcome<T>(operation: &str, start: Instant, result: &Result<T, DispatchError>) {
    let duration_ms = start.elapsed().as_millis();
    match result {
        Ok(_) => tracing::debug!(operation, duration_ms = %duration_ms, "Dispatch completed"),
        Err(e) => tracing::warn!(
            operation,
            duration_ms = %duration_ms,
            kind = %e.kind,
            status = ?e.status,
            error = %e.message,
            "Dispatch failed"
        ),
    }
}

#[async_trait]
impl<D: Dispatcher> Dispatcher for LoggingDispatcher<D> {
    async fn send(&self, message: &str, session_id: &str) -> Result<Value, DispatchError> {
        let start = Instant::now();
        let result = self.inner.send(message, session_id).await;
        log_outcome("send", start, &result);
        result
    }

    async fn end_session(&self, session_id: &str) -> Result<(), DispatchError> {
        let start = Instant::now();
        let result = self.inner.end_session(session_id).await;
        log_outcome("end_session", start, &result);
        result
    }

    async fn session_info(&self, session_id: &str) -> Result<Value, DispatchError> {
        let start = Instant::now();
        let result = self.inner.session_info(session_id).await;
        log_outcome("session_info", start, &result);
        result
    }

    async fn completions(
        &self,
        partial: &str,
        session_id: &str,
    ) -> Result<Vec<String>, DispatchError> {
        let start = Instant::now();
        let result = self.inner.completions(partial, session_id).await;
        log_outcome("completions", start, &result);
        result
    }

    async fn submit_action(
        &self,
        action: &CtaItem,
        session_id: &str,
    ) -> Result<Value, DispatchError> {
        let start = Instant::now();
        let result = self.inner.submit_action(action, session_id).await;
        log_outcome("submit_action", start, &result);
        result
    }

    async fn submit_feedback(
        &self,
        feedback: &Feedback,
        session_id: &str,
    ) -> Result<(), DispatchError> {
        let start = Instant::now();
        let result = self.inner.submit_feedback(feedback, session_id).await;
        log_outcome("submit_feedback", start, &result);
        result
    }
}
