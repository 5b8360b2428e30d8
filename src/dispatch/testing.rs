//! Mock dispatchers for testing
//!
//! These mocks enable session tests without real I/O.

use super::{Dispatcher, Feedback};
use crate::failure::DispatchError;
use crate::response::CtaItem;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Mock Dispatcher
// ============================================================================

/// Mock dispatcher that returns queued replies
#[allow(dead_code)]
#[derive(Default)]
pub struct MockDispatcher {
    replies: Mutex<VecDeque<Result<Value, DispatchError>>>,
    end_session_error: Mutex<Option<DispatchError>>,
    session_info: Mutex<Option<Result<Value, DispatchError>>>,
    completions: Mutex<Option<Result<Vec<String>, DispatchError>>>,
    /// Record of all `(message, session_id)` pairs sent
    pub sent: Mutex<Vec<(String, String)>>,
    /// Session ids passed to `end_session`
    pub ended: Mutex<Vec<String>>,
    /// Partial inputs passed to `completions`
    pub completion_requests: Mutex<Vec<String>>,
    pub actions: Mutex<Vec<(CtaItem, String)>>,
    pub feedback: Mutex<Vec<(Feedback, String)>>,
}

#[allow(dead_code)]
impl MockDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply payload
    pub fn queue_reply(&self, payload: Value) {
        self.replies.lock().unwrap().push_back(Ok(payload));
    }

    /// Queue a dispatch failure
    pub fn queue_error(&self, error: DispatchError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Make the next `end_session` call fail
    pub fn fail_end_session(&self, error: DispatchError) {
        *self.end_session_error.lock().unwrap() = Some(error);
    }

    pub fn set_session_info(&self, result: Result<Value, DispatchError>) {
        *self.session_info.lock().unwrap() = Some(result);
    }

    pub fn set_completions(&self, result: Result<Vec<String>, DispatchError>) {
        *self.completions.lock().unwrap() = Some(result);
    }

    pub fn recorded_sends(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Result<Value, DispatchError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DispatchError::connectivity("No mock reply queued")))
    }
}

#[async_trait]
impl Dispatcher for MockDispatcher {
    async fn send(&self, message: &str, session_id: &str) -> Result<Value, DispatchError> {
        self.sent
            .lock()
            .unwrap()
            .push((message.to_string(), session_id.to_string()));
        self.next_reply()
    }

    async fn end_session(&self, session_id: &str) -> Result<(), DispatchError> {
        self.ended.lock().unwrap().push(session_id.to_string());
        match self.end_session_error.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn session_info(&self, _session_id: &str) -> Result<Value, DispatchError> {
        self.session_info
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(DispatchError::connectivity("No session info configured")))
    }

    async fn completions(
        &self,
        partial: &str,
        _session_id: &str,
    ) -> Result<Vec<String>, DispatchError> {
        self.completion_requests
            .lock()
            .unwrap()
            .push(partial.to_string());
        self.completions
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(vec![]))
    }

    async fn submit_action(
        &self,
        action: &CtaItem,
        session_id: &str,
    ) -> Result<Value, DispatchError> {
        self.actions
            .lock()
            .unwrap()
            .push((action.clone(), session_id.to_string()));
        Ok(serde_json::json!({ "success": true }))
    }

    async fn submit_feedback(
        &self,
        feedback: &Feedback,
        session_id: &str,
    ) -> Result<(), DispatchError> {
        self.feedback
            .lock()
            .unwrap()
            .push((feedback.clone(), session_id.to_string()));
        Ok(())
    }
}

// ============================================================================
// Delayed Mock Dispatcher (for in-flight testing)
// ============================================================================

/// Mock dispatcher whose `send` waits before replying
pub struct DelayedMockDispatcher {
    pub inner: MockDispatcher,
    delay: Duration,
    /// Notified when a send starts (for test synchronization)
    pub send_started: Arc<Notify>,
}

impl DelayedMockDispatcher {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockDispatcher::new(),
            delay,
            send_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, payload: Value) {
        self.inner.queue_reply(payload);
    }
}

#[async_trait]
impl Dispatcher for DelayedMockDispatcher {
    async fn send(&self, message: &str, session_id: &str) -> Result<Value, DispatchError> {
        self.inner
            .sent
            .lock()
            .unwrap()
            .push((message.to_string(), session_id.to_string()));
        self.send_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.next_reply()
    }

    async fn end_session(&self, session_id: &str) -> Result<(), DispatchError> {
        self.inner.end_session(session_id).await
    }

    async fn session_info(&self, session_id: &str) -> Result<Value, DispatchError> {
        self.inner.session_info(session_id).await
    }

    async fn completions(
        &self,
        partial: &str,
        session_id: &str,
    ) -> Result<Vec<String>, DispatchError> {
        self.inner.completions(partial, session_id).await
    }

    async fn submit_action(
        &self,
        action: &CtaItem,
        session_id: &str,
    ) -> Result<Value, DispatchError> {
        self.inner.submit_action(action, session_id).await
    }

    async fn submit_feedback(
        &self,
        feedback: &Feedback,
        session_id: &str,
    ) -> Result<(), DispatchError> {
        self.inner.submit_feedback(feedback, session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::FailureKind;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_dispatcher_queue() {
        let mock = MockDispatcher::new();
        mock.queue_reply(json!("hello"));
        mock.queue_error(DispatchError::rate_limited("429"));

        assert_eq!(mock.send("a", "s1").await.unwrap(), json!("hello"));
        assert_eq!(
            mock.send("b", "s1").await.unwrap_err().kind,
            FailureKind::RateLimited
        );
        // Exhausted queue behaves like an unreachable backend
        assert_eq!(
            mock.send("c", "s1").await.unwrap_err().kind,
            FailureKind::Connectivity
        );
        assert_eq!(mock.recorded_sends().len(), 3);
    }

    #[tokio::test]
    async fn test_end_session_failure_is_one_shot() {
        let mock = MockDispatcher::new();
        mock.fail_end_session(DispatchError::server_fault("500"));
        assert!(mock.end_session("s1").await.is_err());
        assert!(mock.end_session("s1").await.is_ok());
    }
}
