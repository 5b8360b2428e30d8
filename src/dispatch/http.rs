//! HTTP dispatcher for the chat backend

use super::{Dispatcher, Feedback};
use crate::config::ClientConfig;
use crate::failure::DispatchError;
use crate::response::CtaItem;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{json, Value};

const SESSION_HEADER: &str = "X-Session-ID";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Dispatcher speaking JSON over HTTP
pub struct HttpDispatcher {
    client: Client,
    api_url: String,
    autocomplete_url: String,
}

impl HttpDispatcher {
    pub fn new(config: &ClientConfig) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DispatchError::other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            autocomplete_url: config.autocomplete_url.clone(),
        })
    }

    fn request(&self, method: Method, url: &str, session_id: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
            .header(SESSION_HEADER, session_id)
    }

    fn session_url(&self, session_id: &str) -> String {
        format!("{}/session/{session_id}", self.api_url)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value, DispatchError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = if body.is_empty() {
                status.to_string()
            } else {
                body
            };
            return Err(DispatchError::from_status(status.as_u16(), message));
        }

        Ok(parse_body(&body))
    }
}

/// Decode a success body; anything that is not JSON is a plain-text reply.
fn parse_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

fn transport_error(error: reqwest::Error) -> DispatchError {
    if let Some(status) = error.status() {
        return DispatchError::from_status(status.as_u16(), error.to_string());
    }
    if error.is_decode() || error.is_builder() {
        return DispatchError::other(error.to_string());
    }
    DispatchError::connectivity(error.to_string())
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn send(&self, message: &str, session_id: &str) -> Result<Value, DispatchError> {
        let now = Utc::now();
        let payload = json!({
            "message": message,
            "sessionId": session_id,
            "timestamp": now.to_rfc3339(),
            "context": {
                "userAgent": USER_AGENT,
                "timestamp": now.timestamp_millis()
            }
        });

        let url = format!("{}/chat", self.api_url);
        self.execute(self.request(Method::POST, &url, session_id).json(&payload))
            .await
    }

    async fn end_session(&self, session_id: &str) -> Result<(), DispatchError> {
        let url = self.session_url(session_id);
        self.execute(self.request(Method::DELETE, &url, session_id))
            .await
            .map(|_| ())
    }

    async fn session_info(&self, session_id: &str) -> Result<Value, DispatchError> {
        let url = self.session_url(session_id);
        self.execute(self.request(Method::GET, &url, session_id))
            .await
    }

    async fn completions(
        &self,
        partial: &str,
        session_id: &str,
    ) -> Result<Vec<String>, DispatchError> {
        let payload = json!({
            "message": partial,
            "sessionId": session_id,
            "source": "portal",
            "playType": "Basic Option"
        });

        let value = self
            .execute(
                self.request(Method::POST, &self.autocomplete_url, session_id)
                    .json(&payload),
            )
            .await?;

        match value {
            Value::Array(items) => Ok(items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s),
                    _ => None,
                })
                .collect()),
            other => Err(DispatchError::other(format!(
                "Unexpected completion payload: {other}"
            ))),
        }
    }

    async fn submit_action(
        &self,
        action: &CtaItem,
        session_id: &str,
    ) -> Result<Value, DispatchError> {
        let payload = json!({
            "action": action.value,
            "actionName": action.label,
            "sessionId": session_id,
            "timestamp": Utc::now().to_rfc3339()
        });

        let url = format!("{}/cta-action", self.api_url);
        self.execute(self.request(Method::POST, &url, session_id).json(&payload))
            .await
    }

    async fn submit_feedback(
        &self,
        feedback: &Feedback,
        session_id: &str,
    ) -> Result<(), DispatchError> {
        let payload = json!({
            "messageId": feedback.message_id,
            "rating": feedback.rating,
            "comment": feedback.comment,
            "sessionId": session_id,
            "timestamp": Utc::now().to_rfc3339()
        });

        let url = format!("{}/feedback", self.api_url);
        self.execute(self.request(Method::POST, &url, session_id).json(&payload))
            .await
            .map(|_| ())
    }
}
