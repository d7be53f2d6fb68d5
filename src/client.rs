//! HTTP client for the remote answering service.
//!
//! Sends `POST <base_url><chat_path>` with a JSON [`ChatQuery`] body and
//! returns the response body as JSON, or as a plain string when the body
//! is not JSON. Non-2xx statuses become [`RemoteError::Status`]; transport
//! failures and timeouts become [`RemoteError::Network`].
//!
//! There is no retry: a failed turn is retried only when the user submits
//! again. No timeout is applied unless `remote.timeout_ms` is configured.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use accobot_core::answering::{AnsweringService, ChatQuery, RemoteError};

use crate::config::Config;

/// Longest error detail kept from a non-JSON error body.
const MAX_ERROR_DETAIL_CHARS: usize = 200;

pub struct HttpAnsweringService {
    client: reqwest::Client,
    url: String,
}

impl HttpAnsweringService {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            url: url.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.chat_url(),
            config.remote.timeout_ms.map(Duration::from_millis),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AnsweringService for HttpAnsweringService {
    async fn ask(&self, query: &ChatQuery) -> Result<Value, RemoteError> {
        debug!(
            url = %self.url,
            history = query.conversation_history.len(),
            "sending query to answering service"
        );

        let response = self
            .client
            .post(&self.url)
            .json(query)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %self.url, error = %e, "answering service unreachable");
                RemoteError::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        if !status.is_success() {
            warn!(url = %self.url, status = status.as_u16(), "answering service returned an error");
            return Err(RemoteError::Status {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        Ok(parse_body(&body))
    }
}

/// JSON when possible, otherwise the raw text. An empty body is `null`.
pub fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Pull a human-readable reason out of an error body.
fn error_detail(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "detail", "error"] {
            match map.get(key) {
                Some(Value::String(s)) => return s.clone(),
                Some(Value::Object(inner)) => {
                    if let Some(Value::String(s)) = inner.get("message") {
                        return s.clone();
                    }
                }
                _ => {}
            }
        }
    }
    body.chars().take(MAX_ERROR_DETAIL_CHARS).collect()
}
