//! Contract with the remote answering service.
//!
//! The [`AnsweringService`] trait is the only way the session talks to the
//! backend that produces natural-language answers. The HTTP implementation
//! lives in the `accobot` crate; [`ScriptedAnsweringService`] replays canned
//! responses for tests and offline use.
//!
//! Failures are reported as [`RemoteError`], classified into a fixed set of
//! [`RemoteErrorKind`] categories that each carry a user-facing message.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::ContextEntry;

/// Request body for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatQuery {
    pub conversation_history: Vec<ContextEntry>,
    pub query: String,
}

/// User-facing failure categories for the answering service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    ServerError,
    Unavailable,
    Network,
    Other,
}

impl RemoteErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => RemoteErrorKind::BadRequest,
            401 => RemoteErrorKind::Unauthorized,
            403 => RemoteErrorKind::Forbidden,
            404 => RemoteErrorKind::NotFound,
            500 => RemoteErrorKind::ServerError,
            502..=504 => RemoteErrorKind::Unavailable,
            _ => RemoteErrorKind::Other,
        }
    }

    /// Machine-readable code used in HTTP error bodies.
    pub fn code(self) -> &'static str {
        match self {
            RemoteErrorKind::BadRequest => "remote_bad_request",
            RemoteErrorKind::Unauthorized => "remote_unauthorized",
            RemoteErrorKind::Forbidden => "remote_forbidden",
            RemoteErrorKind::NotFound => "remote_not_found",
            RemoteErrorKind::ServerError => "remote_server_error",
            RemoteErrorKind::Unavailable => "remote_unavailable",
            RemoteErrorKind::Network => "remote_network",
            RemoteErrorKind::Other => "remote_error",
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            RemoteErrorKind::BadRequest => "Invalid request. Please check your message and try again.",
            RemoteErrorKind::Unauthorized => "Authentication required. Please sign in and try again.",
            RemoteErrorKind::Forbidden => "You do not have permission to perform this action.",
            RemoteErrorKind::NotFound => "The assistant endpoint was not found. Please check the server configuration.",
            RemoteErrorKind::ServerError => "The assistant ran into an internal error. Please try again later.",
            RemoteErrorKind::Unavailable => "The assistant is temporarily unavailable. Please try again later.",
            RemoteErrorKind::Network => {
                "Network error. Please check your connection and make sure the assistant server is running."
            }
            RemoteErrorKind::Other => "An unexpected error occurred. Please try again.",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The service answered with a non-2xx status.
    #[error("answering service returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    /// No response was received (connection refused, DNS, timeout).
    #[error("answering service unreachable: {0}")]
    Network(String),
}

impl RemoteError {
    pub fn kind(&self) -> RemoteErrorKind {
        match self {
            RemoteError::Status { status, .. } => RemoteErrorKind::from_status(*status),
            RemoteError::Network(_) => RemoteErrorKind::Network,
        }
    }

    pub fn user_message(&self) -> &'static str {
        self.kind().user_message()
    }
}

/// Backend that turns a query plus recent history into an answer.
///
/// Implementations return the raw response body; shape normalization is
/// the caller's job (see [`crate::reply::AssistantReply`]).
#[async_trait]
pub trait AnsweringService: Send + Sync {
    async fn ask(&self, query: &ChatQuery) -> Result<Value, RemoteError>;
}

/// Replays queued responses in order and records every query it receives.
///
/// Once the queue is empty every call fails with a network error.
#[derive(Default)]
pub struct ScriptedAnsweringService {
    responses: Mutex<VecDeque<Result<Value, RemoteError>>>,
    received: Mutex<Vec<ChatQuery>>,
}

impl ScriptedAnsweringService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: impl IntoIterator<Item = Result<Value, RemoteError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn push_response(&self, response: Result<Value, RemoteError>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    pub fn received(&self) -> Vec<ChatQuery> {
        self.received.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl AnsweringService for ScriptedAnsweringService {
    async fn ask(&self, query: &ChatQuery) -> Result<Value, RemoteError> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.clone());
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::Network("no scripted response left".to_string())))
    }
}
