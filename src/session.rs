//! Session-scoped state: the conversation log and the active folder.
//!
//! One [`SessionState`] lives for the lifetime of a chat session and is
//! shared by reference (`Arc`) with the HTTP handlers or the CLI loop. It is
//! the only writer of the log and the folder record; every mutation goes
//! through [`SessionState::submit`], [`SessionState::record_scan`], or
//! [`SessionState::reset`].
//!
//! # Turn lifecycle
//!
//! ```text
//! Idle ──submit──▶ AwaitingResponse ──ok──▶ user + assistant appended
//!                                    └─err─▶ user appended only
//! ```
//!
//! Submissions are serialized by a turn lock held across the remote call.
//! Readers never wait on that lock.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Mutex;
use tracing::{info, warn};

use accobot_core::answering::{AnsweringService, ChatQuery};
use accobot_core::conversation::MessageLog;
use accobot_core::models::{ContextEntry, ConversationMessage, FolderRecord};
use accobot_core::reply::AssistantReply;

use crate::config::{Config, SessionConfig};
use crate::error::{SubmitError, ValidationError};

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub context_window: usize,
    pub max_message_chars: usize,
    pub greeting: Option<String>,
}

impl From<&SessionConfig> for SessionSettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            context_window: config.context_window,
            max_message_chars: config.max_message_chars,
            greeting: config
                .greeting
                .as_ref()
                .filter(|g| !g.trim().is_empty())
                .cloned(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

/// Both sides of a completed turn.
#[derive(Debug, Clone)]
pub struct Turn {
    pub user: ConversationMessage,
    pub assistant: ConversationMessage,
}

pub struct SessionState {
    settings: SessionSettings,
    log: RwLock<MessageLog>,
    folder: RwLock<Option<FolderRecord>>,
    turn: Mutex<()>,
}

impl SessionState {
    pub fn new(settings: SessionSettings) -> Self {
        let mut log = MessageLog::new();
        if let Some(greeting) = &settings.greeting {
            log.push_assistant(greeting.clone());
        }
        Self {
            settings,
            log: RwLock::new(log),
            folder: RwLock::new(None),
            turn: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(SessionSettings::from(&config.session))
    }

    pub fn messages(&self) -> Vec<ConversationMessage> {
        self.read_log().messages().to_vec()
    }

    pub fn message_count(&self) -> usize {
        self.read_log().len()
    }

    pub fn folder(&self) -> Option<FolderRecord> {
        self.folder
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// History that would accompany a submission made right now.
    pub fn context_window(&self) -> Vec<ContextEntry> {
        self.read_log().context_window(self.settings.context_window)
    }

    pub fn validate_message(&self, text: &str) -> Result<(), ValidationError> {
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        let len = text.chars().count();
        if len > self.settings.max_message_chars {
            return Err(ValidationError::MessageTooLong {
                len,
                max: self.settings.max_message_chars,
            });
        }
        Ok(())
    }

    /// Run one turn against `service`.
    ///
    /// The history sent is taken from the log before the new user message is
    /// appended. The user message is appended once the call resolves, whether
    /// or not it succeeded; the assistant message only on success. Invalid
    /// input is rejected before anything is sent or appended.
    pub async fn submit(
        &self,
        service: &dyn AnsweringService,
        text: &str,
    ) -> Result<Turn, SubmitError> {
        self.validate_message(text)?;
        let _turn = self.turn.lock().await;

        let query = ChatQuery {
            conversation_history: self.context_window(),
            query: text.to_string(),
        };
        let outcome = service.ask(&query).await;

        let user = self.write_log().push_user(text);
        match outcome {
            Ok(body) => {
                let reply = AssistantReply::from_value(&body);
                if !reply.is_recognized() {
                    warn!("answering service returned an unexpected shape; using fallback reply");
                }
                let assistant = self.write_log().push_assistant(reply.into_text());
                info!(
                    history = query.conversation_history.len(),
                    log_len = self.message_count(),
                    "turn completed"
                );
                Ok(Turn { user, assistant })
            }
            Err(e) => {
                warn!(kind = ?e.kind(), error = %e, "turn failed; user message kept");
                Err(e.into())
            }
        }
    }

    /// Make `record` the active folder and announce it in the log. The
    /// answering service is not involved.
    pub fn record_scan(&self, record: FolderRecord) -> ConversationMessage {
        let text = folder_notification(&record);
        *self.folder.write().unwrap_or_else(PoisonError::into_inner) = Some(record);
        self.write_log().push_system(text)
    }

    /// Clear the conversation; the greeting, if configured, is re-added.
    /// The active folder is kept.
    pub fn reset(&self) {
        let mut log = self.write_log();
        log.clear();
        if let Some(greeting) = &self.settings.greeting {
            log.push_assistant(greeting.clone());
        }
        info!("conversation reset");
    }

    fn read_log(&self) -> RwLockReadGuard<'_, MessageLog> {
        self.log.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_log(&self) -> RwLockWriteGuard<'_, MessageLog> {
        self.log.write().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn folder_notification(record: &FolderRecord) -> String {
    if record.files().is_empty() {
        return format!(
            "Data successfully stored from: {}. No XML files were found in this folder.",
            record.path()
        );
    }
    format!(
        "Data successfully stored from: {}. I've processed your financial documents: \
         {} XML file(s) found, {} valid and {} invalid. Ask me anything about them.",
        record.path(),
        record.files().len(),
        record.valid_count(),
        record.invalid_count()
    )
}
