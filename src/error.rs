//! Error taxonomy shared by the CLI and the HTTP boundary.
//!
//! Per-file problems never show up here; they are recorded inside the
//! file's [`XmlFileRecord`](accobot_core::models::XmlFileRecord). Parse
//! failures use [`XmlError`](crate::xml::XmlError) and remote failures use
//! [`RemoteError`].

use std::path::PathBuf;

use accobot_core::answering::RemoteError;
use thiserror::Error;

/// Malformed or policy-violating input. Always recoverable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Path is required")]
    EmptyPath,

    #[error("Path must be within the sandbox directory ({root})")]
    OutsideSandbox { root: String },

    #[error("Message is required")]
    EmptyMessage,

    #[error("Message too long ({len} characters, limit {max})")]
    MessageTooLong { len: usize, max: usize },
}

/// Directory-level failures of a scan target.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Directory does not exist or cannot be accessed: {}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path is not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },
}

/// Why a chat submission did not produce an assistant reply.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl SubmitError {
    /// Text suitable for a toast or a CLI error line.
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Validation(e) => e.to_string(),
            SubmitError::Remote(e) => e.user_message().to_string(),
        }
    }
}
