//! Core data contracts used throughout accobot.
//!
//! These types flow between the ingestion pipeline, the session state, and
//! the HTTP boundary. Wire names are camelCase to match what the desktop
//! front end consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a [`ConversationMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Synthetic notifications (folder scans) that never reach the remote service.
    System,
}

impl Role {
    /// Role label sent to the answering service. Only `user` survives;
    /// everything else is attributed to the assistant.
    pub fn wire_role(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant | Role::System => "assistant",
        }
    }
}

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    /// UUID v4, unique within the process.
    pub id: String,
    /// Insertion sequence within the owning log, starting at 0.
    pub seq: u64,
    pub role: Role,
    pub text: String,
    /// Client-local wall clock time (`HH:MM`).
    pub timestamp: String,
}

/// A `{role, content}` pair sent as conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub role: String,
    pub content: String,
}

impl From<&ConversationMessage> for ContextEntry {
    fn from(message: &ConversationMessage) -> Self {
        Self {
            role: message.role.wire_role().to_string(),
            content: message.text.clone(),
        }
    }
}

/// Validation result for a single `.xml` file discovered by a scan.
///
/// Created once per scan and never mutated. `errors` is present if and only
/// if `is_valid` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XmlFileRecord {
    pub file_path: String,
    pub file_name: String,
    pub is_valid: bool,
    pub file_size_bytes: u64,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl XmlFileRecord {
    /// A well-formed file. Classification fields are filled in by the caller.
    pub fn valid(
        file_path: impl Into<String>,
        file_name: impl Into<String>,
        file_size_bytes: u64,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            file_name: file_name.into(),
            is_valid: true,
            file_size_bytes,
            last_modified,
            document_type: None,
            period: None,
            company: None,
            errors: None,
        }
    }

    /// A file that failed to parse or could not be read.
    pub fn invalid(
        file_path: impl Into<String>,
        file_name: impl Into<String>,
        file_size_bytes: u64,
        last_modified: DateTime<Utc>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            file_name: file_name.into(),
            is_valid: false,
            file_size_bytes,
            last_modified,
            document_type: None,
            period: None,
            company: None,
            errors: Some(vec![error.into()]),
        }
    }
}

/// Aggregate result of one directory scan.
///
/// The counts are derived from `files` at construction, so
/// `valid_count + invalid_count == files.len()` always holds. A new scan
/// replaces the record wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderRecord {
    path: String,
    files: Vec<XmlFileRecord>,
    valid_count: usize,
    invalid_count: usize,
    scanned_at: DateTime<Utc>,
}

impl FolderRecord {
    pub fn new(path: impl Into<String>, files: Vec<XmlFileRecord>, scanned_at: DateTime<Utc>) -> Self {
        let valid_count = files.iter().filter(|f| f.is_valid).count();
        let invalid_count = files.len() - valid_count;
        Self {
            path: path.into(),
            files,
            valid_count,
            invalid_count,
            scanned_at,
        }
    }

    /// Result used when the directory itself could not be read.
    pub fn empty(path: impl Into<String>, scanned_at: DateTime<Utc>) -> Self {
        Self::new(path, Vec::new(), scanned_at)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn files(&self) -> &[XmlFileRecord] {
        &self.files
    }

    pub fn valid_count(&self) -> usize {
        self.valid_count
    }

    pub fn invalid_count(&self) -> usize {
        self.invalid_count
    }

    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }

    pub fn file(&self, file_name: &str) -> Option<&XmlFileRecord> {
        self.files.iter().find(|f| f.file_name == file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_always_sum_to_file_total() {
        let now = Utc::now();
        let files = vec![
            XmlFileRecord::valid("/d/a.xml", "a.xml", 10, now),
            XmlFileRecord::invalid("/d/b.xml", "b.xml", 3, now, "XML parsing failed: eof"),
            XmlFileRecord::valid("/d/c.xml", "c.xml", 7, now),
        ];
        let record = FolderRecord::new("/d", files, now);
        assert_eq!(record.valid_count(), 2);
        assert_eq!(record.invalid_count(), 1);
        assert_eq!(record.valid_count() + record.invalid_count(), record.files().len());

        let empty = FolderRecord::empty("/missing", now);
        assert_eq!(empty.valid_count() + empty.invalid_count(), 0);
    }

    #[test]
    fn system_and_assistant_share_wire_role() {
        assert_eq!(Role::User.wire_role(), "user");
        assert_eq!(Role::Assistant.wire_role(), "assistant");
        assert_eq!(Role::System.wire_role(), "assistant");
    }

    #[test]
    fn valid_record_omits_optional_fields_on_the_wire() {
        let record = XmlFileRecord::valid("/d/a.xml", "a.xml", 10, Utc::now());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["isValid"], true);
        assert!(json.get("errors").is_none());
        assert!(json.get("documentType").is_none());
    }
}
