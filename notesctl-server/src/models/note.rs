//! Note entity and its validated fields

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

use super::ValidationError;

/// Server-assigned note identifier (BIGSERIAL)
pub type NoteId = i64;

/// A persisted note.
///
/// `id` and `created_at` are assigned by the store on creation and never
/// change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// Sort key of the listing order: `(created_at, id)`, compared descending.
    pub fn sort_key(&self) -> (DateTime<Utc>, NoteId) {
        (self.created_at, self.id)
    }
}

/// Render a timestamp as RFC 3339 with as many fractional digits as needed.
///
/// This is the form clients echo back as `cursor_created_at`.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn serialize_timestamp<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_timestamp(ts))
}

/// Validated note title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteTitle(String);

impl NoteTitle {
    /// Create a new note title.
    ///
    /// # Example
    /// ```
    /// use notesctl_server::models::NoteTitle;
    ///
    /// assert!(NoteTitle::new("Groceries").is_ok());
    /// assert!(NoteTitle::new("").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated note content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteContent(String);

impl NoteContent {
    /// Create new note content. Empty content is rejected.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "content" });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
