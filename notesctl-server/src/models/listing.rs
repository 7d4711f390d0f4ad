//! Listing parameters and strategy selection
//!
//! Notes are always listed newest first by `(created_at, id)`. A page is
//! continued by carrying the last item's sort key forward (keyset
//! pagination) rather than an offset.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::note::{format_timestamp, Note, NoteId};

/// Default items per page
pub const DEFAULT_LIMIT: i64 = 20;

/// Maximum items per page (inclusive)
pub const MAX_LIMIT: i64 = 200;

/// Normalize a requested page size.
///
/// Values in `1..=200` are kept; anything else falls back to 20.
pub fn clamp_limit(limit: i64) -> i64 {
    if limit <= 0 || limit > MAX_LIMIT {
        DEFAULT_LIMIT
    } else {
        limit
    }
}

/// Position in the listing order, taken from a previously returned note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: NoteId,
}

impl Cursor {
    pub fn new(created_at: DateTime<Utc>, id: NoteId) -> Self {
        Self { created_at, id }
    }

    /// Cursor pointing just past `note`.
    pub fn after(note: &Note) -> Self {
        Self::new(note.created_at, note.id)
    }

    /// True when `note` sorts strictly after this cursor in the listing
    /// order, i.e. `(created_at, id) < (cursor.created_at, cursor.id)`.
    pub fn admits(&self, note: &Note) -> bool {
        note.sort_key() < (self.created_at, self.id)
    }
}

/// Parameters of a list call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    /// Requested page size; normalized by [`clamp_limit`]
    pub limit: i64,
    pub cursor_created_at: Option<DateTime<Utc>>,
    pub cursor_id: Option<NoteId>,
    /// Free-text query over titles
    pub query: Option<String>,
}

impl ListParams {
    pub fn new(limit: i64) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Continue after `cursor`.
    pub fn after(mut self, cursor: Cursor) -> Self {
        self.cursor_created_at = Some(cursor.created_at);
        self.cursor_id = Some(cursor.id);
        self
    }

    /// Filter titles by a free-text query.
    pub fn matching(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            cursor_created_at: None,
            cursor_id: None,
            query: None,
        }
    }
}

/// The single query shape a list call resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStrategy<'a> {
    /// Full-text match on titles. Any cursor is dropped.
    Search { query: &'a str, limit: i64 },
    /// Rows strictly after the cursor.
    After { cursor: Cursor, limit: i64 },
    /// Unscoped first page.
    FirstPage { limit: i64 },
}

impl<'a> ListStrategy<'a> {
    /// Pick the strategy for `params`.
    ///
    /// Priority: non-empty query, then a complete cursor pair, then the
    /// first page. A cursor missing either half counts as no cursor.
    pub fn select(params: &'a ListParams) -> Self {
        let limit = clamp_limit(params.limit);

        if let Some(query) = params.query.as_deref().filter(|q| !q.is_empty()) {
            return Self::Search { query, limit };
        }

        match (params.cursor_created_at, params.cursor_id) {
            (Some(created_at), Some(id)) => Self::After {
                cursor: Cursor::new(created_at, id),
                limit,
            },
            _ => Self::FirstPage { limit },
        }
    }

    pub fn limit(&self) -> i64 {
        match self {
            Self::Search { limit, .. } | Self::After { limit, .. } | Self::FirstPage { limit } => {
                *limit
            }
        }
    }
}

/// One page of a listing with the cursor for the next call.
#[derive(Debug, Clone, Serialize)]
pub struct NotePage {
    pub items: Vec<Note>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor_created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor_id: Option<NoteId>,
}

impl NotePage {
    /// Build a page; the next cursor comes from the last item, if any.
    pub fn new(items: Vec<Note>) -> Self {
        let next = items.last().map(Cursor::after);
        Self {
            next_cursor_created_at: next.map(|c| format_timestamp(&c.created_at)),
            next_cursor_id: next.map(|c| c.id),
            items,
        }
    }

    pub fn next_cursor(&self) -> Option<Cursor> {
        self.items.last().map(Cursor::after)
    }
}
