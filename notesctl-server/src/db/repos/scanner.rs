//! Row mapping shared by every read path

use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::db::DbError;
use crate::models::Note;

/// Map one row to a note.
///
/// A missing or mistyped column is a storage error; rows are never skipped.
pub fn scan_note(row: &PgRow) -> Result<Note, DbError> {
    Ok(Note {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Map a result set, preserving row order.
pub fn scan_notes(rows: &[PgRow]) -> Result<Vec<Note>, DbError> {
    rows.iter().map(scan_note).collect()
}
