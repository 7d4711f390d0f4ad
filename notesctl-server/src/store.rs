//! Store abstraction consumed by the HTTP layer
//!
//! Provides a trait over note persistence, with:
//! - PostgreSQL implementation (`db::NoteRepo`)
//! - In-memory implementation for tests and local runs (`db::MemoryNoteStore`)
//! - Deadline enforcement

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::db::DbError;
use crate::models::{ListParams, Note, NoteContent, NoteId, NoteTitle};

/// Note persistence operations.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Persist a new note and its `create` audit entry atomically.
    async fn create(&self, title: &NoteTitle, content: &NoteContent) -> Result<Note, DbError>;

    async fn get(&self, id: NoteId) -> Result<Note, DbError>;

    /// Replace title and content; `id` and `created_at` are kept.
    async fn update(
        &self,
        id: NoteId,
        title: &NoteTitle,
        content: &NoteContent,
    ) -> Result<Note, DbError>;

    async fn delete(&self, id: NoteId) -> Result<(), DbError>;

    /// One page, newest first by `(created_at, id)`.
    async fn list(&self, params: &ListParams) -> Result<Vec<Note>, DbError>;

    /// All notes whose id is in `ids`, newest first. Unknown ids are skipped.
    async fn batch_get(&self, ids: &[NoteId]) -> Result<Vec<Note>, DbError>;
}

/// Run a store operation bounded by `deadline`.
///
/// On expiry the operation future is dropped, which abandons the in-flight
/// statement; an open transaction is rolled back when its connection goes
/// back to the pool.
pub async fn with_deadline<T, F>(deadline: Duration, op: F) -> Result<T, DbError>
where
    F: Future<Output = Result<T, DbError>>,
{
    match tokio::time::timeout(deadline, op).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(?deadline, "store operation timed out");
            Err(DbError::DeadlineExceeded(deadline))
        }
    }
}
