//! Note repository
//!
//! Handles note CRUD and listing:
//! - create: one READ COMMITTED transaction, note row + audit row
//! - get/update/delete: statements prepared once at startup
//! - list: full-text search, keyset continuation or first page
//! - batch_get: single `= ANY($1)` query (no N+1)

use async_trait::async_trait;
use sqlx::{Executor, PgPool};
use tracing::instrument;

use super::scanner::{scan_note, scan_notes};
use crate::db::DbError;
use crate::models::{ListParams, ListStrategy, Note, NoteContent, NoteId, NoteTitle};
use crate::store::NoteStore;

const INSERT_NOTE: &str = r#"
    INSERT INTO notes (title, content) VALUES ($1, $2)
    RETURNING id, title, content, created_at
"#;

const INSERT_AUDIT: &str = "INSERT INTO notes_audit (note_id, action) VALUES ($1, $2)";

const AUDIT_CREATE: &str = "create";

const SEARCH_NOTES: &str = r#"
    SELECT id, title, content, created_at
    FROM notes
    WHERE to_tsvector('simple', title) @@ plainto_tsquery('simple', $1)
    ORDER BY created_at DESC, id DESC
    LIMIT $2
"#;

const LIST_AFTER: &str = r#"
    SELECT id, title, content, created_at
    FROM notes
    WHERE (created_at, id) < ($1, $2)
    ORDER BY created_at DESC, id DESC
    LIMIT $3
"#;

const LIST_FIRST_PAGE: &str = r#"
    SELECT id, title, content, created_at
    FROM notes
    ORDER BY created_at DESC, id DESC
    LIMIT $1
"#;

const BATCH_GET: &str = r#"
    SELECT id, title, content, created_at
    FROM notes
    WHERE id = ANY($1)
    ORDER BY created_at DESC, id DESC
"#;

const GET_NOTE: &str = r#"
    SELECT id, title, content, created_at
    FROM notes
    WHERE id = $1
"#;

const UPDATE_NOTE: &str = r#"
    UPDATE notes
    SET title = $1, content = $2
    WHERE id = $3
    RETURNING id, title, content, created_at
"#;

const DELETE_NOTE: &str = "DELETE FROM notes WHERE id = $1";

/// Point statements used by get, update and delete.
///
/// `prepare` validates them against the database at boot, so a schema
/// mismatch fails startup instead of the first request. Reuse afterwards
/// comes from sqlx's per-connection statement cache: each pooled connection
/// prepares a statement the first time it runs it.
#[derive(Debug, Clone)]
pub struct PreparedStatements {
    pub get: &'static str,
    pub update: &'static str,
    pub delete: &'static str,
}

impl PreparedStatements {
    const fn new() -> Self {
        Self {
            get: GET_NOTE,
            update: UPDATE_NOTE,
            delete: DELETE_NOTE,
        }
    }

    /// Check every statement on one pooled connection.
    pub async fn prepare(pool: &PgPool) -> Result<Self, DbError> {
        let statements = Self::new();
        let mut conn = pool.acquire().await?;

        for sql in [statements.get, statements.update, statements.delete] {
            (&mut *conn).prepare(sql).await?;
        }

        tracing::debug!("note statements validated");
        Ok(statements)
    }
}

/// Note repository
#[derive(Debug, Clone)]
pub struct NoteRepo {
    pool: PgPool,
    statements: PreparedStatements,
}

impl NoteRepo {
    /// Build the repository, preparing its point statements.
    pub async fn new(pool: PgPool) -> Result<Self, DbError> {
        let statements = PreparedStatements::prepare(&pool).await?;
        Ok(Self { pool, statements })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl NoteStore for NoteRepo {
    #[instrument(level = "debug", skip_all)]
    async fn create(&self, title: &NoteTitle, content: &NoteContent) -> Result<Note, DbError> {
        // Dropping `tx` without commit rolls back both inserts
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL READ COMMITTED")
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(INSERT_NOTE)
            .bind(title.as_str())
            .bind(content.as_str())
            .fetch_one(&mut *tx)
            .await?;
        let note = scan_note(&row)?;

        sqlx::query(INSERT_AUDIT)
            .bind(note.id)
            .bind(AUDIT_CREATE)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(note_id = note.id, "note created");
        Ok(note)
    }

    #[instrument(level = "debug", skip(self), fields(note_id = id))]
    async fn get(&self, id: NoteId) -> Result<Note, DbError> {
        let row = sqlx::query(self.statements.get)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::note_not_found(id))?;

        scan_note(&row)
    }

    #[instrument(level = "debug", skip(self, title, content), fields(note_id = id))]
    async fn update(
        &self,
        id: NoteId,
        title: &NoteTitle,
        content: &NoteContent,
    ) -> Result<Note, DbError> {
        let row = sqlx::query(self.statements.update)
            .bind(title.as_str())
            .bind(content.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::note_not_found(id))?;

        scan_note(&row)
    }

    #[instrument(level = "debug", skip(self), fields(note_id = id))]
    async fn delete(&self, id: NoteId) -> Result<(), DbError> {
        let result = sqlx::query(self.statements.delete)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::note_not_found(id));
        }
        Ok(())
    }

    #[instrument(level = "debug", skip_all, fields(limit = params.limit))]
    async fn list(&self, params: &ListParams) -> Result<Vec<Note>, DbError> {
        let strategy = ListStrategy::select(params);
        tracing::debug!(?strategy, "list strategy selected");

        let rows = match strategy {
            ListStrategy::Search { query, limit } => {
                sqlx::query(SEARCH_NOTES)
                    .bind(query)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            ListStrategy::After { cursor, limit } => {
                sqlx::query(LIST_AFTER)
                    .bind(cursor.created_at)
                    .bind(cursor.id)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            ListStrategy::FirstPage { limit } => {
                sqlx::query(LIST_FIRST_PAGE)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        scan_notes(&rows)
    }

    #[instrument(level = "debug", skip_all, fields(count = ids.len()))]
    async fn batch_get(&self, ids: &[NoteId]) -> Result<Vec<Note>, DbError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(BATCH_GET)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        scan_notes(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use sqlx::postgres::PgPoolOptions;
    use tracing::span::{Attributes, Id};
    use tracing::Subscriber;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Records the name of every span opened while installed.
    #[derive(Clone, Default)]
    struct SpanNames(Arc<Mutex<Vec<&'static str>>>);

    impl<S: Subscriber> Layer<S> for SpanNames {
        fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
            self.0.lock().unwrap().push(attrs.metadata().name());
        }
    }

    /// Repository over a pool that never reaches a server.
    fn unreachable_repo() -> NoteRepo {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(200))
            .connect_lazy("postgres://notes@127.0.0.1:1/notes")
            .unwrap();
        NoteRepo {
            pool,
            statements: PreparedStatements::new(),
        }
    }

    #[tokio::test]
    async fn repository_calls_open_spans() {
        let names = SpanNames::default();
        let _guard =
            tracing::subscriber::set_default(tracing_subscriber::registry().with(names.clone()));
        let repo = unreachable_repo();

        assert!(repo.batch_get(&[]).await.unwrap().is_empty());

        let err = repo.get(7).await.unwrap_err();
        assert!(matches!(err, DbError::Sqlx(_)));
        assert!(!err.is_not_found());

        let recorded = names.0.lock().unwrap().clone();
        assert!(recorded.contains(&"batch_get"), "spans: {recorded:?}");
        assert!(recorded.contains(&"get"), "spans: {recorded:?}");
    }
}
