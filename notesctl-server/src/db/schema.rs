//! Idempotent bootstrap of the notes tables

use sqlx::PgPool;

use super::DbError;

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS notes (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS notes_title_fts_idx
        ON notes USING GIN (to_tsvector('simple', title))
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS notes_created_at_id_idx
        ON notes (created_at DESC, id DESC)
    "#,
    // Append-only; no foreign key so audit rows outlive deleted notes
    r#"
    CREATE TABLE IF NOT EXISTS notes_audit (
        id BIGSERIAL PRIMARY KEY,
        note_id BIGINT NOT NULL,
        action TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

/// Create the notes tables and indexes if they are missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Ensuring notes schema");

    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}
