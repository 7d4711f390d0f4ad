//! Storage error type

use std::time::Duration;

/// Database error type
///
/// Callers only need to tell `NotFound` apart; every other variant is a
/// storage fault passed through unchanged.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("operation exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

impl DbError {
    pub fn note_not_found(id: i64) -> Self {
        Self::NotFound {
            resource: "note",
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = DbError::note_not_found(42);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: note '42'");
    }

    #[test]
    fn sqlx_errors_are_not_not_found() {
        let err = DbError::from(sqlx::Error::RowNotFound);
        assert!(!err.is_not_found());
    }
}
