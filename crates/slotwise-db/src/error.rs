//! Database-specific error types and conversions.

use slotwise_core::error::SlotwiseError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Stored record is malformed: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl DbError {
    pub(crate) fn decode(what: &str, err: impl std::fmt::Display) -> Self {
        DbError::Decode(format!("invalid {what}: {err}"))
    }
}

impl From<DbError> for SlotwiseError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SlotwiseError::NotFound { entity, id },
            DbError::Decode(msg) => SlotwiseError::Internal(msg),
            other => SlotwiseError::Unavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_preserved() {
        let err: SlotwiseError = DbError::NotFound {
            entity: "tenant".into(),
            id: "x".into(),
        }
        .into();
        assert!(matches!(err, SlotwiseError::NotFound { .. }));
    }

    #[test]
    fn query_failures_are_retryable() {
        let err: SlotwiseError = DbError::Query("connection reset".into()).into();
        assert!(err.is_retryable());
    }
}
