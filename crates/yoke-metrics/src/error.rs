use rusqlite::ErrorCode;
use thiserror::Error;
use yoke_core::YokeError;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Another writer holds the database; safe to retry.
    #[error("STORE/CONFLICT: {0}")]
    Conflict(String),

    #[error("STORE/UNKNOWN_SESSION: {0}")]
    UnknownSession(String),

    #[error("STORE/DB: {0}")]
    Database(rusqlite::Error),

    /// A stored `created_at` that is not RFC 3339
    #[error("STORE/TIMESTAMP: session {session_id}: {source}")]
    InvalidTimestamp {
        session_id: String,
        source: chrono::ParseError,
    },

    #[error("STORE/JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("STORE/POISONED: connection lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
            {
                StoreError::Conflict(err.to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

impl From<StoreError> for YokeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => YokeError::StorageConflict(msg),
            other => YokeError::Io(std::io::Error::other(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_maps_to_conflict() {
        let busy = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some("database is locked".to_string()),
        );
        let err = StoreError::from(busy);
        assert!(err.is_conflict());
        assert!(YokeError::from(err).is_retryable());

        let other = StoreError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(!other.is_conflict());
    }
}
