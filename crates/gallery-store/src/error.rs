use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures surfaced by the persistence layer. Presentation (messages,
/// retries) is a caller concern; nothing here is retried internally.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage engine cannot be opened or has become unusable.
    /// Fatal to all operations until resolved.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Referenced artwork does not exist. Recoverable: re-fetch and retry.
    #[error("artwork #{0} not found")]
    NotFound(i64),

    /// The unique username index rejected an insert.
    #[error("username already taken: {0}")]
    DuplicateUsername(String),

    /// Malformed input reached the store.
    #[error("invalid input: {0}")]
    Validation(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::StorageUnavailable(e.to_string())
    }
}

impl From<gallery_hash::HashError> for StoreError {
    fn from(e: gallery_hash::HashError) -> Self {
        StoreError::StorageUnavailable(e.to_string())
    }
}
