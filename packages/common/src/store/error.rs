use uuid::Uuid;

/// Errors that can occur during record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No generation with this id exists.
    #[error("generation not found: {0}")]
    NotFound(Uuid),

    /// The write would break a uniqueness constraint (e.g. a provider job id
    /// already owned by another generation).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing database failed or returned something unreadable.
    #[error("database error: {0}")]
    Database(String),
}

#[cfg(feature = "sea-orm")]
impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        StoreError::Database(err.to_string())
    }
}
