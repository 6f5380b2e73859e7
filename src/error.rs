use thiserror::Error;

/// Persistence-layer failures. Constraint violations on case creation are
/// absorbed by the insert-or-ignore path and never surface here.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("email {0} not found")]
    EmailNotFound(i64),
}

/// Per-email processing failures. These end up in the batch error list;
/// they never abort a batch.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("invalid email record {0}: missing {1}")]
    InvalidEmail(i64, String),

    #[error("email {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}
