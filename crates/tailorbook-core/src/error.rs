// Errors raised by store operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Input rejected before touching the database.
    #[error("{0}")]
    Validation(String),

    /// A customer with the same name already exists.
    #[error("a customer named `{name}` is already registered")]
    Duplicate { name: String },

    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// True when the underlying SQLite error is a UNIQUE constraint violation.
    pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
