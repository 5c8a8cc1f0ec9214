//! crate wide error type; every store and aggregator call returns it

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// malformed input: clock strings, names, ranges, negative durations
    #[error("invalid {what}: {reason}")]
    Validation { what: &'static str, reason: String },

    /// unknown activity/category or deletion of something still referenced
    #[error("{0}")]
    Reference(String),

    /// START/PAUSE out of order for an activity
    #[error("{0}")]
    State(String),

    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("table {table} failed integrity check")]
    Integrity { table: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(what: &'static str, reason: impl Into<String>) -> Self {
        Error::Validation { what, reason: reason.into() }
    }
}

/// check if a rusqlite error is a UNIQUE/PRIMARY KEY constraint violation
pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _)
        if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
}

/// check if a rusqlite error is a FOREIGN KEY constraint violation
pub fn is_fk_violation(e: &rusqlite::Error) -> bool {
    e.to_string().contains("FOREIGN KEY constraint failed")
}
