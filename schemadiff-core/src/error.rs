//! Error types for schema diff operations.

use thiserror::Error;

/// Extract the full error message from a tokio_postgres::Error,
/// including the underlying DbError details that Display hides.
pub fn format_db_error(e: &tokio_postgres::Error) -> String {
    if let Some(db_err) = e.as_db_error() {
        let mut msg = db_err.message().to_string();
        if let Some(detail) = db_err.detail() {
            msg.push_str(&format!("\n  Detail: {}", detail));
        }
        if let Some(hint) = db_err.hint() {
            msg.push_str(&format!("\n  Hint: {}", hint));
        }
        return msg;
    }
    // Fallback: walk the source chain
    let mut msg = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(s) = source {
        msg.push_str(&format!(": {}", s));
        source = s.source();
    }
    msg
}

/// All error types that schema diff operations can produce.
///
/// No error is recovered internally: the whole diff fails atomically and no
/// partial script is ever returned.
#[derive(Error, Debug)]
pub enum SchemaDiffError {
    /// Could not open the source or target database.
    #[error("Connection to {descriptor} failed: {reason}")]
    ConnectionFailed { descriptor: String, reason: String },

    /// A PostgreSQL catalog query or connection operation failed.
    #[error("Database error: {}", format_db_error(.0))]
    DatabaseError(#[from] tokio_postgres::Error),

    /// A SQLite catalog query or connection operation failed.
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// The diff produced a state that contradicts the introspected models.
    /// Indicates a bug, not a user error.
    #[error("Internal consistency error: {0}")]
    Internal(String),

    /// Formatting the migration script failed.
    #[error("Failed to form the migration script: {0}")]
    Emission(#[from] std::fmt::Error),

    /// The cancellation handle fired before the diff completed.
    #[error("Diff cancelled before completion")]
    Cancelled,

    /// An unknown value was passed for the driver selection.
    #[error("Unsupported driver: {0}. Supported drivers: sqlite3")]
    UnsupportedDriver(String),
}

/// Convenience type alias for `Result<T, SchemaDiffError>`.
pub type Result<T> = std::result::Result<T, SchemaDiffError>;
