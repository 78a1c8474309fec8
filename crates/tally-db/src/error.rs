//! # Ledger Store Errors
//!
//! `DbError` is what the repositories return. It never reaches the engine
//! directly: the [`LedgerStore`](tally_core::LedgerStore) implementation
//! narrows it to a [`StoreError`] first.
//!
//! ```text
//! sqlx::Error ──► DbError ──► StoreError ──► LedgerError
//!  (driver)      (this file)   (trait)        (engine result)
//! ```

use sqlx::error::ErrorKind as SqlErrorKind;
use tally_core::StoreError;
use thiserror::Error;

/// Failures of the SQLite ledger store.
#[derive(Debug, Error)]
pub enum DbError {
    /// No row for the key, or an UPDATE that matched nothing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A primary key was reused.
    ///
    /// `field` is SQLite's `table.column`; `value` is filled in by the
    /// repository that knows which key it was writing.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A transaction row pointed at a missing account.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A CHECK constraint (positive amounts, non-negative floors, known
    /// kinds) rejected the row.
    #[error("Check constraint failed: {message}")]
    CheckViolation { message: String },

    /// Compare-and-swap on a balance found a different stored value.
    #[error("Balance of {account_id} changed concurrently")]
    Conflict { account_id: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Names the key of a `UniqueViolation`; other variants pass through.
    pub fn with_value(self, value: impl Into<String>) -> Self {
        match self {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: value.into(),
            },
            other => other,
        }
    }
}

/// `"UNIQUE constraint failed: accounts.id"` → `"accounts.id"`
fn constrained_column(message: &str) -> String {
    message
        .rsplit_once(": ")
        .map(|(_, column)| column.trim().to_string())
        .unwrap_or_else(|| message.to_string())
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "<unspecified>"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    SqlErrorKind::UniqueViolation => DbError::UniqueViolation {
                        field: constrained_column(&message),
                        value: String::new(),
                    },
                    SqlErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    SqlErrorKind::CheckViolation | SqlErrorKind::NotNullViolation => {
                        DbError::CheckViolation { message }
                    }
                    // Primary result codes only carry the text
                    _ if message.starts_with("UNIQUE constraint failed") => {
                        DbError::UniqueViolation {
                            field: constrained_column(&message),
                            value: String::new(),
                        }
                    }
                    _ if message.starts_with("FOREIGN KEY constraint failed") => {
                        DbError::ForeignKeyViolation { message }
                    }
                    _ => DbError::QueryFailed(message),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),
            sqlx::Error::Io(io) => DbError::ConnectionFailed(io.to_string()),

            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Narrows to the store contract.
///
/// | DbError               | StoreError                                   |
/// |-----------------------|----------------------------------------------|
/// | `NotFound`            | `NotFound`                                   |
/// | `UniqueViolation`     | `Duplicate` (`Transaction` or `Account`, by table) |
/// | `ForeignKeyViolation` | `NotFound { entity: "Account" }`             |
/// | `Conflict`            | `Conflict`                                   |
/// | anything else         | `Unavailable`                                |
impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => StoreError::NotFound { entity, id },
            DbError::UniqueViolation { field, value } => StoreError::Duplicate {
                entity: if field.starts_with("transactions.") {
                    "Transaction"
                } else {
                    "Account"
                },
                id: value,
            },
            DbError::ForeignKeyViolation { message } => StoreError::NotFound {
                entity: "Account",
                id: message,
            },
            DbError::Conflict { account_id } => StoreError::Conflict { account_id },
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constrained_column() {
        assert_eq!(
            constrained_column("UNIQUE constraint failed: transactions.id"),
            "transactions.id"
        );
        assert_eq!(constrained_column("odd message"), "odd message");
    }

    #[test]
    fn test_store_error_mapping() {
        let err: StoreError = DbError::duplicate("transactions.id", "TXN1").into();
        assert_eq!(
            err,
            StoreError::Duplicate {
                entity: "Transaction",
                id: "TXN1".to_string()
            }
        );

        let err: StoreError = DbError::duplicate("accounts.id", "ACC1").into();
        assert!(matches!(err, StoreError::Duplicate { entity: "Account", .. }));

        let err: StoreError = DbError::CheckViolation {
            message: "CHECK constraint failed: amount_cents > 0".to_string(),
        }
        .into();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
