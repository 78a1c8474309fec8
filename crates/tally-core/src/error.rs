//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── LedgerError      - Tagged result of every engine operation        │
//! │  ├── ValidationError  - Input field validation failures                │
//! │  └── StoreError       - What a LedgerStore reports (see store.rs)       │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - SQLite failures, converted into StoreError     │
//! │                                                                         │
//! │  Flow: DbError → StoreError → LedgerError → caller renders message     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Carry structured context (account id, amounts) so callers never re-derive it
//! 3. Errors are enum variants, never String
//! 4. `LedgerError::kind()` gives tests and callers a `Copy` tag to branch on

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;
use crate::store::StoreError;

// =============================================================================
// Amount Issue
// =============================================================================

/// Why an amount was rejected by the amount policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum AmountIssue {
    /// Zero or negative where a positive amount is required.
    #[error("amount must be positive")]
    NotPositive,

    /// More precision than the minor unit (0.01).
    #[error("amount must be a multiple of 0.01")]
    NotQuantized,

    /// Not a decimal number at all.
    #[error("amount is not a decimal number")]
    Malformed,

    /// Amount or resulting balance does not fit the representation.
    #[error("amount is out of range")]
    Overflow,
}

// =============================================================================
// Ledger Error
// =============================================================================

/// Failure of a directory or engine operation.
///
/// Every variant carries enough context to render a precise message without
/// the presentation layer looking anything up again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Non-positive, non-quantized or overflowing amount.
    ///
    /// Always caller-recoverable: re-prompt for the amount.
    #[error("Invalid amount {amount}: {reason}")]
    InvalidAmount { amount: Money, reason: AmountIssue },

    /// Unknown or deactivated account.
    #[error("Account not found: {account_id}")]
    AccountNotFound { account_id: String },

    /// The acting principal does not own the account.
    ///
    /// ## Note
    /// The real owner is deliberately absent. The engine writes the owner
    /// into its audit log line; the caller only learns "access denied".
    #[error("Access denied to account {account_id}")]
    AccessDenied { account_id: String },

    /// Withdrawal or transfer would breach the minimum-balance floor.
    ///
    /// ## User Workflow
    /// ```text
    /// withdraw(A, 0.01)   balance=100.00 floor=100.00
    ///      │
    ///      ▼
    /// InsufficientFunds { balance: 100.00, requested: 0.01, minimum: 100.00 }
    ///      │
    ///      ▼
    /// UI shows: "Only $0.00 available above the $100.00 minimum"
    /// ```
    #[error(
        "Insufficient funds in {account_id}: balance {balance}, requested {requested}, minimum {minimum}"
    )]
    InsufficientFunds {
        account_id: String,
        balance: Money,
        requested: Money,
        minimum: Money,
    },

    /// Transaction id collided twice in a row.
    #[error("Duplicate transaction id: {transaction_id}")]
    DuplicateTransactionId { transaction_id: String },

    /// The ledger store rejected a read or write.
    ///
    /// Fatal for the single operation; the cache is left untouched.
    #[error("Persistence failure during {operation}: {source}")]
    PersistFailure {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    /// Account id already taken, in cache or store.
    #[error("Account already exists: {account_id}")]
    AccountAlreadyExists { account_id: String },

    /// Source and destination of a transfer are the same account.
    #[error("Cannot transfer from account {account_id} to itself")]
    SelfTransfer { account_id: String },

    /// Field-level input validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Machine-readable tag of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidAmount,
    AccountNotFound,
    AccessDenied,
    InsufficientFunds,
    DuplicateTransactionId,
    PersistFailure,
    AccountAlreadyExists,
    SelfTransfer,
    Validation,
}

impl LedgerError {
    /// Returns the tag of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            LedgerError::AccountNotFound { .. } => ErrorKind::AccountNotFound,
            LedgerError::AccessDenied { .. } => ErrorKind::AccessDenied,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::DuplicateTransactionId { .. } => ErrorKind::DuplicateTransactionId,
            LedgerError::PersistFailure { .. } => ErrorKind::PersistFailure,
            LedgerError::AccountAlreadyExists { .. } => ErrorKind::AccountAlreadyExists,
            LedgerError::SelfTransfer { .. } => ErrorKind::SelfTransfer,
            LedgerError::Validation(_) => ErrorKind::Validation,
        }
    }

    /// Whether retrying the same request later may succeed.
    ///
    /// Only store failures and id collisions are transient; everything else
    /// needs different input.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::PersistFailure | ErrorKind::DuplicateTransactionId
        )
    }

    /// Creates an AccountNotFound error.
    pub fn not_found(account_id: impl Into<String>) -> Self {
        LedgerError::AccountNotFound {
            account_id: account_id.into(),
        }
    }

    /// Creates an InvalidAmount error.
    pub fn invalid_amount(amount: Money, reason: AmountIssue) -> Self {
        LedgerError::InvalidAmount { amount, reason }
    }

    /// Wraps a store failure with the operation it interrupted.
    pub fn persist(operation: &'static str, source: StoreError) -> Self {
        LedgerError::PersistFailure { operation, source }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation of identifiers and names before any store
/// access happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with LedgerError.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = LedgerError::InsufficientFunds {
            account_id: "ACC1".to_string(),
            balance: Money::from_cents(10_000),
            requested: Money::from_cents(1),
            minimum: Money::from_cents(10_000),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds in ACC1: balance $100.00, requested $0.01, minimum $100.00"
        );

        let err = LedgerError::invalid_amount(Money::zero(), AmountIssue::NotPositive);
        assert_eq!(err.to_string(), "Invalid amount $0.00: amount must be positive");
    }

    #[test]
    fn test_access_denied_does_not_mention_owner() {
        let err = LedgerError::AccessDenied {
            account_id: "ACC1".to_string(),
        };
        assert_eq!(err.to_string(), "Access denied to account ACC1");
    }

    #[test]
    fn test_kind_and_transience() {
        let err = LedgerError::persist("deposit", StoreError::Unavailable("disk full".into()));
        assert_eq!(err.kind(), ErrorKind::PersistFailure);
        assert!(err.is_transient());

        let err = LedgerError::not_found("ACC9");
        assert_eq!(err.kind(), ErrorKind::AccountNotFound);
        assert!(!err.is_transient());
    }

    #[test]
    fn test_validation_converts_to_ledger_error() {
        let validation_err = ValidationError::Required {
            field: "display_name".to_string(),
        };
        let err: LedgerError = validation_err.into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
