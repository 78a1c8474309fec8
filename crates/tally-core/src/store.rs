//! # Ledger Store Interface
//!
//! The persistence contract the ledger consumes.
//!
//! ## Who Implements It
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   tally-engine ──uses──► dyn LedgerStore ◄──implements── tally-db       │
//! │                                 ▲                        (SQLite)       │
//! │                                 │                                       │
//! │                                 └──implements── tally-engine::memory    │
//! │                                                 (tests, embedding)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomicity
//! Single-entity operations are atomic per key. `commit` is the one
//! multi-key write: every balance update and the transaction append land
//! together or not at all. The engine persists all money movements through
//! `commit`, so a failure half-way through a transfer cannot leave one
//! account debited and the other not credited.

use async_trait::async_trait;
use thiserror::Error;

use crate::money::Money;
use crate::types::{Account, PrincipalId, Transaction};

// =============================================================================
// Store Error
// =============================================================================

/// Failure reported by a ledger store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Entity with this key already exists.
    #[error("{entity} already exists: {id}")]
    Duplicate { entity: &'static str, id: String },

    /// Compare-and-swap on a balance failed: the stored balance is no longer
    /// the one the caller read.
    #[error("Balance of {account_id} changed concurrently")]
    Conflict { account_id: String },

    /// Store unreachable or rejected the statement.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Balance Update
// =============================================================================

/// One balance change inside an atomic commit.
///
/// `expected` is the balance the caller read; the store refuses the whole
/// commit with [`StoreError::Conflict`] if the stored value differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceUpdate<'a> {
    pub account_id: &'a str,
    pub expected: Money,
    pub new_balance: Money,
}

impl<'a> BalanceUpdate<'a> {
    pub fn new(account_id: &'a str, expected: Money, new_balance: Money) -> Self {
        BalanceUpdate {
            account_id,
            expected,
            new_balance,
        }
    }
}

// =============================================================================
// Ledger Store Trait
// =============================================================================

/// Durable keyed storage for accounts and transactions.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Fetches an account by id, active or not.
    async fn get_account(&self, id: &str) -> StoreResult<Option<Account>>;

    /// Inserts a new account. `Duplicate` if the id is taken.
    async fn put_account(&self, account: &Account) -> StoreResult<()>;

    /// Inserts a new account together with its opening deposit record, if
    /// any, atomically. `Duplicate` names whichever key was taken.
    async fn open_account(&self, account: &Account, opening: Option<&Transaction>)
        -> StoreResult<()>;

    /// Overwrites one balance. `NotFound` if the account does not exist.
    async fn update_balance(&self, id: &str, new_balance: Money) -> StoreResult<()>;

    /// Active accounts owned by `owner`, ordered by creation time.
    async fn list_accounts_by_owner(&self, owner: &PrincipalId) -> StoreResult<Vec<Account>>;

    /// Appends a transaction record. `Duplicate` if the id was used before.
    async fn append_transaction(&self, tx: &Transaction) -> StoreResult<()>;

    /// Transactions where the account is source or destination, newest first.
    async fn list_transactions_by_account(&self, account_id: &str)
        -> StoreResult<Vec<Transaction>>;

    /// Applies every balance update and appends `tx` atomically.
    async fn commit(&self, updates: &[BalanceUpdate<'_>], tx: &Transaction) -> StoreResult<()>;
}
