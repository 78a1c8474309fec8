//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐         ┌─────────────────────┐                   │
//! │  │    Account      │ 1 ── N  │    Transaction      │                   │
//! │  │  ─────────────  │         │  ─────────────────  │                   │
//! │  │  id             │◄────────│  source_account_id  │                   │
//! │  │  owner_id       │◄────────│  dest_account_id    │                   │
//! │  │  balance        │         │  amount, kind       │                   │
//! │  │  minimum_balance│         │  outcome            │                   │
//! │  └────────┬────────┘         └─────────────────────┘                   │
//! │           │ N ── 1                                                      │
//! │  ┌────────▼────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   PrincipalId   │   │  AccountClass   │   │ TransactionKind │       │
//! │  │  (opaque)       │   │  Savings        │   │  Deposit        │       │
//! │  └─────────────────┘   │  Current        │   │  Withdrawal     │       │
//! │                        └─────────────────┘   │  Transfer       │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

// =============================================================================
// Principal
// =============================================================================

/// Verified identity on whose behalf an operation runs.
///
/// Supplied by the authentication collaborator and trusted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        PrincipalId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(s: &str) -> Self {
        PrincipalId(s.to_string())
    }
}

// =============================================================================
// Account Class
// =============================================================================

/// Kind of account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountClass {
    Savings,
    Current,
}

impl Default for AccountClass {
    fn default() -> Self {
        AccountClass::Savings
    }
}

impl fmt::Display for AccountClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountClass::Savings => f.write_str("SAVINGS"),
            AccountClass::Current => f.write_str("CURRENT"),
        }
    }
}

// =============================================================================
// Account
// =============================================================================

/// A ledger account.
///
/// ## Invariant
/// `balance >= minimum_balance` whenever `active` is true. The engine checks
/// this before persisting anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account number, unique and immutable.
    pub id: String,

    /// Principal that owns this account.
    pub owner_id: PrincipalId,

    /// Account holder name shown to users.
    pub display_name: String,

    /// Current balance.
    pub balance: Money,

    pub class: AccountClass,

    /// Lowest balance this account may hold while active.
    pub minimum_balance: Money,

    /// Soft-delete flag. Inactive accounts resolve as not found.
    pub active: bool,

    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Checks the minimum-balance invariant.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::{Account, AccountClass, Money, PrincipalId};
    ///
    /// let mut account = Account {
    ///     id: "ACC1".into(),
    ///     owner_id: PrincipalId::new("alice"),
    ///     display_name: "Alice".into(),
    ///     balance: Money::from_cents(5_000),
    ///     class: AccountClass::Savings,
    ///     minimum_balance: Money::from_cents(10_000),
    ///     active: true,
    ///     created_at: chrono::Utc::now(),
    /// };
    /// assert!(!account.satisfies_floor());
    /// account.active = false;
    /// assert!(account.satisfies_floor());
    /// ```
    pub fn satisfies_floor(&self) -> bool {
        !self.active || self.balance >= self.minimum_balance
    }

    /// Whether `principal` owns this account.
    #[inline]
    pub fn is_owned_by(&self, principal: &PrincipalId) -> bool {
        &self.owner_id == principal
    }
}

// =============================================================================
// Transaction Kind
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl TransactionKind {
    /// Default description recorded with each kind.
    pub fn default_description(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "Cash deposit",
            TransactionKind::Withdrawal => "Cash withdrawal",
            TransactionKind::Transfer => "Fund transfer",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Deposit => f.write_str("DEPOSIT"),
            TransactionKind::Withdrawal => f.write_str("WITHDRAWAL"),
            TransactionKind::Transfer => f.write_str("TRANSFER"),
        }
    }
}

// =============================================================================
// Transaction Outcome
// =============================================================================

/// Outcome flag of a transaction record.
///
/// Only committed records are persisted; `Failed` exists for callers that
/// build audit rows of their own from rejected requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionOutcome {
    Committed,
    Failed,
}

impl Default for TransactionOutcome {
    fn default() -> Self {
        TransactionOutcome::Committed
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// An immutable money movement record.
///
/// ## Shape by kind
/// ```text
///   kind        source   destination
///   ─────────   ──────   ───────────
///   DEPOSIT     account  none
///   WITHDRAWAL  account  none
///   TRANSFER    from     to
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Engine-generated id, never reused.
    pub id: String,
    pub source_account_id: Option<String>,
    pub destination_account_id: Option<String>,
    /// Always positive.
    pub amount: Money,
    pub kind: TransactionKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub outcome: TransactionOutcome,
}

impl Transaction {
    /// Builds a committed deposit or withdrawal record.
    pub fn single(
        id: impl Into<String>,
        kind: TransactionKind,
        account_id: &str,
        amount: Money,
    ) -> Self {
        Transaction {
            id: id.into(),
            source_account_id: Some(account_id.to_string()),
            destination_account_id: None,
            amount,
            kind,
            description: kind.default_description().to_string(),
            timestamp: Utc::now(),
            outcome: TransactionOutcome::Committed,
        }
    }

    /// Deposit record for the funds an account is opened with.
    pub fn opening(id: impl Into<String>, account_id: &str, amount: Money) -> Self {
        Transaction {
            description: "Opening deposit".to_string(),
            ..Transaction::single(id, TransactionKind::Deposit, account_id, amount)
        }
    }

    /// Builds a committed transfer record referencing both accounts.
    pub fn transfer(id: impl Into<String>, from: &str, to: &str, amount: Money) -> Self {
        Transaction {
            id: id.into(),
            source_account_id: Some(from.to_string()),
            destination_account_id: Some(to.to_string()),
            amount,
            kind: TransactionKind::Transfer,
            description: TransactionKind::Transfer.default_description().to_string(),
            timestamp: Utc::now(),
            outcome: TransactionOutcome::Committed,
        }
    }

    /// Whether the record references `account_id` on either side.
    pub fn touches(&self, account_id: &str) -> bool {
        self.source_account_id.as_deref() == Some(account_id)
            || self.destination_account_id.as_deref() == Some(account_id)
    }

    /// Checks the source/destination shape for the record's kind.
    pub fn is_well_formed(&self) -> bool {
        if !self.amount.is_positive() {
            return false;
        }
        match self.kind {
            TransactionKind::Transfer => {
                self.source_account_id.is_some() && self.destination_account_id.is_some()
            }
            TransactionKind::Deposit | TransactionKind::Withdrawal => {
                self.source_account_id.is_some() && self.destination_account_id.is_none()
            }
        }
    }
}

// =============================================================================
// Open Account Request
// =============================================================================

/// Request to open a new account for the acting principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAccount {
    pub display_name: String,
    #[serde(default)]
    pub class: AccountClass,
    pub initial_deposit: Money,
    /// Floor for the new account; the engine's default when absent.
    #[serde(default)]
    pub minimum_balance: Option<Money>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn account(balance: i64, minimum: i64) -> Account {
        Account {
            id: "ACC1".to_string(),
            owner_id: PrincipalId::new("alice"),
            display_name: "Alice".to_string(),
            balance: Money::from_cents(balance),
            class: AccountClass::Savings,
            minimum_balance: Money::from_cents(minimum),
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_floor_only_binds_active_accounts() {
        let mut acc = account(5_000, 10_000);
        assert!(!acc.satisfies_floor());
        acc.active = false;
        assert!(acc.satisfies_floor());
    }

    #[test]
    fn test_transaction_shapes() {
        let dep = Transaction::single("T1", TransactionKind::Deposit, "ACC1", Money::from_cents(100));
        assert!(dep.is_well_formed());
        assert!(dep.touches("ACC1"));
        assert_eq!(dep.description, "Cash deposit");

        let xfer = Transaction::transfer("T2", "ACC1", "ACC2", Money::from_cents(100));
        assert!(xfer.is_well_formed());
        assert!(xfer.touches("ACC2"));
        assert!(!xfer.touches("ACC3"));

        let mut bad = xfer.clone();
        bad.destination_account_id = None;
        assert!(!bad.is_well_formed());
    }

    #[test]
    fn test_enum_serialization() {
        assert_eq!(
            serde_json::to_string(&AccountClass::Current).unwrap(),
            "\"CURRENT\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionKind::Withdrawal).unwrap(),
            "\"WITHDRAWAL\""
        );
        assert_eq!(AccountClass::default(), AccountClass::Savings);
    }
}
