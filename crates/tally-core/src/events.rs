//! # Ledger Events
//!
//! Post-commit events handed to the notification collaborator.
//!
//! Events are produced only after the store confirmed the write. Their
//! delivery is independent of the operation's result: a lost event never
//! turns a committed deposit into a failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::Breach;
use crate::money::Money;
use crate::types::{Account, Transaction};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    AccountOpened,
    Deposit,
    Withdrawal,
    TransferOut,
    TransferIn,
    ThresholdBreach { breach: Breach },
}

/// A notification-ready fact about one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    #[serde(flatten)]
    pub kind: EventKind,
    pub account_id: String,
    pub amount: Money,
    pub balance_after: Money,
    pub transaction_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl LedgerEvent {
    /// Event for `account` (already carrying its new balance) caused by `tx`.
    pub fn for_transaction(kind: EventKind, account: &Account, tx: &Transaction) -> Self {
        LedgerEvent {
            kind,
            account_id: account.id.clone(),
            amount: tx.amount,
            balance_after: account.balance,
            transaction_id: Some(tx.id.clone()),
            timestamp: tx.timestamp,
        }
    }

    /// Event for a freshly opened account.
    pub fn opened(account: &Account) -> Self {
        LedgerEvent {
            kind: EventKind::AccountOpened,
            account_id: account.id.clone(),
            amount: account.balance,
            balance_after: account.balance,
            transaction_id: None,
            timestamp: account.created_at,
        }
    }

    /// Same account and transaction, different kind.
    pub fn with_kind(&self, kind: EventKind) -> Self {
        LedgerEvent {
            kind,
            ..self.clone()
        }
    }
}
