//! # Alert Policy
//!
//! Thresholds that turn a committed operation into notification events.
//!
//! ## Rules (defaults)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Rule               Trigger                          Applies to         │
//! │  ─────────────────  ───────────────────────────────  ────────────────── │
//! │  CriticalBalance    balance_after < 100.00           debited account    │
//! │  LowBalance         balance_after < 500.00           debited account    │
//! │  HighValue          amount >= 5000.00                every operation    │
//! │  LargeWithdrawal    amount > 80% of balance_before   withdrawals        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! CriticalBalance and LowBalance are exclusive: an account below the
//! critical line reports only the critical breach.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Account, TransactionKind};

/// One threshold crossed by an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Breach {
    CriticalBalance,
    LowBalance,
    HighValue,
    LargeWithdrawal,
}

/// Health classification of a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BalanceStatus {
    Ok,
    Low,
    Critical,
}

/// Alert thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPolicy {
    /// Balances strictly below this are low.
    pub low_balance: Money,
    /// Balances strictly below this are critical.
    pub critical_balance: Money,
    /// Amounts at or above this are high-value.
    pub high_value: Money,
    /// Withdrawal share of the prior balance, in basis points, above which
    /// a withdrawal is flagged.
    pub large_withdrawal_bps: u32,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        AlertPolicy {
            low_balance: Money::from_major_minor(500, 0),
            critical_balance: Money::from_major_minor(100, 0),
            high_value: Money::from_major_minor(5000, 0),
            large_withdrawal_bps: 8000,
        }
    }
}

impl AlertPolicy {
    /// Classifies a balance.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::alerts::{AlertPolicy, BalanceStatus};
    /// use tally_core::Money;
    ///
    /// let policy = AlertPolicy::default();
    /// assert_eq!(policy.classify(Money::from_cents(9_999)), BalanceStatus::Critical);
    /// assert_eq!(policy.classify(Money::from_cents(10_000)), BalanceStatus::Low);
    /// assert_eq!(policy.classify(Money::from_cents(50_000)), BalanceStatus::Ok);
    /// ```
    pub fn classify(&self, balance: Money) -> BalanceStatus {
        if balance < self.critical_balance {
            BalanceStatus::Critical
        } else if balance < self.low_balance {
            BalanceStatus::Low
        } else {
            BalanceStatus::Ok
        }
    }

    /// Breaches on the account whose balance went down.
    pub fn evaluate_debit(
        &self,
        kind: TransactionKind,
        before: &Account,
        balance_after: Money,
        amount: Money,
    ) -> Vec<Breach> {
        let mut breaches = Vec::new();

        match self.classify(balance_after) {
            BalanceStatus::Critical => breaches.push(Breach::CriticalBalance),
            BalanceStatus::Low => breaches.push(Breach::LowBalance),
            BalanceStatus::Ok => {}
        }

        if amount >= self.high_value {
            breaches.push(Breach::HighValue);
        }

        if kind == TransactionKind::Withdrawal
            && amount > before.balance.percentage_bps(self.large_withdrawal_bps)
        {
            breaches.push(Breach::LargeWithdrawal);
        }

        breaches
    }

    /// Breaches on the account whose balance went up.
    pub fn evaluate_credit(&self, amount: Money) -> Vec<Breach> {
        if amount >= self.high_value {
            vec![Breach::HighValue]
        } else {
            Vec::new()
        }
    }
}
