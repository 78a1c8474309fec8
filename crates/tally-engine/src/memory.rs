//! # In-Memory Ledger Store
//!
//! A [`LedgerStore`] held entirely in process memory.
//!
//! Used by the engine's tests and by callers that embed the ledger without
//! a database. It honours the same contract as the SQLite store: duplicate
//! keys are rejected, `commit` is all-or-nothing with compare-and-swap on
//! every balance, and history comes back newest first.
//!
//! `set_unavailable(true)` makes every call fail with
//! [`StoreError::Unavailable`], which is how tests simulate an outage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use tally_core::{
    Account, BalanceUpdate, LedgerStore, Money, PrincipalId, StoreError, StoreResult, Transaction,
};

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    /// Append order; history reads walk it backwards.
    transactions: Vec<Transaction>,
}

impl State {
    fn has_transaction(&self, id: &str) -> bool {
        self.transactions.iter().any(|t| t.id == id)
    }
}

/// Process-local ledger store.
#[derive(Default)]
pub struct MemoryLedgerStore {
    state: Mutex<State>,
    unavailable: AtomicBool,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates an outage: while set, every operation fails.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored transaction records.
    pub async fn transaction_count(&self) -> usize {
        self.state.lock().await.transactions.len()
    }

    /// Sum of all stored balances.
    pub async fn total_balance(&self) -> Money {
        self.state
            .lock()
            .await
            .accounts
            .values()
            .fold(Money::zero(), |sum, a| sum + a.balance)
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

fn duplicate(entity: &'static str, id: &str) -> StoreError {
    StoreError::Duplicate {
        entity,
        id: id.to_string(),
    }
}

fn missing_account(id: &str) -> StoreError {
    StoreError::NotFound {
        entity: "Account",
        id: id.to_string(),
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn get_account(&self, id: &str) -> StoreResult<Option<Account>> {
        self.check_available()?;
        Ok(self.state.lock().await.accounts.get(id).cloned())
    }

    async fn put_account(&self, account: &Account) -> StoreResult<()> {
        self.open_account(account, None).await
    }

    async fn open_account(
        &self,
        account: &Account,
        opening: Option<&Transaction>,
    ) -> StoreResult<()> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        if state.accounts.contains_key(&account.id) {
            return Err(duplicate("Account", &account.id));
        }
        if let Some(tx) = opening {
            if state.has_transaction(&tx.id) {
                return Err(duplicate("Transaction", &tx.id));
            }
        }

        state.accounts.insert(account.id.clone(), account.clone());
        if let Some(tx) = opening {
            state.transactions.push(tx.clone());
        }
        Ok(())
    }

    async fn update_balance(&self, id: &str, new_balance: Money) -> StoreResult<()> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let account = state.accounts.get_mut(id).ok_or_else(|| missing_account(id))?;
        account.balance = new_balance;
        Ok(())
    }

    async fn list_accounts_by_owner(&self, owner: &PrincipalId) -> StoreResult<Vec<Account>> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut accounts: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| a.active && &a.owner_id == owner)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(accounts)
    }

    async fn append_transaction(&self, tx: &Transaction) -> StoreResult<()> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        if state.has_transaction(&tx.id) {
            return Err(duplicate("Transaction", &tx.id));
        }
        state.transactions.push(tx.clone());
        Ok(())
    }

    async fn list_transactions_by_account(
        &self,
        account_id: &str,
    ) -> StoreResult<Vec<Transaction>> {
        self.check_available()?;
        let state = self.state.lock().await;
        let mut history: Vec<Transaction> = state
            .transactions
            .iter()
            .rev()
            .filter(|t| t.touches(account_id))
            .cloned()
            .collect();
        // Stable: equal timestamps keep newest-appended first
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(history)
    }

    async fn commit(&self, updates: &[BalanceUpdate<'_>], tx: &Transaction) -> StoreResult<()> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        if state.has_transaction(&tx.id) {
            return Err(duplicate("Transaction", &tx.id));
        }
        for update in updates {
            let account = state
                .accounts
                .get(update.account_id)
                .ok_or_else(|| missing_account(update.account_id))?;
            if account.balance != update.expected {
                return Err(StoreError::Conflict {
                    account_id: update.account_id.to_string(),
                });
            }
        }

        for update in updates {
            if let Some(account) = state.accounts.get_mut(update.account_id) {
                account.balance = update.new_balance;
            }
        }
        state.transactions.push(tx.clone());
        Ok(())
    }
}
