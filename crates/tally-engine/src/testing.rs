//! Store wrapper for interleaving tests.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use tally_core::{
    Account, BalanceUpdate, LedgerStore, Money, PrincipalId, StoreResult, Transaction,
};

use crate::memory::MemoryLedgerStore;

/// Which read the store stops after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PausePoint {
    GetAccount = 1,
    ListByOwner = 2,
}

/// Delegates to a [`MemoryLedgerStore`], but can hold one read open after
/// it has fetched its data, so a test can commit in between.
pub(crate) struct PausingStore {
    inner: Arc<MemoryLedgerStore>,
    armed: AtomicU8,
    paused: Notify,
    resume: Notify,
}

impl PausingStore {
    pub(crate) fn new(inner: Arc<MemoryLedgerStore>) -> Self {
        PausingStore {
            inner,
            armed: AtomicU8::new(0),
            paused: Notify::new(),
            resume: Notify::new(),
        }
    }

    /// The next read at `point` will stop before returning.
    pub(crate) fn pause_next(&self, point: PausePoint) {
        self.armed.store(point as u8, Ordering::SeqCst);
    }

    /// Waits until the armed read has fetched and stopped.
    pub(crate) async fn wait_paused(&self) {
        self.paused.notified().await;
    }

    pub(crate) fn resume(&self) {
        self.resume.notify_one();
    }

    async fn checkpoint(&self, point: PausePoint) {
        let hit = self
            .armed
            .compare_exchange(point as u8, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if hit {
            self.paused.notify_one();
            self.resume.notified().await;
        }
    }
}

#[async_trait]
impl LedgerStore for PausingStore {
    async fn get_account(&self, id: &str) -> StoreResult<Option<Account>> {
        let found = self.inner.get_account(id).await;
        self.checkpoint(PausePoint::GetAccount).await;
        found
    }

    async fn put_account(&self, account: &Account) -> StoreResult<()> {
        self.inner.put_account(account).await
    }

    async fn open_account(
        &self,
        account: &Account,
        opening: Option<&Transaction>,
    ) -> StoreResult<()> {
        self.inner.open_account(account, opening).await
    }

    async fn update_balance(&self, id: &str, new_balance: Money) -> StoreResult<()> {
        self.inner.update_balance(id, new_balance).await
    }

    async fn list_accounts_by_owner(&self, owner: &PrincipalId) -> StoreResult<Vec<Account>> {
        let listed = self.inner.list_accounts_by_owner(owner).await;
        self.checkpoint(PausePoint::ListByOwner).await;
        listed
    }

    async fn append_transaction(&self, tx: &Transaction) -> StoreResult<()> {
        self.inner.append_transaction(tx).await
    }

    async fn list_transactions_by_account(
        &self,
        account_id: &str,
    ) -> StoreResult<Vec<Transaction>> {
        self.inner.list_transactions_by_account(account_id).await
    }

    async fn commit(&self, updates: &[BalanceUpdate<'_>], tx: &Transaction) -> StoreResult<()> {
        self.inner.commit(updates, tx).await
    }
}
