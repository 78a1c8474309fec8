//! # SQLite Ledger Store
//!
//! [`LedgerStore`] over the repositories.
//!
//! ## Commit
//! ```text
//! BEGIN
//!   for each update:
//!     UPDATE accounts SET balance_cents = new
//!      WHERE id = ? AND balance_cents = expected   ── 0 rows → Conflict / NotFound
//!   INSERT INTO transactions (...)                 ── PK clash → Duplicate
//! COMMIT                                           (any error: dropped → ROLLBACK)
//! ```

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::DbError;
use crate::pool::Database;
use crate::repository::account::AccountRepository;
use crate::repository::transaction::TransactionRepository;
use tally_core::{
    Account, BalanceUpdate, LedgerStore, Money, PrincipalId, StoreError, StoreResult, Transaction,
};

/// The SQLite-backed ledger store.
#[derive(Debug, Clone)]
pub struct SqliteLedgerStore {
    db: Database,
}

impl SqliteLedgerStore {
    pub fn new(db: Database) -> Self {
        SqliteLedgerStore { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

fn store_error(operation: &'static str, err: DbError) -> StoreError {
    let mapped = StoreError::from(err);
    if matches!(mapped, StoreError::Unavailable(_)) {
        warn!(operation, error = %mapped, "Ledger store failure");
    }
    mapped
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn get_account(&self, id: &str) -> StoreResult<Option<Account>> {
        self.db
            .accounts()
            .get_by_id(id)
            .await
            .map_err(|e| store_error("get_account", e))
    }

    async fn put_account(&self, account: &Account) -> StoreResult<()> {
        self.db
            .accounts()
            .insert(account)
            .await
            .map_err(|e| store_error("put_account", e))
    }

    async fn open_account(
        &self,
        account: &Account,
        opening: Option<&Transaction>,
    ) -> StoreResult<()> {
        let result: Result<(), DbError> = async {
            let mut tx = self.db.pool().begin().await?;
            AccountRepository::insert_with(&mut *tx, account).await?;
            if let Some(record) = opening {
                TransactionRepository::insert_with(&mut *tx, record).await?;
            }
            tx.commit().await?;
            Ok(())
        }
        .await;

        result.map_err(|e| store_error("open_account", e))?;
        debug!(account_id = %account.id, "Account opened in store");
        Ok(())
    }

    async fn update_balance(&self, id: &str, new_balance: Money) -> StoreResult<()> {
        self.db
            .accounts()
            .update_balance(id, new_balance)
            .await
            .map_err(|e| store_error("update_balance", e))
    }

    async fn list_accounts_by_owner(&self, owner: &PrincipalId) -> StoreResult<Vec<Account>> {
        self.db
            .accounts()
            .list_by_owner(owner)
            .await
            .map_err(|e| store_error("list_accounts_by_owner", e))
    }

    async fn append_transaction(&self, tx: &Transaction) -> StoreResult<()> {
        self.db
            .transactions()
            .insert(tx)
            .await
            .map_err(|e| store_error("append_transaction", e))
    }

    async fn list_transactions_by_account(
        &self,
        account_id: &str,
    ) -> StoreResult<Vec<Transaction>> {
        self.db
            .transactions()
            .list_by_account(account_id)
            .await
            .map_err(|e| store_error("list_transactions_by_account", e))
    }

    async fn commit(&self, updates: &[BalanceUpdate<'_>], record: &Transaction) -> StoreResult<()> {
        let result: Result<(), DbError> = async {
            let mut tx = self.db.pool().begin().await?;
            for update in updates {
                AccountRepository::compare_and_swap(
                    &mut tx,
                    update.account_id,
                    update.expected,
                    update.new_balance,
                )
                .await?;
            }
            TransactionRepository::insert_with(&mut *tx, record).await?;
            tx.commit().await?;
            Ok(())
        }
        .await;

        result.map_err(|e| store_error("commit", e))?;
        debug!(
            transaction_id = %record.id,
            accounts = updates.len(),
            "Committed balance updates"
        );
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
