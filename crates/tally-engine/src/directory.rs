//! # Account Directory
//!
//! In-memory view of accounts backed by the ledger store.
//!
//! ## Write-Through Cache
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    resolve(id)                                          │
//! │                                                                         │
//! │   cache hit? ──yes──► return cached Account                             │
//! │       │                                                                 │
//! │       no                                                                │
//! │       ▼                                                                 │
//! │   stamp := epoch, store.get_account(id) ──► None / inactive ──► NotFound │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │   cache it unless `id` was written after `stamp`, return                │
//! │                                                                         │
//! │                    commit(updates, tx)                                  │
//! │                                                                         │
//! │   store.commit(...) ──► Conflict ──► evict ids, PersistFailure          │
//! │       │           └───► other Err ──► cache untouched                   │
//! │       Ok                                                                │
//! │       ▼                                                                 │
//! │   cached balances := new balances, ids stamped with a new epoch         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Store reads run without the cache lock, so a commit can land between
//! the read and the fill. Every confirmed write stamps its accounts with a
//! fresh epoch; a fill whose read started before that stamp is dropped
//! instead of replacing the newer balance.
//!
//! ## Per-Account Locks
//! Every read-modify-write of a balance runs while holding that account's
//! async mutex. Multi-account operations take their locks in ascending id
//! order, so two opposite-direction transfers cannot deadlock.
//!
//! ## Thread Safety
//! The cache sits behind a `tokio::sync::RwLock`: any task may read, writes
//! only happen inside this module. Cache guards are never held across a
//! store call.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, warn};

use tally_core::validation::validate_account_id;
use tally_core::{
    Account, BalanceUpdate, LedgerError, LedgerResult, LedgerStore, Money, PrincipalId,
    StoreError, Transaction,
};

/// Accounts cache plus update locks, in front of a [`LedgerStore`].
///
/// Construct one per process (or per test) and share it behind an `Arc`.
pub struct AccountDirectory {
    store: Arc<dyn LedgerStore>,
    cache: RwLock<AccountCache>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Cached accounts and the epoch of the last write to each.
#[derive(Default)]
struct AccountCache {
    accounts: HashMap<String, Account>,
    written_at: HashMap<String, u64>,
    cleared_at: u64,
    epoch: u64,
}

impl AccountCache {
    /// Stamp for a store read about to start.
    fn stamp(&self) -> u64 {
        self.epoch
    }

    fn record_write(&mut self, account_id: &str) {
        self.epoch += 1;
        self.written_at.insert(account_id.to_string(), self.epoch);
    }

    /// Caches `account` as read from the store under `stamp`, unless the
    /// account was written or the cache cleared since.
    fn fill(&mut self, account: &Account, stamp: u64) -> bool {
        let written = self.written_at.get(&account.id).copied().unwrap_or(0);
        if written > stamp || self.cleared_at > stamp {
            return false;
        }
        self.accounts.insert(account.id.clone(), account.clone());
        true
    }

    fn evict(&mut self, account_id: &str) {
        self.accounts.remove(account_id);
        self.record_write(account_id);
    }

    fn clear(&mut self) -> usize {
        let dropped = self.accounts.len();
        self.accounts.clear();
        self.epoch += 1;
        self.cleared_at = self.epoch;
        dropped
    }
}

/// Exclusive hold on one or more accounts' balances.
///
/// Released on drop.
#[must_use = "balances are only protected while the guard is alive"]
pub struct AccountLocks {
    _guards: Vec<OwnedMutexGuard<()>>,
    account_ids: Vec<String>,
}

impl AccountLocks {
    /// Locked ids, in acquisition order.
    pub fn account_ids(&self) -> &[String] {
        &self.account_ids
    }
}

impl AccountDirectory {
    /// Creates an empty directory over `store`.
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        AccountDirectory {
            store,
            cache: RwLock::new(AccountCache::default()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the account, from cache or store.
    ///
    /// ## Errors
    /// - `AccountNotFound` for unknown or deactivated ids
    /// - `PersistFailure` if the store read fails
    pub async fn resolve(&self, account_id: &str) -> LedgerResult<Account> {
        let stamp = {
            let cache = self.cache.read().await;
            if let Some(account) = cache.accounts.get(account_id) {
                return Ok(account.clone());
            }
            cache.stamp()
        };

        let account = self
            .store
            .get_account(account_id)
            .await
            .map_err(|e| LedgerError::persist("resolve", e))?
            .filter(|a| a.active)
            .ok_or_else(|| LedgerError::not_found(account_id))?;

        if self.cache.write().await.fill(&account, stamp) {
            debug!(account_id = %account_id, "Account cached from store");
        } else {
            debug!(account_id = %account_id, "Account written during read, not cached");
        }

        Ok(account)
    }

    /// Persists a new account, then caches it.
    ///
    /// ## Errors
    /// - `Validation` for a malformed id
    /// - `AccountAlreadyExists` if the id is in the cache or the store
    pub async fn create(&self, account: Account) -> LedgerResult<Account> {
        self.ensure_absent(&account.id).await?;

        self.store
            .put_account(&account)
            .await
            .map_err(|e| map_create_error(&account.id, e))?;

        self.remember(&account).await;
        Ok(account)
    }

    /// Like [`create`](Self::create), but records `opening` in the same
    /// atomic store write.
    pub async fn create_with_opening(
        &self,
        account: Account,
        opening: &Transaction,
    ) -> LedgerResult<Account> {
        self.ensure_absent(&account.id).await?;

        self.store
            .open_account(&account, Some(opening))
            .await
            .map_err(|e| match e {
                StoreError::Duplicate {
                    entity: "Transaction",
                    id,
                } => LedgerError::DuplicateTransactionId { transaction_id: id },
                other => map_create_error(&account.id, other),
            })?;

        self.remember(&account).await;
        Ok(account)
    }

    /// Writes a new balance through to the store, then to the cache.
    ///
    /// ## Errors
    /// - `AccountNotFound` if the store has no such account
    /// - `PersistFailure` for any other store failure (cache untouched)
    pub async fn apply_balance(&self, account_id: &str, new_balance: Money) -> LedgerResult<()> {
        self.store
            .update_balance(account_id, new_balance)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => LedgerError::not_found(account_id),
                other => LedgerError::persist("apply_balance", other),
            })?;

        let mut cache = self.cache.write().await;
        cache.record_write(account_id);
        if let Some(cached) = cache.accounts.get_mut(account_id) {
            cached.balance = new_balance;
        }
        drop(cache);

        debug!(account_id = %account_id, balance = %new_balance, "Balance applied");
        Ok(())
    }

    /// Applies balance updates and appends `tx` in one atomic store write,
    /// then refreshes the cached balances.
    ///
    /// This is the engine's only balance-update path.
    ///
    /// ## Errors
    /// - `DuplicateTransactionId` if the store already holds `tx.id`
    /// - `AccountNotFound` if an account vanished from the store
    /// - `PersistFailure` for conflicts and store failures. A conflict means
    ///   the cached balance no longer matches the store, so the involved
    ///   accounts are evicted and the next resolve reloads them.
    pub async fn commit(&self, updates: &[BalanceUpdate<'_>], tx: &Transaction) -> LedgerResult<()> {
        if let Err(e) = self.store.commit(updates, tx).await {
            return Err(match e {
                StoreError::Duplicate { id, .. } => {
                    LedgerError::DuplicateTransactionId { transaction_id: id }
                }
                StoreError::NotFound {
                    entity: "Account",
                    id,
                } => LedgerError::not_found(id),
                StoreError::Conflict { account_id } => {
                    let mut cache = self.cache.write().await;
                    for update in updates {
                        cache.evict(update.account_id);
                    }
                    warn!(account_id = %account_id, "Stale cached balance evicted");
                    LedgerError::persist("commit", StoreError::Conflict { account_id })
                }
                other => LedgerError::persist("commit", other),
            });
        }

        let mut cache = self.cache.write().await;
        for update in updates {
            cache.record_write(update.account_id);
            if let Some(cached) = cache.accounts.get_mut(update.account_id) {
                cached.balance = update.new_balance;
            }
        }

        Ok(())
    }

    /// Lists the owner's active accounts.
    ///
    /// Always asks the store (it decides membership), then refreshes the
    /// cache with what it returned. Accounts written while the store was
    /// being read keep their cached balance.
    pub async fn list_by_owner(&self, owner: &PrincipalId) -> LedgerResult<Vec<Account>> {
        let stamp = self.cache.read().await.stamp();
        let accounts = self
            .store
            .list_accounts_by_owner(owner)
            .await
            .map_err(|e| LedgerError::persist("list_by_owner", e))?;

        let mut cache = self.cache.write().await;
        for account in &accounts {
            cache.fill(account, stamp);
        }
        drop(cache);

        debug!(owner = %owner, count = accounts.len(), "Listed accounts by owner");
        Ok(accounts)
    }

    /// Transactions touching `account_id`, newest first, straight from the store.
    pub async fn history(&self, account_id: &str) -> LedgerResult<Vec<Transaction>> {
        self.store
            .list_transactions_by_account(account_id)
            .await
            .map_err(|e| LedgerError::persist("history", e))
    }

    /// Drops every cached account. Called on principal logout.
    pub async fn invalidate_all(&self) {
        let dropped = self.cache.write().await.clear();
        debug!(dropped, "Account cache cleared");
    }

    /// Number of cached accounts.
    pub async fn cached_len(&self) -> usize {
        self.cache.read().await.accounts.len()
    }

    /// Acquires the update locks of `account_ids`.
    ///
    /// Ids are deduplicated and locked in ascending order.
    pub async fn lock(&self, account_ids: &[&str]) -> AccountLocks {
        let mut ids: Vec<String> = account_ids.iter().map(|id| id.to_string()).collect();
        ids.sort();
        ids.dedup();

        let mutexes: Vec<Arc<Mutex<()>>> = {
            let mut locks = self.locks.lock().await;
            ids.iter()
                .map(|id| locks.entry(id.clone()).or_default().clone())
                .collect()
        };

        let mut guards = Vec::with_capacity(mutexes.len());
        for mutex in mutexes {
            guards.push(mutex.lock_owned().await);
        }

        AccountLocks {
            _guards: guards,
            account_ids: ids,
        }
    }

    async fn ensure_absent(&self, account_id: &str) -> LedgerResult<()> {
        validate_account_id(account_id)?;

        if self.cache.read().await.accounts.contains_key(account_id) {
            return Err(LedgerError::AccountAlreadyExists {
                account_id: account_id.to_string(),
            });
        }

        let existing = self
            .store
            .get_account(account_id)
            .await
            .map_err(|e| LedgerError::persist("create", e))?;
        if existing.is_some() {
            return Err(LedgerError::AccountAlreadyExists {
                account_id: account_id.to_string(),
            });
        }

        Ok(())
    }

    async fn remember(&self, account: &Account) {
        debug!(account_id = %account.id, owner = %account.owner_id, "Account created");
        let mut cache = self.cache.write().await;
        cache.record_write(&account.id);
        cache.accounts.insert(account.id.clone(), account.clone());
    }
}

fn map_create_error(account_id: &str, err: StoreError) -> LedgerError {
    match err {
        StoreError::Duplicate { .. } => LedgerError::AccountAlreadyExists {
            account_id: account_id.to_string(),
        },
        other => LedgerError::persist("create", other),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
