//! # Transaction Engine
//!
//! Validates, authorizes, computes and persists every money movement.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Validating ──► OwnershipChecked ──► BalanceComputed ──► Persisted      │
//! │      │                 │                    │                │          │
//! │      │ InvalidAmount   │ AccessDenied       │ Insufficient   │          │
//! │      │ SelfTransfer    │ (audit warn!)      │ Funds          ▼          │
//! │      │ AccountNotFound │                    │            Completed      │
//! │      ▼                 ▼                    ▼                           │
//! │  ─────────────────── Rejected (nothing persisted) ──────────────────    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each operation holds the update locks of the accounts it touches from
//! resolution through persistence, so no other update can interleave
//! between reading a balance and writing the new one. Events go to the
//! [`EventSink`] only after the store confirmed the write.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use tally_core::ownership::{self, Decision};
use tally_core::validation::{
    validate_amount, validate_display_name, validate_initial_deposit, validate_minimum_balance,
    validate_principal,
};
use tally_core::{
    Account, AlertPolicy, AmountIssue, BalanceStatus, BalanceUpdate, Breach, EventKind, IdSource,
    LedgerError, LedgerEvent, LedgerResult, Money, OpenAccount, PrincipalId, RandomIdSource,
    Transaction, TransactionKind, ValidationError, DEFAULT_MINIMUM_BALANCE,
};

use crate::directory::AccountDirectory;
use crate::sink::{EventSink, NoopSink};

// =============================================================================
// Operation Stages
// =============================================================================

/// Where an operation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    OwnershipChecked,
    BalanceComputed,
    Persisted,
    Completed,
    Rejected,
}

/// Tracks one operation's stage for the debug log.
struct Flow {
    operation: &'static str,
    stage: Stage,
}

impl Flow {
    fn begin(operation: &'static str) -> Self {
        trace!(operation, "Operation started");
        Flow {
            operation,
            stage: Stage::Validating,
        }
    }

    fn advance(&mut self, stage: Stage) {
        trace!(operation = self.operation, ?stage, "Stage reached");
        self.stage = stage;
    }

    fn finish<T>(self, result: LedgerResult<T>) -> LedgerResult<T> {
        match &result {
            Ok(_) => debug!(
                operation = self.operation,
                stage = ?Stage::Completed,
                "Operation completed"
            ),
            Err(e) => debug!(
                operation = self.operation,
                stage = ?Stage::Rejected,
                at = ?self.stage,
                kind = ?e.kind(),
                error = %e,
                "Operation rejected"
            ),
        }
        result
    }
}

// =============================================================================
// Balance Report
// =============================================================================

/// One line of a principal's balance report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountStanding {
    pub account: Account,
    pub status: BalanceStatus,
}

// =============================================================================
// Transaction Engine
// =============================================================================

/// Executes deposits, withdrawals and transfers.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use tally_core::{Money, OpenAccount, PrincipalId, AccountClass};
/// use tally_engine::{AccountDirectory, MemoryLedgerStore, TransactionEngine};
///
/// # tokio_test_block(async {
/// let directory = Arc::new(AccountDirectory::new(Arc::new(MemoryLedgerStore::new())));
/// let engine = TransactionEngine::new(directory);
/// let alice = PrincipalId::new("alice");
///
/// let account = engine
///     .open_account(&alice, OpenAccount {
///         display_name: "Alice".into(),
///         class: AccountClass::Savings,
///         initial_deposit: Money::from_cents(50_000),
///         minimum_balance: None,
///     })
///     .await
///     .unwrap();
///
/// engine.withdraw(&alice, &account.id, Money::from_cents(40_000)).await.unwrap();
/// assert_eq!(engine.balance(&alice, &account.id).await.unwrap().cents(), 10_000);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct TransactionEngine {
    directory: Arc<AccountDirectory>,
    ids: Arc<dyn IdSource>,
    sink: Arc<dyn EventSink>,
    alerts: AlertPolicy,
    default_minimum_balance: Money,
}

impl TransactionEngine {
    /// Engine with random ids, no event delivery and default thresholds.
    pub fn new(directory: Arc<AccountDirectory>) -> Self {
        TransactionEngine {
            directory,
            ids: Arc::new(RandomIdSource),
            sink: Arc::new(NoopSink),
            alerts: AlertPolicy::default(),
            default_minimum_balance: DEFAULT_MINIMUM_BALANCE,
        }
    }

    pub fn with_id_source(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_alert_policy(mut self, alerts: AlertPolicy) -> Self {
        self.alerts = alerts;
        self
    }

    /// Floor given to accounts opened without an explicit minimum.
    pub fn with_default_minimum_balance(mut self, minimum: Money) -> Self {
        self.default_minimum_balance = minimum;
        self
    }

    pub fn directory(&self) -> &Arc<AccountDirectory> {
        &self.directory
    }

    pub fn alert_policy(&self) -> &AlertPolicy {
        &self.alerts
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Opens an account owned by `principal`.
    ///
    /// A positive initial deposit is recorded as an "Opening deposit"
    /// transaction in the same store write as the account.
    ///
    /// ## Errors
    /// - `Validation` for a blank principal or display name
    /// - `InvalidAmount` for a negative deposit or floor
    /// - `InsufficientFunds` if the deposit is below the floor
    pub async fn open_account(
        &self,
        principal: &PrincipalId,
        request: OpenAccount,
    ) -> LedgerResult<Account> {
        let mut flow = Flow::begin("open_account");
        let result = self.open_account_inner(&mut flow, principal, request).await;
        flow.finish(result)
    }

    /// Adds `amount` to an account the principal owns.
    pub async fn deposit(
        &self,
        principal: &PrincipalId,
        account_id: &str,
        amount: Money,
    ) -> LedgerResult<Transaction> {
        let mut flow = Flow::begin("deposit");
        let result = self
            .deposit_inner(&mut flow, principal, account_id, amount)
            .await;
        flow.finish(result)
    }

    /// Removes `amount` from an account the principal owns.
    ///
    /// Succeeds iff `balance - amount >= minimum_balance`.
    pub async fn withdraw(
        &self,
        principal: &PrincipalId,
        account_id: &str,
        amount: Money,
    ) -> LedgerResult<Transaction> {
        let mut flow = Flow::begin("withdraw");
        let result = self
            .withdraw_inner(&mut flow, principal, account_id, amount)
            .await;
        flow.finish(result)
    }

    /// Moves `amount` from `from` (owned by the principal) to `to` (any
    /// active account).
    ///
    /// Both balances and the single TRANSFER record are persisted in one
    /// atomic store write.
    pub async fn transfer(
        &self,
        principal: &PrincipalId,
        from: &str,
        to: &str,
        amount: Money,
    ) -> LedgerResult<Transaction> {
        let mut flow = Flow::begin("transfer");
        let result = self
            .transfer_inner(&mut flow, principal, from, to, amount)
            .await;
        flow.finish(result)
    }

    /// Transactions touching an account the principal owns, newest first.
    pub async fn history(
        &self,
        principal: &PrincipalId,
        account_id: &str,
    ) -> LedgerResult<Vec<Transaction>> {
        let mut flow = Flow::begin("history");
        let result = async {
            let account = self.directory.resolve(account_id).await?;
            self.authorize(principal, &account)?;
            flow.advance(Stage::OwnershipChecked);
            self.directory.history(account_id).await
        }
        .await;
        flow.finish(result)
    }

    /// Current balance of an account the principal owns.
    pub async fn balance(&self, principal: &PrincipalId, account_id: &str) -> LedgerResult<Money> {
        let account = self.directory.resolve(account_id).await?;
        self.authorize(principal, &account)?;
        Ok(account.balance)
    }

    /// Every active account of the principal with its balance classification.
    pub async fn balance_report(&self, principal: &PrincipalId) -> LedgerResult<Vec<AccountStanding>> {
        let accounts = self.directory.list_by_owner(principal).await?;
        Ok(accounts
            .into_iter()
            .map(|account| AccountStanding {
                status: self.alerts.classify(account.balance),
                account,
            })
            .collect())
    }

    /// Clears cached account state when the principal logs out.
    pub async fn end_session(&self, principal: &PrincipalId) {
        self.directory.invalidate_all().await;
        debug!(principal = %principal, "Session ended");
    }

    // =========================================================================
    // Operation Bodies
    // =========================================================================

    async fn open_account_inner(
        &self,
        flow: &mut Flow,
        principal: &PrincipalId,
        request: OpenAccount,
    ) -> LedgerResult<Account> {
        validate_principal(principal)?;
        validate_display_name(&request.display_name)?;
        validate_initial_deposit(request.initial_deposit)?;
        let minimum = request.minimum_balance.unwrap_or(self.default_minimum_balance);
        validate_minimum_balance(minimum)?;
        flow.advance(Stage::OwnershipChecked);

        let mut account = Account {
            id: self.ids.next_account_id(),
            owner_id: principal.clone(),
            display_name: request.display_name.trim().to_string(),
            balance: request.initial_deposit,
            class: request.class,
            minimum_balance: minimum,
            active: true,
            created_at: chrono::Utc::now(),
        };
        if !account.satisfies_floor() {
            return Err(LedgerError::InsufficientFunds {
                account_id: account.id,
                balance: request.initial_deposit,
                requested: Money::zero(),
                minimum,
            });
        }
        flow.advance(Stage::BalanceComputed);

        let mut retried = false;
        let account = loop {
            let attempt = if account.balance.is_positive() {
                let opening =
                    Transaction::opening(self.ids.next_transaction_id(), &account.id, account.balance);
                self.directory
                    .create_with_opening(account.clone(), &opening)
                    .await
            } else {
                self.directory.create(account.clone()).await
            };

            match attempt {
                Ok(created) => break created,
                Err(LedgerError::AccountAlreadyExists { account_id }) if !retried => {
                    warn!(account_id = %account_id, "Account id collision, regenerating");
                    account.id = self.ids.next_account_id();
                    retried = true;
                }
                Err(LedgerError::DuplicateTransactionId { transaction_id }) if !retried => {
                    warn!(transaction_id = %transaction_id, "Transaction id collision, regenerating");
                    retried = true;
                }
                Err(e) => return Err(e),
            }
        };
        flow.advance(Stage::Persisted);

        debug!(
            account_id = %account.id,
            owner = %account.owner_id,
            balance = %account.balance,
            "Account opened"
        );

        let event = LedgerEvent::opened(&account);
        match self.alerts.classify(account.balance) {
            BalanceStatus::Critical => self.publish_breaches(&event, &[Breach::CriticalBalance]),
            BalanceStatus::Low => self.publish_breaches(&event, &[Breach::LowBalance]),
            BalanceStatus::Ok => {}
        }
        self.sink.publish(event);

        Ok(account)
    }

    async fn deposit_inner(
        &self,
        flow: &mut Flow,
        principal: &PrincipalId,
        account_id: &str,
        amount: Money,
    ) -> LedgerResult<Transaction> {
        validate_amount(amount)?;

        let _locks = self.directory.lock(&[account_id]).await;
        let account = self.directory.resolve(account_id).await?;
        self.authorize(principal, &account)?;
        flow.advance(Stage::OwnershipChecked);

        let new_balance = credit(&account, amount)?;
        flow.advance(Stage::BalanceComputed);

        let update = BalanceUpdate::new(account_id, account.balance, new_balance);
        let tx = self
            .commit_fresh(&[update], |id| {
                Transaction::single(id, TransactionKind::Deposit, account_id, amount)
            })
            .await?;
        flow.advance(Stage::Persisted);

        debug!(
            transaction_id = %tx.id,
            account_id = %account_id,
            amount = %amount,
            balance = %new_balance,
            "Deposit committed"
        );

        let after = Account {
            balance: new_balance,
            ..account
        };
        let event = LedgerEvent::for_transaction(EventKind::Deposit, &after, &tx);
        self.publish_breaches(&event, &self.alerts.evaluate_credit(amount));
        self.sink.publish(event);

        Ok(tx)
    }

    async fn withdraw_inner(
        &self,
        flow: &mut Flow,
        principal: &PrincipalId,
        account_id: &str,
        amount: Money,
    ) -> LedgerResult<Transaction> {
        validate_amount(amount)?;

        let _locks = self.directory.lock(&[account_id]).await;
        let account = self.directory.resolve(account_id).await?;
        self.authorize(principal, &account)?;
        flow.advance(Stage::OwnershipChecked);

        let new_balance = debit(&account, amount)?;
        flow.advance(Stage::BalanceComputed);

        let update = BalanceUpdate::new(account_id, account.balance, new_balance);
        let tx = self
            .commit_fresh(&[update], |id| {
                Transaction::single(id, TransactionKind::Withdrawal, account_id, amount)
            })
            .await?;
        flow.advance(Stage::Persisted);

        debug!(
            transaction_id = %tx.id,
            account_id = %account_id,
            amount = %amount,
            balance = %new_balance,
            "Withdrawal committed"
        );

        let breaches =
            self.alerts
                .evaluate_debit(TransactionKind::Withdrawal, &account, new_balance, amount);
        let after = Account {
            balance: new_balance,
            ..account
        };
        let event = LedgerEvent::for_transaction(EventKind::Withdrawal, &after, &tx);
        self.publish_breaches(&event, &breaches);
        self.sink.publish(event);

        Ok(tx)
    }

    async fn transfer_inner(
        &self,
        flow: &mut Flow,
        principal: &PrincipalId,
        from: &str,
        to: &str,
        amount: Money,
    ) -> LedgerResult<Transaction> {
        validate_amount(amount)?;
        if from == to {
            return Err(LedgerError::SelfTransfer {
                account_id: from.to_string(),
            });
        }

        let _locks = self.directory.lock(&[from, to]).await;
        let source = self.directory.resolve(from).await?;
        let destination = self.directory.resolve(to).await?;
        self.authorize(principal, &source)?;
        flow.advance(Stage::OwnershipChecked);

        let new_source = debit(&source, amount)?;
        let new_destination = credit(&destination, amount)?;
        flow.advance(Stage::BalanceComputed);

        let updates = [
            BalanceUpdate::new(from, source.balance, new_source),
            BalanceUpdate::new(to, destination.balance, new_destination),
        ];
        let tx = self
            .commit_fresh(&updates, |id| Transaction::transfer(id, from, to, amount))
            .await?;
        flow.advance(Stage::Persisted);

        debug!(
            transaction_id = %tx.id,
            from = %from,
            to = %to,
            amount = %amount,
            "Transfer committed"
        );

        let breaches =
            self.alerts
                .evaluate_debit(TransactionKind::Transfer, &source, new_source, amount);
        let source_after = Account {
            balance: new_source,
            ..source
        };
        let out = LedgerEvent::for_transaction(EventKind::TransferOut, &source_after, &tx);
        self.publish_breaches(&out, &breaches);
        self.sink.publish(out);

        let destination_after = Account {
            balance: new_destination,
            ..destination
        };
        self.sink.publish(LedgerEvent::for_transaction(
            EventKind::TransferIn,
            &destination_after,
            &tx,
        ));

        Ok(tx)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Ownership gate. Denials are audited with the real owner, which the
    /// returned error does not carry.
    fn authorize(&self, principal: &PrincipalId, account: &Account) -> LedgerResult<()> {
        match ownership::authorize(principal, account) {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => {
                warn!(
                    principal = %denial.principal,
                    account_id = %denial.account_id,
                    owner = %denial.owner,
                    "Access denied: principal does not own account"
                );
                Err(denial.into_error())
            }
        }
    }

    /// Commits under a fresh transaction id, regenerating it once on
    /// collision.
    async fn commit_fresh<F>(
        &self,
        updates: &[BalanceUpdate<'_>],
        build: F,
    ) -> LedgerResult<Transaction>
    where
        F: Fn(String) -> Transaction,
    {
        let tx = well_formed(build(self.ids.next_transaction_id()))?;
        match self.directory.commit(updates, &tx).await {
            Ok(()) => Ok(tx),
            Err(LedgerError::DuplicateTransactionId { transaction_id }) => {
                warn!(transaction_id = %transaction_id, "Transaction id collision, regenerating");
                let retry = well_formed(build(self.ids.next_transaction_id()))?;
                self.directory.commit(updates, &retry).await?;
                Ok(retry)
            }
            Err(e) => Err(e),
        }
    }

    fn publish_breaches(&self, event: &LedgerEvent, breaches: &[Breach]) {
        for &breach in breaches {
            debug!(account_id = %event.account_id, ?breach, "Threshold breached");
            self.sink
                .publish(event.with_kind(EventKind::ThresholdBreach { breach }));
        }
    }
}

/// Refuses records whose source/destination shape does not fit their kind.
fn well_formed(tx: Transaction) -> LedgerResult<Transaction> {
    if tx.is_well_formed() {
        Ok(tx)
    } else {
        Err(LedgerError::Validation(ValidationError::InvalidFormat {
            field: "transaction".to_string(),
            reason: format!("{} record {} has the wrong account references", tx.kind, tx.id),
        }))
    }
}

/// Balance after adding `amount`.
fn credit(account: &Account, amount: Money) -> LedgerResult<Money> {
    account
        .balance
        .checked_add(amount)
        .ok_or_else(|| LedgerError::invalid_amount(amount, AmountIssue::Overflow))
}

/// Balance after removing `amount`, refusing to cross the floor.
fn debit(account: &Account, amount: Money) -> LedgerResult<Money> {
    let insufficient = || LedgerError::InsufficientFunds {
        account_id: account.id.clone(),
        balance: account.balance,
        requested: amount,
        minimum: account.minimum_balance,
    };

    let new_balance = account.balance.checked_sub(amount).ok_or_else(insufficient)?;
    if new_balance < account.minimum_balance {
        return Err(insufficient());
    }
    Ok(new_balance)
}

// =============================================================================
// Unit Tests
// =============================================================================
