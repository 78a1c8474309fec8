//! End-to-end ledger scenarios: engine + directory + SQLite store.

use std::sync::Arc;

use tally_core::{
    AccountClass, ErrorKind, LedgerError, Money, OpenAccount, PrincipalId, TransactionKind,
};
use tally_db::{Database, DbConfig};
use tally_engine::{AccountDirectory, TransactionEngine};

fn dollars(major: i64) -> Money {
    Money::from_major_minor(major, 0)
}

async fn setup() -> (Database, Arc<TransactionEngine>) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let directory = Arc::new(AccountDirectory::new(Arc::new(db.ledger_store())));
    (db, Arc::new(TransactionEngine::new(directory)))
}

async fn open(
    engine: &TransactionEngine,
    owner: &PrincipalId,
    initial: Money,
    minimum: Option<Money>,
) -> String {
    engine
        .open_account(
            owner,
            OpenAccount {
                display_name: format!("{owner} savings"),
                class: AccountClass::Savings,
                initial_deposit: initial,
                minimum_balance: minimum,
            },
        )
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn withdrawal_stops_at_the_floor() {
    let (db, engine) = setup().await;
    let alice = PrincipalId::new("alice");
    let a = open(&engine, &alice, dollars(500), None).await;

    engine.withdraw(&alice, &a, dollars(400)).await.unwrap();
    let err = engine
        .withdraw(&alice, &a, Money::from_cents(1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFunds);

    let stored = db.accounts().get_by_id(&a).await.unwrap().unwrap();
    assert_eq!(stored.balance, dollars(100));
    // Opening deposit + one withdrawal; the rejected attempt left no row
    assert_eq!(db.transactions().count().await.unwrap(), 2);
}

#[tokio::test]
async fn transfer_is_one_record_visible_from_both_sides() {
    let (db, engine) = setup().await;
    let alice = PrincipalId::new("alice");
    let bob = PrincipalId::new("bob");
    let a = open(&engine, &alice, dollars(200), None).await;
    let b = open(&engine, &bob, dollars(10), Some(Money::zero())).await;

    let tx = engine.transfer(&alice, &a, &b, dollars(50)).await.unwrap();

    assert_eq!(engine.balance(&alice, &a).await.unwrap(), dollars(150));
    assert_eq!(engine.balance(&bob, &b).await.unwrap(), dollars(60));

    let from_a = engine.history(&alice, &a).await.unwrap();
    let from_b = engine.history(&bob, &b).await.unwrap();
    assert_eq!(from_a[0].id, tx.id);
    assert_eq!(from_b[0].id, tx.id);
    assert_eq!(
        from_a
            .iter()
            .filter(|t| t.kind == TransactionKind::Transfer)
            .count(),
        1
    );

    assert_eq!(db.accounts().total_balance().await.unwrap(), dollars(210));
}

#[tokio::test]
async fn foreign_principal_is_denied_and_nothing_changes() {
    let (db, engine) = setup().await;
    let alice = PrincipalId::new("alice");
    let mallory = PrincipalId::new("mallory");
    let a = open(&engine, &alice, dollars(500), None).await;
    let m = open(&engine, &mallory, dollars(500), None).await;
    let before = db.transactions().count().await.unwrap();

    let err = engine.transfer(&mallory, &a, &m, dollars(100)).await.unwrap_err();
    assert_eq!(err, LedgerError::AccessDenied { account_id: a.clone() });
    assert!(matches!(
        engine.history(&mallory, &a).await,
        Err(LedgerError::AccessDenied { .. })
    ));

    assert_eq!(db.transactions().count().await.unwrap(), before);
    assert_eq!(engine.balance(&alice, &a).await.unwrap(), dollars(500));
}

#[tokio::test]
async fn balances_survive_a_fresh_directory() {
    let (db, engine) = setup().await;
    let alice = PrincipalId::new("alice");
    let a = open(&engine, &alice, dollars(500), None).await;
    engine.deposit(&alice, &a, dollars(25)).await.unwrap();
    engine.end_session(&alice).await;

    let directory = Arc::new(AccountDirectory::new(Arc::new(db.ledger_store())));
    let reopened = TransactionEngine::new(directory);
    assert_eq!(reopened.balance(&alice, &a).await.unwrap(), dollars(525));

    let report = reopened.balance_report(&alice).await.unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].account.id, a);
}

#[tokio::test]
async fn deactivated_accounts_resolve_as_missing() {
    let (db, engine) = setup().await;
    let alice = PrincipalId::new("alice");
    let a = open(&engine, &alice, dollars(500), None).await;

    db.accounts().deactivate(&a).await.unwrap();
    engine.end_session(&alice).await;

    let err = engine.deposit(&alice, &a, dollars(1)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccountNotFound);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_deposits_all_land() {
    let (db, engine) = setup().await;
    let alice = PrincipalId::new("alice");
    let a = open(&engine, &alice, dollars(500), None).await;

    let mut handles = Vec::new();
    for _ in 0..25 {
        let engine = engine.clone();
        let principal = alice.clone();
        let id = a.clone();
        handles.push(tokio::spawn(async move {
            engine.deposit(&principal, &id, dollars(2)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = db.accounts().get_by_id(&a).await.unwrap().unwrap();
    assert_eq!(stored.balance, dollars(550));
    assert_eq!(db.transactions().count().await.unwrap(), 26);
}
