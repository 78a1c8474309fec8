//! # Transaction Repository
//!
//! Append-only storage of transaction records.
//!
//! Records are never updated or deleted. History reads come back newest
//! first; records with the same timestamp keep reverse insertion order
//! (`rowid DESC`).

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{Money, Transaction, TransactionKind, TransactionOutcome};

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    source_account_id: Option<String>,
    destination_account_id: Option<String>,
    amount_cents: i64,
    kind: TransactionKind,
    description: String,
    timestamp: DateTime<Utc>,
    outcome: TransactionOutcome,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Transaction {
            id: row.id,
            source_account_id: row.source_account_id,
            destination_account_id: row.destination_account_id,
            amount: Money::from_cents(row.amount_cents),
            kind: row.kind,
            description: row.description,
            timestamp: row.timestamp,
            outcome: row.outcome,
        }
    }
}

const SELECT_TRANSACTION: &str = r#"
    SELECT
        id,
        source_account_id,
        destination_account_id,
        amount_cents,
        kind,
        description,
        timestamp,
        outcome
    FROM transactions
"#;

/// Repository for transaction records.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Appends a record.
    ///
    /// ## Errors
    /// - `UniqueViolation` if the id was used before
    /// - `ForeignKeyViolation` if an account reference does not exist
    pub async fn insert(&self, tx: &Transaction) -> DbResult<()> {
        Self::insert_with(&self.pool, tx).await
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let row =
            sqlx::query_as::<_, TransactionRow>(&format!("{SELECT_TRANSACTION} WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Transaction::from))
    }

    /// Records where the account is source or destination, newest first.
    pub async fn list_by_account(&self, account_id: &str) -> DbResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(&format!(
            r#"{SELECT_TRANSACTION}
            WHERE source_account_id = ?1 OR destination_account_id = ?1
            ORDER BY timestamp DESC, rowid DESC"#
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(account_id = %account_id, count = rows.len(), "Loaded history");
        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    /// Total number of records.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Inserts on any executor (pool or open transaction).
    pub(crate) async fn insert_with<'e, E>(executor: E, tx: &Transaction) -> DbResult<()>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, source_account_id, destination_account_id, amount_cents,
                kind, description, timestamp, outcome
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&tx.id)
        .bind(tx.source_account_id.as_deref())
        .bind(tx.destination_account_id.as_deref())
        .bind(tx.amount.cents())
        .bind(tx.kind)
        .bind(&tx.description)
        .bind(tx.timestamp)
        .bind(tx.outcome)
        .execute(executor)
        .await
        .map_err(|e| DbError::from(e).with_value(&tx.id))?;

        debug!(transaction_id = %tx.id, kind = %tx.kind, "Appended transaction");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Duration;
    use tally_core::{Account, AccountClass, PrincipalId};

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for id in ["ACC1", "ACC2"] {
            db.accounts()
                .insert(&Account {
                    id: id.to_string(),
                    owner_id: PrincipalId::new("alice"),
                    display_name: "Alice".to_string(),
                    balance: Money::from_cents(100_000),
                    class: AccountClass::Savings,
                    minimum_balance: Money::from_cents(10_000),
                    active: true,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_two_sided() {
        let db = setup().await;
        let repo = db.transactions();

        let mut deposit = Transaction::single("T1", TransactionKind::Deposit, "ACC1", Money::from_cents(500));
        deposit.timestamp = Utc::now() - Duration::minutes(5);
        let transfer = Transaction::transfer("T2", "ACC2", "ACC1", Money::from_cents(300));
        let other = Transaction::single("T3", TransactionKind::Withdrawal, "ACC2", Money::from_cents(100));

        repo.insert(&deposit).await.unwrap();
        repo.insert(&transfer).await.unwrap();
        repo.insert(&other).await.unwrap();

        let history = repo.list_by_account("ACC1").await.unwrap();
        let ids: Vec<&str> = history.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["T2", "T1"]);
        assert_eq!(history[0].destination_account_id.as_deref(), Some("ACC1"));
        assert_eq!(history[1].description, "Cash deposit");

        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let db = setup().await;
        let repo = db.transactions();
        let tx = Transaction::single("T1", TransactionKind::Deposit, "ACC1", Money::from_cents(1));

        repo.insert(&tx).await.unwrap();
        let err = repo.insert(&tx).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "T1"));
    }

    #[tokio::test]
    async fn test_unknown_account_reference_is_rejected() {
        let db = setup().await;
        let tx = Transaction::single("T1", TransactionKind::Deposit, "GHOST", Money::from_cents(1));
        let err = db.transactions().insert(&tx).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_round_trip_preserves_fields() {
        let db = setup().await;
        let tx = Transaction::transfer("T9", "ACC1", "ACC2", Money::from_cents(12_345));
        db.transactions().insert(&tx).await.unwrap();

        let found = db.transactions().get_by_id("T9").await.unwrap().unwrap();
        assert_eq!(found.kind, TransactionKind::Transfer);
        assert_eq!(found.outcome, TransactionOutcome::Committed);
        assert_eq!(found.amount.cents(), 12_345);
        assert_eq!(found.source_account_id.as_deref(), Some("ACC1"));
    }
}
