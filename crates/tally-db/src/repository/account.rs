//! # Account Repository
//!
//! Database operations for accounts.
//!
//! ## Balance Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  update_balance(id, new)         unconditional overwrite                │
//! │                                  (directory write-through path)         │
//! │                                                                         │
//! │  compare_and_swap(conn, id,      UPDATE ... WHERE id = ?1               │
//! │                   expected, new)   AND balance_cents = ?2               │
//! │                                  0 rows + row exists → Conflict         │
//! │                                  0 rows + no row     → NotFound         │
//! │                                  (runs inside the commit transaction)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{Account, AccountClass, Money, PrincipalId};

/// Row shape of the `accounts` table.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: String,
    owner_id: String,
    display_name: String,
    balance_cents: i64,
    class: AccountClass,
    minimum_balance_cents: i64,
    active: bool,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            owner_id: PrincipalId::new(row.owner_id),
            display_name: row.display_name,
            balance: Money::from_cents(row.balance_cents),
            class: row.class,
            minimum_balance: Money::from_cents(row.minimum_balance_cents),
            active: row.active,
            created_at: row.created_at,
        }
    }
}

const SELECT_ACCOUNT: &str = r#"
    SELECT
        id,
        owner_id,
        display_name,
        balance_cents,
        class,
        minimum_balance_cents,
        active,
        created_at
    FROM accounts
"#;

/// Repository for account database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.accounts();
///
/// repo.insert(&account).await?;
/// let found = repo.get_by_id("ACC17000000000001234").await?;
/// ```
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Creates a new AccountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// Gets an account by id, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!("{SELECT_ACCOUNT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Account::from))
    }

    /// Inserts a new account.
    ///
    /// ## Errors
    /// - `UniqueViolation` if the id is taken
    pub async fn insert(&self, account: &Account) -> DbResult<()> {
        Self::insert_with(&self.pool, account).await
    }

    /// Overwrites an account's balance.
    ///
    /// ## Errors
    /// - `NotFound` if no account has this id
    pub async fn update_balance(&self, id: &str, new_balance: Money) -> DbResult<()> {
        let result = sqlx::query("UPDATE accounts SET balance_cents = ?2 WHERE id = ?1")
            .bind(id)
            .bind(new_balance.cents())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account", id));
        }

        debug!(account_id = %id, balance = %new_balance, "Balance overwritten");
        Ok(())
    }

    /// Active accounts of `owner`, oldest first.
    pub async fn list_by_owner(&self, owner: &PrincipalId) -> DbResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            "{SELECT_ACCOUNT} WHERE owner_id = ?1 AND active = 1 ORDER BY created_at, id"
        ))
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await?;

        debug!(owner = %owner, count = rows.len(), "Listed accounts");
        Ok(rows.into_iter().map(Account::from).collect())
    }

    /// Soft-deletes an account. Its transactions stay readable.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE accounts SET active = 0 WHERE id = ?1 AND active = 1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Account (active)", id));
        }

        Ok(())
    }

    /// Sum of all balances, in cents.
    pub async fn total_balance(&self) -> DbResult<Money> {
        let cents: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(balance_cents), 0) FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(Money::from_cents(cents))
    }

    // =========================================================================
    // Transaction-scoped helpers
    // =========================================================================

    /// Inserts on any executor (pool or open transaction).
    pub(crate) async fn insert_with<'e, E>(executor: E, account: &Account) -> DbResult<()>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, owner_id, display_name, balance_cents, class,
                minimum_balance_cents, active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&account.id)
        .bind(account.owner_id.as_str())
        .bind(&account.display_name)
        .bind(account.balance.cents())
        .bind(account.class)
        .bind(account.minimum_balance.cents())
        .bind(account.active)
        .bind(account.created_at)
        .execute(executor)
        .await
        .map_err(|e| DbError::from(e).with_value(&account.id))?;

        debug!(account_id = %account.id, "Inserted account");
        Ok(())
    }

    /// Sets the balance only if it still equals `expected`.
    pub(crate) async fn compare_and_swap(
        conn: &mut SqliteConnection,
        id: &str,
        expected: Money,
        new_balance: Money,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE accounts SET balance_cents = ?3 WHERE id = ?1 AND balance_cents = ?2",
        )
        .bind(id)
        .bind(expected.cents())
        .bind(new_balance.cents())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM accounts WHERE id = ?1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;

        if exists {
            Err(DbError::Conflict {
                account_id: id.to_string(),
            })
        } else {
            Err(DbError::not_found("Account", id))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn account(id: &str, owner: &str, balance: i64) -> Account {
        Account {
            id: id.to_string(),
            owner_id: PrincipalId::new(owner),
            display_name: "Test Holder".to_string(),
            balance: Money::from_cents(balance),
            class: AccountClass::Current,
            minimum_balance: Money::from_cents(10_000),
            active: true,
            created_at: Utc::now(),
        }
    }

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = setup().await;
        let repo = db.accounts();
        let original = account("ACC1", "alice", 50_000);

        repo.insert(&original).await.unwrap();
        let found = repo.get_by_id("ACC1").await.unwrap().unwrap();

        assert_eq!(found.owner_id, original.owner_id);
        assert_eq!(found.balance.cents(), 50_000);
        assert_eq!(found.class, AccountClass::Current);
        assert!(found.active);
        assert!(repo.get_by_id("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_names_the_id() {
        let db = setup().await;
        let repo = db.accounts();
        repo.insert(&account("ACC1", "alice", 0)).await.unwrap();

        let err = repo.insert(&account("ACC1", "bob", 0)).await.unwrap_err();
        match err {
            DbError::UniqueViolation { field, value } => {
                assert!(field.starts_with("accounts"));
                assert_eq!(value, "ACC1");
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_balance_and_missing_account() {
        let db = setup().await;
        let repo = db.accounts();
        repo.insert(&account("ACC1", "alice", 50_000)).await.unwrap();

        repo.update_balance("ACC1", Money::from_cents(42)).await.unwrap();
        assert_eq!(repo.get_by_id("ACC1").await.unwrap().unwrap().balance.cents(), 42);

        assert!(matches!(
            repo.update_balance("NOPE", Money::zero()).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_by_owner_excludes_deactivated() {
        let db = setup().await;
        let repo = db.accounts();
        repo.insert(&account("ACC1", "alice", 0)).await.unwrap();
        repo.insert(&account("ACC2", "alice", 0)).await.unwrap();
        repo.insert(&account("ACC3", "bob", 0)).await.unwrap();
        repo.deactivate("ACC2").await.unwrap();

        let owned = repo.list_by_owner(&PrincipalId::new("alice")).await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].id, "ACC1");

        assert!(repo.deactivate("ACC2").await.is_err());
    }

    #[tokio::test]
    async fn test_compare_and_swap() {
        let db = setup().await;
        let repo = db.accounts();
        repo.insert(&account("ACC1", "alice", 1_000)).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        AccountRepository::compare_and_swap(
            &mut conn,
            "ACC1",
            Money::from_cents(1_000),
            Money::from_cents(900),
        )
        .await
        .unwrap();

        let stale = AccountRepository::compare_and_swap(
            &mut conn,
            "ACC1",
            Money::from_cents(1_000),
            Money::from_cents(800),
        )
        .await;
        assert!(matches!(stale, Err(DbError::Conflict { .. })));

        let missing =
            AccountRepository::compare_and_swap(&mut conn, "NOPE", Money::zero(), Money::zero())
                .await;
        assert!(matches!(missing, Err(DbError::NotFound { .. })));
    }
}
