//! # Database Pool Management
//!
//! Opens the SQLite ledger file and hands out repositories.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  LedgerConfig::load()  ──►  DbConfig::from(&config)                     │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                      Database::new(db_config).await                     │
//! │                      ├── WAL journal, NORMAL sync, FKs on               │
//! │                      ├── SqlitePool (max_connections)                   │
//! │                      └── embedded migrations                            │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │               db.ledger_store() ──► AccountDirectory ──► engine         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Foreign keys matter here: a transaction row may only reference accounts
//! that exist. SQLite ships with them off.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::LedgerConfig;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::account::AccountRepository;
use crate::repository::transaction::TransactionRepository;
use crate::store::SqliteLedgerStore;

// =============================================================================
// Configuration
// =============================================================================

/// Pool settings for the ledger database.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("./tally.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first connect.
    pub database_path: PathBuf,

    /// Default: 5
    pub max_connections: u32,

    /// Default: 1
    pub min_connections: u32,

    /// Wait for a pooled connection before giving up with `PoolExhausted`.
    pub acquire_timeout: Duration,

    /// How long a writer waits on SQLite's file lock before `SQLITE_BUSY`.
    /// Concurrent commits from several connections queue here.
    pub busy_timeout: Duration,

    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Private in-memory database for tests, pinned to one connection.
    pub fn in_memory() -> Self {
        DbConfig::new(":memory:")
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
    }
}

impl From<&LedgerConfig> for DbConfig {
    fn from(config: &LedgerConfig) -> Self {
        DbConfig::new(&config.database_path).max_connections(config.max_connections)
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the ledger database. Cheap to clone (shares the pool).
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connects, configures SQLite and (optionally) migrates.
    ///
    /// ## Errors
    /// - `ConnectionFailed` if the file cannot be opened or created
    /// - `MigrationFailed` if an embedded migration does not apply
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening ledger database"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());
        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout)
            // An idle in-memory connection takes its database with it
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(
            max_connections = config.max_connections,
            "Connection pool ready"
        );

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Raw pool, for queries no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the account repository.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let owned = db.accounts().list_by_owner(&principal).await?;
    /// ```
    pub fn accounts(&self) -> AccountRepository {
        AccountRepository::new(self.pool.clone())
    }

    /// Returns the transaction repository.
    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.pool.clone())
    }

    /// This database as the engine's `LedgerStore`.
    pub fn ledger_store(&self) -> SqliteLedgerStore {
        SqliteLedgerStore::new(self.clone())
    }

    /// Closes every pooled connection. Later queries fail.
    pub async fn close(&self) {
        info!("Closing ledger database");
        self.pool.close().await;
    }

    /// Whether a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
