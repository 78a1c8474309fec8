//! # tally-db: SQLite Ledger Store for Tally
//!
//! Durable storage of accounts and transaction records, exposed to the
//! engine as a [`LedgerStore`](tally_core::LedgerStore).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  TransactionEngine ──► AccountDirectory ──► dyn LedgerStore             │
//! │                                                   │                     │
//! │  ┌────────────────────────────────────────────────▼────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ AccountRepo    │    │ 001_initial  │  │   │
//! │  │   │  SqlitePool   │    │ TransactionRepo│    │  (embedded)  │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │           ▲                                                     │   │
//! │  │   SqliteLedgerStore (store.rs)      LedgerConfig (config.rs)    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                   │                                     │
//! │                              tally.db (SQLite, WAL)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Account and transaction repositories
//! - [`store`] - `LedgerStore` implementation with atomic commits
//! - [`config`] - Environment configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tally_db::{Database, DbConfig, LedgerConfig};
//! use tally_engine::{AccountDirectory, TransactionEngine};
//!
//! let config = LedgerConfig::load()?;
//! let db = Database::new(DbConfig::from(&config)).await?;
//!
//! let directory = Arc::new(AccountDirectory::new(Arc::new(db.ledger_store())));
//! let engine = TransactionEngine::new(directory)
//!     .with_alert_policy(config.alerts)
//!     .with_default_minimum_balance(config.default_minimum_balance);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, LedgerConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::SqliteLedgerStore;

pub use repository::account::AccountRepository;
pub use repository::transaction::TransactionRepository;
