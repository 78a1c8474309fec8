//! # Repository Module
//!
//! Database repository implementations for the Tally ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  SqliteLedgerStore (LedgerStore impl)                                   │
//! │       │                                                                 │
//! │       │  db.accounts().get_by_id("ACC...")                              │
//! │       ▼                                                                 │
//! │  AccountRepository              TransactionRepository                   │
//! │  ├── get_by_id                  ├── insert                              │
//! │  ├── insert                     ├── get_by_id                           │
//! │  ├── update_balance             ├── list_by_account                     │
//! │  ├── list_by_owner              └── count                               │
//! │  ├── deactivate                                                         │
//! │  └── compare_and_swap (in-transaction)                                  │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`AccountRepository`](account::AccountRepository) - Accounts and balances
//! - [`TransactionRepository`](transaction::TransactionRepository) - Append-only records

pub mod account;
pub mod transaction;
