//! # tally-engine: Account Directory and Transaction Engine
//!
//! Runs ledger operations against any [`LedgerStore`](tally_core::LedgerStore).
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   caller ──► TransactionEngine ──► AccountDirectory ──► dyn LedgerStore │
//! │                   │                 (cache + locks)      │              │
//! │                   │                                      ├─ SqliteLedgerStore
//! │                   ▼                                      └─ MemoryLedgerStore
//! │              dyn EventSink                                              │
//! │          (post-commit events)                                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`directory`] - Write-through account cache and per-account locks
//! - [`engine`] - Deposit, withdraw, transfer, history
//! - [`sink`] - Event delivery seam
//! - [`memory`] - In-memory store

pub mod directory;
pub mod engine;
pub mod memory;
pub mod sink;

#[cfg(test)]
mod testing;

pub use directory::{AccountDirectory, AccountLocks};
pub use engine::{AccountStanding, Stage, TransactionEngine};
pub use memory::MemoryLedgerStore;
pub use sink::{ChannelSink, EventSink, NoopSink};
