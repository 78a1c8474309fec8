//! # tally-core: Pure Ledger Domain for Tally
//!
//! This crate is the **vocabulary** of the Tally ledger. It contains the
//! domain types, money arithmetic and every policy the engine enforces, with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             Caller (CLI / API, out of scope)                    │   │
//! │  │    principal id + request ──► result or tagged LedgerError      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │       tally-engine: TransactionEngine + AccountDirectory        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ uses                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌──────────┐ ┌───────┐  │   │
//! │  │   │  types  │ │  money  │ │validation│ │ownership │ │ store │  │   │
//! │  │   │ Account │ │  Money  │ │ amounts  │ │authorize │ │ trait │  │   │
//! │  │   │   Tx    │ │         │ │   ids    │ │          │ │       │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └──────────┘ └───────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO LOCKS • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                ▲ implements LedgerStore                 │
//! │  ┌─────────────────────────────┴───────────────────────────────────┐   │
//! │  │                  tally-db (SQLite Ledger Store)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Account, Transaction, PrincipalId
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - LedgerError taxonomy and validation errors
//! - [`validation`] - Amount policy and field validation
//! - [`ids`] - Transaction / account id generation
//! - [`ownership`] - The Ownership Guard predicate
//! - [`alerts`] - Alert thresholds and balance classification
//! - [`events`] - Post-commit notification events
//! - [`store`] - The `LedgerStore` persistence contract
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::validation::parse_amount;
//! use tally_core::Money;
//!
//! let amount = parse_amount("400.00").unwrap();
//! let balance = Money::from_cents(50_000);
//! let floor = Money::from_cents(10_000);
//!
//! // Exactly the headroom above the floor may leave the account
//! assert!(balance - amount >= floor);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod alerts;
pub mod error;
pub mod events;
pub mod ids;
pub mod money;
pub mod ownership;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use alerts::{AlertPolicy, BalanceStatus, Breach};
pub use error::{AmountIssue, ErrorKind, LedgerError, LedgerResult, ValidationError};
pub use events::{EventKind, LedgerEvent};
pub use ids::{IdSource, RandomIdSource};
pub use money::Money;
pub use store::{BalanceUpdate, LedgerStore, StoreError, StoreResult};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Minimum balance (100.00) given to new accounts when the request names none.
pub const DEFAULT_MINIMUM_BALANCE: Money = Money::from_cents(10_000);
