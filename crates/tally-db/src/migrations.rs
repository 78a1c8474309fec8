//! # Database Migrations
//!
//! SQL migrations embedded at compile time from `migrations/sqlite/`.
//!
//! ## Current Schema
//! ```text
//! 001_initial_schema.sql
//!   accounts      id PK, owner_id, display_name, balance_cents,
//!                 class, minimum_balance_cents, active, created_at
//!   transactions  id PK, source_account_id FK, destination_account_id FK,
//!                 amount_cents > 0, kind, description, timestamp, outcome
//! ```
//!
//! ## Adding Migrations
//! New files get the next sequence number (`002_...sql`). Applied files are
//! never edited: sqlx checksums them and refuses to start on a mismatch.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every pending migration, in filename order.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!(
        embedded = MIGRATOR.migrations.len(),
        "Applying ledger migrations"
    );
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // No bookkeeping table yet means nothing applied
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}
