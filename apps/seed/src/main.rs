//! # Tally Seed
//!
//! Populates a ledger database with demo accounts and activity.
//!
//! ## Usage
//! ```bash
//! # Four demo accounts (default)
//! cargo run -p tally-seed
//!
//! # More accounts, custom database
//! TALLY_DB_PATH=./data/demo.db cargo run -p tally-seed -- --accounts 12
//! ```
//!
//! Every account is opened, credited and debited through the
//! [`TransactionEngine`], so the seeded data obeys the same rules as live
//! traffic: rejected operations (a withdrawal below the floor, say) are
//! logged and leave nothing behind.

use std::env;
use std::sync::Arc;

use tally_core::{AccountClass, Money, OpenAccount, PrincipalId};
use tally_db::{Database, DbConfig, LedgerConfig};
use tally_engine::{AccountDirectory, ChannelSink, TransactionEngine};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Demo account holders
const PRINCIPALS: &[&str] = &["alice", "bob", "carol", "dave"];

const DEFAULT_ACCOUNTS: usize = 4;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut accounts = DEFAULT_ACCOUNTS;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--accounts" | "-n" => {
                if i + 1 < args.len() {
                    accounts = args[i + 1].parse().unwrap_or(DEFAULT_ACCOUNTS);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: tally-seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --accounts <N>  Number of demo accounts (default: {DEFAULT_ACCOUNTS})");
                println!("  -h, --help          Show this help message");
                println!();
                println!("The database path and thresholds come from TALLY_* variables.");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    init_tracing();

    let config = LedgerConfig::load()?;
    info!(
        database = %config.database_path.display(),
        accounts,
        "Seeding ledger"
    );

    let db = Database::new(DbConfig::from(&config)).await?;

    let existing = db.transactions().count().await?;
    if existing > 0 {
        warn!(existing, "Ledger already has transactions, skipping seed");
        println!("Delete the database file to regenerate.");
        db.close().await;
        return Ok(());
    }

    let (sink, mut events) = ChannelSink::new();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => info!(target: "tally::events", "{line}"),
                Err(e) => warn!(error = %e, "Unprintable event"),
            }
        }
    });

    let directory = Arc::new(AccountDirectory::new(Arc::new(db.ledger_store())));
    let engine = TransactionEngine::new(directory)
        .with_event_sink(Arc::new(sink))
        .with_alert_policy(config.alerts)
        .with_default_minimum_balance(config.default_minimum_balance);

    // Open
    let mut opened = Vec::with_capacity(accounts);
    for n in 0..accounts {
        let owner = PrincipalId::new(PRINCIPALS[n % PRINCIPALS.len()]);
        let request = OpenAccount {
            display_name: format!("{} #{}", owner, n / PRINCIPALS.len() + 1),
            class: if n % 2 == 0 {
                AccountClass::Savings
            } else {
                AccountClass::Current
            },
            initial_deposit: opening_deposit(n),
            minimum_balance: None,
        };
        match engine.open_account(&owner, request).await {
            Ok(account) => opened.push((owner, account.id)),
            Err(e) => warn!(owner = %owner, error = %e, "Could not open demo account"),
        }
    }

    // Activity
    for (n, (owner, account_id)) in opened.iter().enumerate() {
        if let Err(e) = engine.deposit(owner, account_id, activity_amount(n, 3)).await {
            warn!(
                account_id = %account_id,
                error = %e,
                transient = e.is_transient(),
                "Deposit rejected"
            );
        }
        if let Err(e) = engine.withdraw(owner, account_id, activity_amount(n, 7)).await {
            warn!(
                account_id = %account_id,
                error = %e,
                transient = e.is_transient(),
                "Withdrawal rejected"
            );
        }
        if opened.len() > 1 {
            let (_, to) = &opened[(n + 1) % opened.len()];
            if let Err(e) = engine
                .transfer(owner, account_id, to, activity_amount(n, 11))
                .await
            {
                warn!(
                    from = %account_id,
                    to = %to,
                    error = %e,
                    transient = e.is_transient(),
                    "Transfer rejected"
                );
            }
        }
    }

    // Report
    println!();
    println!("Balances");
    println!("========");
    for name in PRINCIPALS {
        let owner = PrincipalId::new(*name);
        for standing in engine.balance_report(&owner).await? {
            let history = engine.history(&owner, &standing.account.id).await?;
            println!(
                "  {:<8} {:<12} {:>12} {:<8} {} transactions",
                name,
                standing.account.id,
                standing.account.balance.to_string(),
                format!("{:?}", standing.status),
                history.len()
            );
        }
    }

    // Closing the engine drops the last sink sender, ending the printer
    drop(engine);
    if let Err(e) = printer.await {
        warn!(error = %e, "Event printer stopped abnormally");
    }

    let transactions = db.transactions().count().await?;
    let total = db.accounts().total_balance().await?;
    info!(transactions, total = %total, "Seed complete");
    db.close().await;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// $200.00 - $2,199.00, varying per account.
fn opening_deposit(n: usize) -> Money {
    Money::from_major_minor(200 + ((n * 487) % 2000) as i64, 0)
}

/// $5.00 - $904.99; large enough that some withdrawals hit the floor.
fn activity_amount(n: usize, salt: usize) -> Money {
    Money::from_cents(500 + ((n * salt * 7919) % 90_000) as i64)
}
