//! # Event Sinks
//!
//! Where the engine hands post-commit [`LedgerEvent`]s.
//!
//! Publishing is fire-and-forget. A sink must not block and cannot fail the
//! operation that produced the event.

use tokio::sync::mpsc;
use tracing::warn;

use tally_core::LedgerEvent;

/// Receiver of ledger events (the notification collaborator's inbox).
pub trait EventSink: Send + Sync {
    fn publish(&self, event: LedgerEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn publish(&self, _event: LedgerEvent) {}
}

/// Forwards events into an unbounded tokio channel.
///
/// ## Example
/// ```rust
/// use tally_engine::sink::{ChannelSink, EventSink};
/// use tally_core::{Account, AccountClass, LedgerEvent, Money, PrincipalId};
///
/// let (sink, mut rx) = ChannelSink::new();
/// let account = Account {
///     id: "ACC1".into(),
///     owner_id: PrincipalId::new("alice"),
///     display_name: "Alice".into(),
///     balance: Money::from_cents(20_000),
///     class: AccountClass::Savings,
///     minimum_balance: Money::from_cents(10_000),
///     active: true,
///     created_at: chrono::Utc::now(),
/// };
/// sink.publish(LedgerEvent::opened(&account));
/// assert_eq!(rx.try_recv().unwrap().account_id, "ACC1");
/// ```
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<LedgerEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiver that drains it.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LedgerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelSink { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, event: LedgerEvent) {
        if let Err(e) = self.tx.send(event) {
            warn!(
                account_id = %e.0.account_id,
                "Event receiver dropped, event discarded"
            );
        }
    }
}
