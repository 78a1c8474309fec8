//! # Identifier Policy
//!
//! Transaction and account id generation.
//!
//! ## Formats
//! ```text
//!   Transaction:  TXN 20260131142501123 9f86d081
//!                 ─── ───────────────── ────────
//!                 tag UTC yyyyMMddHHmmssSSS  random (UUID v4 hex)
//!
//!   Account:      ACC 1769869501123 0042
//!                 ─── ───────────── ────
//!                 tag UTC epoch ms  random digits
//! ```
//!
//! The timestamp makes ids sort roughly by creation time; the random suffix
//! keeps two ids minted in the same millisecond apart (2^32 possibilities).
//! Collisions remain possible, so the store refuses duplicate ids and the
//! engine retries generation once before giving up.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of fresh identifiers.
///
/// The engine holds one behind an `Arc`; tests substitute a scripted source
/// to force collisions.
pub trait IdSource: Send + Sync {
    fn next_transaction_id(&self) -> String;

    fn next_account_id(&self) -> String;
}

/// Default source: coarse UTC timestamp plus a random suffix.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdSource;

impl IdSource for RandomIdSource {
    fn next_transaction_id(&self) -> String {
        transaction_id_at(Utc::now(), Uuid::new_v4())
    }

    fn next_account_id(&self) -> String {
        account_id_at(Utc::now(), Uuid::new_v4())
    }
}

/// Formats a transaction id from its parts.
pub fn transaction_id_at(now: DateTime<Utc>, entropy: Uuid) -> String {
    let suffix = entropy.simple().to_string();
    format!("TXN{}{}", now.format("%Y%m%d%H%M%S%3f"), &suffix[..8])
}

/// Formats an account id from its parts.
pub fn account_id_at(now: DateTime<Utc>, entropy: Uuid) -> String {
    let digits = entropy.as_u128() % 10_000;
    format!("ACC{}{:04}", now.timestamp_millis(), digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    use crate::validation::validate_account_id;

    #[test]
    fn test_transaction_id_format() {
        let now = Utc.with_ymd_and_hms(2026, 1, 31, 14, 25, 1).unwrap();
        let entropy = Uuid::parse_str("9f86d081-884c-4d63-a0f2-2b0b1c8d0e6f").unwrap();
        assert_eq!(transaction_id_at(now, entropy), "TXN202601311425010009f86d081");
    }

    #[test]
    fn test_account_id_is_valid_account_id() {
        let id = RandomIdSource.next_account_id();
        assert!(id.starts_with("ACC"));
        assert!(validate_account_id(&id).is_ok());
    }

    #[test]
    fn test_ids_do_not_repeat_in_a_burst() {
        let ids: HashSet<String> = (0..1000)
            .map(|_| RandomIdSource.next_transaction_id())
            .collect();
        assert_eq!(ids.len(), 1000);
    }
}
