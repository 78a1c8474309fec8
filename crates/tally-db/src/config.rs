//! Ledger configuration.
//!
//! Loaded from environment variables with fallback to defaults.
//!
//! | Variable                           | Default    |
//! |------------------------------------|------------|
//! | `TALLY_DB_PATH`                    | `tally.db` |
//! | `TALLY_DB_MAX_CONNECTIONS`         | `5`        |
//! | `TALLY_DEFAULT_MIN_BALANCE`        | `100.00`   |
//! | `TALLY_LOW_BALANCE_THRESHOLD`      | `500.00`   |
//! | `TALLY_CRITICAL_BALANCE_THRESHOLD` | `100.00`   |
//! | `TALLY_HIGH_VALUE_AMOUNT`          | `5000.00`  |
//! | `TALLY_LARGE_WITHDRAWAL_PCT`       | `80`       |

use std::env;
use std::path::PathBuf;

use tally_core::{AlertPolicy, Money};

/// Runtime configuration of a ledger process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Floor for accounts opened without one
    pub default_minimum_balance: Money,

    /// Alert thresholds
    pub alerts: AlertPolicy,
}

impl LedgerConfig {
    /// Load configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let money = |key: &str, default: &str| -> Result<Money, ConfigError> {
            let raw = lookup(key).unwrap_or_else(|| default.to_string());
            raw.trim()
                .parse::<Money>()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        };

        let config = LedgerConfig {
            database_path: lookup("TALLY_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("tally.db")),

            max_connections: lookup("TALLY_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("TALLY_DB_MAX_CONNECTIONS".to_string()))?,

            default_minimum_balance: money("TALLY_DEFAULT_MIN_BALANCE", "100.00")?,

            alerts: AlertPolicy {
                low_balance: money("TALLY_LOW_BALANCE_THRESHOLD", "500.00")?,
                critical_balance: money("TALLY_CRITICAL_BALANCE_THRESHOLD", "100.00")?,
                high_value: money("TALLY_HIGH_VALUE_AMOUNT", "5000.00")?,
                large_withdrawal_bps: lookup("TALLY_LARGE_WITHDRAWAL_PCT")
                    .unwrap_or_else(|| "80".to_string())
                    .parse::<u32>()
                    .ok()
                    .filter(|pct| *pct <= 100)
                    .map(|pct| pct * 100)
                    .ok_or_else(|| {
                        ConfigError::InvalidValue("TALLY_LARGE_WITHDRAWAL_PCT".to_string())
                    })?,
            },
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "TALLY_DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        if config.default_minimum_balance.is_negative() {
            return Err(ConfigError::InvalidValue(
                "TALLY_DEFAULT_MIN_BALANCE".to_string(),
            ));
        }
        if config.alerts.critical_balance > config.alerts.low_balance {
            return Err(ConfigError::InconsistentThresholds);
        }

        Ok(config)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Critical balance threshold is above the low balance threshold")]
    InconsistentThresholds,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<LedgerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LedgerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.database_path, PathBuf::from("tally.db"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.default_minimum_balance, Money::from_cents(10_000));
        assert_eq!(config.alerts, AlertPolicy::default());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("TALLY_DB_PATH", "/var/lib/tally/ledger.db"),
            ("TALLY_DEFAULT_MIN_BALANCE", "0.00"),
            ("TALLY_LARGE_WITHDRAWAL_PCT", "50"),
        ])
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/var/lib/tally/ledger.db"));
        assert!(config.default_minimum_balance.is_zero());
        assert_eq!(config.alerts.large_withdrawal_bps, 5000);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("TALLY_HIGH_VALUE_AMOUNT", "lots")]),
            Err(ConfigError::InvalidValue(key)) if key == "TALLY_HIGH_VALUE_AMOUNT"
        ));
        assert!(load(&[("TALLY_LARGE_WITHDRAWAL_PCT", "120")]).is_err());
        assert!(load(&[("TALLY_DB_MAX_CONNECTIONS", "0")]).is_err());
        assert!(matches!(
            load(&[("TALLY_CRITICAL_BALANCE_THRESHOLD", "900.00")]),
            Err(ConfigError::InconsistentThresholds)
        ));
    }
}
