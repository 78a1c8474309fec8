//! # Validation Module
//!
//! Amount policy and input validation for Tally.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (CLI / API)                                           │
//! │  ├── Quantizes user input to 0.01                                      │
//! │  └── parse_amount() for decimal text                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine gate (Validating stage)                               │
//! │  └── THIS MODULE: positive amount, ids, names                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store (SQLite)                                               │
//! │  ├── PRIMARY KEY on account / transaction ids                          │
//! │  └── CHECK (amount_cents > 0)                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{parse_amount, validate_amount};
//!
//! let amount = parse_amount("400.00").unwrap();
//! validate_amount(amount).unwrap();
//!
//! assert!(parse_amount("0.005").is_err());
//! ```

use crate::error::{AmountIssue, LedgerError, ValidationError};
use crate::money::Money;
use crate::types::PrincipalId;

/// Result type for field validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted account id.
pub const MAX_ACCOUNT_ID_LEN: usize = 32;

/// Longest accepted account holder name.
pub const MAX_DISPLAY_NAME_LEN: usize = 100;

// =============================================================================
// Amount Policy
// =============================================================================

/// Parses caller-supplied decimal text into an amount.
///
/// ## Rules
/// - At most two fractional digits (no rounding is ever performed)
/// - Must be strictly positive
///
/// ## Example
/// ```rust
/// use tally_core::validation::parse_amount;
/// use tally_core::ErrorKind;
///
/// assert_eq!(parse_amount("0.01").unwrap().cents(), 1);
/// assert_eq!(parse_amount("0.00").unwrap_err().kind(), ErrorKind::InvalidAmount);
/// assert_eq!(parse_amount("1.234").unwrap_err().kind(), ErrorKind::InvalidAmount);
/// ```
pub fn parse_amount(text: &str) -> Result<Money, LedgerError> {
    let amount = text
        .parse::<Money>()
        .map_err(|reason| LedgerError::invalid_amount(Money::zero(), reason))?;
    validate_amount(amount)?;
    Ok(amount)
}

/// Validates an amount for deposit, withdrawal or transfer.
///
/// ## Rules
/// - Must be positive (> 0)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  withdraw(owner, ACC1, amount)                                          │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_amount(amount) ← THIS FUNCTION                               │
/// │       │                                                                 │
/// │       ├── amount <= 0? → InvalidAmount { reason: NotPositive }         │
/// │       │                                                                 │
/// │       └── OK → resolve account                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_amount(amount: Money) -> Result<(), LedgerError> {
    if !amount.is_positive() {
        return Err(LedgerError::invalid_amount(amount, AmountIssue::NotPositive));
    }
    Ok(())
}

/// Validates the opening deposit of a new account (zero allowed).
pub fn validate_initial_deposit(amount: Money) -> Result<(), LedgerError> {
    if amount.is_negative() {
        return Err(LedgerError::invalid_amount(amount, AmountIssue::NotPositive));
    }
    Ok(())
}

/// Validates a minimum-balance floor (zero allowed, negative is not).
pub fn validate_minimum_balance(amount: Money) -> Result<(), LedgerError> {
    if amount.is_negative() {
        return Err(LedgerError::invalid_amount(amount, AmountIssue::NotPositive));
    }
    Ok(())
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates an account id.
///
/// ## Rules
/// - Must not be empty
/// - At most 32 characters
/// - ASCII letters and digits only
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_account_id;
///
/// assert!(validate_account_id("ACC17000000000001234").is_ok());
/// assert!(validate_account_id("").is_err());
/// assert!(validate_account_id("ACC-1").is_err());
/// ```
pub fn validate_account_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "account_id".to_string(),
        });
    }

    if id.len() > MAX_ACCOUNT_ID_LEN {
        return Err(ValidationError::TooLong {
            field: "account_id".to_string(),
            max: MAX_ACCOUNT_ID_LEN,
        });
    }

    if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "account_id".to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }

    Ok(())
}

/// Validates an account holder name.
///
/// ## Rules
/// - Must not be empty
/// - At most 100 characters
pub fn validate_display_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "display_name".to_string(),
        });
    }

    if name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "display_name".to_string(),
            max: MAX_DISPLAY_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a principal id (must be non-blank).
pub fn validate_principal(principal: &PrincipalId) -> ValidationResult<()> {
    if principal.as_str().trim().is_empty() {
        return Err(ValidationError::Required {
            field: "principal".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(Money::from_cents(1)).is_ok());
        assert_eq!(
            validate_amount(Money::zero()).unwrap_err(),
            LedgerError::invalid_amount(Money::zero(), AmountIssue::NotPositive)
        );
        assert_eq!(
            validate_amount(Money::from_cents(-100)).unwrap_err().kind(),
            ErrorKind::InvalidAmount
        );
    }

    #[test]
    fn test_parse_amount_reasons() {
        match parse_amount("10.999").unwrap_err() {
            LedgerError::InvalidAmount { reason, .. } => {
                assert_eq!(reason, AmountIssue::NotQuantized)
            }
            other => panic!("unexpected {other:?}"),
        }
        match parse_amount("-1.00").unwrap_err() {
            LedgerError::InvalidAmount { amount, reason } => {
                assert_eq!(amount.cents(), -100);
                assert_eq!(reason, AmountIssue::NotPositive);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_initial_deposit_allows_zero() {
        assert!(validate_initial_deposit(Money::zero()).is_ok());
        assert!(validate_initial_deposit(Money::from_cents(-1)).is_err());
        assert!(validate_minimum_balance(Money::zero()).is_ok());
    }

    #[test]
    fn test_validate_account_id() {
        assert!(validate_account_id("ACC1").is_ok());
        assert!(validate_account_id("   ").is_err());
        assert!(validate_account_id("has space").is_err());
        assert!(validate_account_id(&"A".repeat(40)).is_err());
    }

    #[test]
    fn test_validate_display_name() {
        assert!(validate_display_name("Alice Example").is_ok());
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name(&"A".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_principal() {
        assert!(validate_principal(&PrincipalId::new("alice")).is_ok());
        assert!(validate_principal(&PrincipalId::new(" ")).is_err());
    }
}
