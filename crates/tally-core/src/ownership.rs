//! # Ownership Guard
//!
//! Binds the acting principal to the accounts it may operate on.
//!
//! ```text
//!   authorize(principal, account)
//!        │
//!        ├── account.owner == principal ──► Allow
//!        │
//!        └── otherwise ──► Deny { principal, account, owner }
//!                               │
//!                               ├──► audit log line (full context)
//!                               └──► LedgerError::AccessDenied { account_id }
//!                                    (owner stripped)
//! ```

use crate::error::LedgerError;
use crate::types::{Account, PrincipalId};

/// Result of an ownership check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

/// Context of a denied access, for the audit trail only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub principal: PrincipalId,
    pub account_id: String,
    pub owner: PrincipalId,
}

impl Denial {
    /// Converts into the caller-facing error, dropping the owner.
    pub fn into_error(self) -> LedgerError {
        LedgerError::AccessDenied {
            account_id: self.account_id,
        }
    }
}

/// Stateless ownership predicate.
pub fn authorize(principal: &PrincipalId, account: &Account) -> Decision {
    if account.is_owned_by(principal) {
        Decision::Allow
    } else {
        Decision::Deny(Denial {
            principal: principal.clone(),
            account_id: account.id.clone(),
            owner: account.owner_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::AccountClass;
    use chrono::Utc;

    fn account_of(owner: &str) -> Account {
        Account {
            id: "ACC1".to_string(),
            owner_id: PrincipalId::new(owner),
            display_name: "Holder".to_string(),
            balance: Money::from_cents(50_000),
            class: AccountClass::Current,
            minimum_balance: Money::from_cents(10_000),
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_is_allowed() {
        let decision = authorize(&PrincipalId::new("p1"), &account_of("p1"));
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn test_stranger_is_denied_with_audit_context() {
        let decision = authorize(&PrincipalId::new("p2"), &account_of("p1"));
        let Decision::Deny(denial) = decision else {
            panic!("expected deny");
        };
        assert_eq!(denial.owner, PrincipalId::new("p1"));
        assert_eq!(denial.principal, PrincipalId::new("p2"));

        let err = denial.into_error();
        assert_eq!(
            err,
            LedgerError::AccessDenied {
                account_id: "ACC1".to_string()
            }
        );
        assert!(!err.to_string().contains("p1"));
    }
}
