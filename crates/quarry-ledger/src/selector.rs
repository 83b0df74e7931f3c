//! Quota-aware account selection.

use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use quarry_core::{AccountId, QuotaKind};
use tracing::{debug, info};

/// Picks the accounts that still have quota for an operation.
#[derive(Debug, Clone, Copy)]
pub struct AccountSelector<'a> {
    ledger: &'a Ledger,
}

impl<'a> AccountSelector<'a> {
    /// Create a selector over a ledger.
    #[must_use]
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    /// Accounts whose counter for `kind` is strictly below its limit.
    ///
    /// The order is the ledger's account order (lexicographic by id).
    ///
    /// # Errors
    /// Returns `LedgerError::NoEligibleAccounts` when no account qualifies.
    /// This is terminal for the current operation.
    pub fn eligible(&self, kind: QuotaKind) -> Result<Vec<AccountId>> {
        let limit = self.ledger.limits().limit(kind);

        let eligible: Vec<AccountId> = self
            .ledger
            .accounts()
            .filter(|(id, usage)| {
                let used = usage.get(kind);
                if used < limit {
                    true
                } else {
                    debug!(account = %id, kind = %kind, used, limit, "account at quota limit");
                    false
                }
            })
            .map(|(id, _)| id.clone())
            .collect();

        if eligible.is_empty() {
            info!(kind = %kind, "no eligible accounts");
            return Err(LedgerError::NoEligibleAccounts { kind });
        }

        Ok(eligible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::QuotaLimits;

    fn account(id: &str) -> AccountId {
        AccountId::new(id).expect("valid account ID")
    }

    fn ledger_with(accounts: &[&str]) -> Ledger {
        let mut ledger = Ledger::new(QuotaLimits {
            searches: 900,
            profile_visits: 80,
            day_length_secs: 86_400,
        });
        for id in accounts {
            ledger.register_account(account(id));
        }
        ledger
    }

    #[test]
    fn test_all_fresh_accounts_are_eligible_in_order() {
        let ledger = ledger_with(&["b", "a"]);
        let eligible = AccountSelector::new(&ledger)
            .eligible(QuotaKind::ProfileVisits)
            .expect("eligible accounts");
        assert_eq!(eligible, vec![account("a"), account("b")]);
    }

    #[test]
    fn test_account_at_visit_limit_is_excluded() {
        let mut ledger = ledger_with(&["a", "b"]);
        ledger
            .record_usage(&account("a"), QuotaKind::ProfileVisits, 80)
            .expect("record usage");

        let eligible = AccountSelector::new(&ledger)
            .eligible(QuotaKind::ProfileVisits)
            .expect("eligible accounts");
        assert_eq!(eligible, vec![account("b")]);

        // The search counter is independent
        let eligible = AccountSelector::new(&ledger)
            .eligible(QuotaKind::Searches)
            .expect("eligible accounts");
        assert_eq!(eligible.len(), 2);
    }

    #[test]
    fn test_sole_exhausted_account_yields_no_eligible_accounts() {
        let mut ledger = ledger_with(&["a"]);
        ledger
            .record_usage(&account("a"), QuotaKind::ProfileVisits, 80)
            .expect("record usage");

        let err = AccountSelector::new(&ledger)
            .eligible(QuotaKind::ProfileVisits)
            .expect_err("no eligible accounts");
        assert!(matches!(
            err,
            LedgerError::NoEligibleAccounts {
                kind: QuotaKind::ProfileVisits
            }
        ));
    }

    #[test]
    fn test_empty_ledger_has_no_eligible_accounts() {
        let ledger = ledger_with(&[]);
        assert!(AccountSelector::new(&ledger).eligible(QuotaKind::Searches).is_err());
    }
}
