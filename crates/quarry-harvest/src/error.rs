use quarry_core::{AccountId, ConfigError, QuotaKind};
use quarry_egress::EgressError;
use quarry_ledger::{CredentialError, LedgerError};
use quarry_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("no eligible accounts: every account has reached its {kind} limit")]
    NoEligibleAccounts { kind: QuotaKind },

    #[error("no credential configured for account {account}")]
    MissingCredential { account: AccountId },

    #[error("Ledger error: {0}")]
    Ledger(LedgerError),

    #[error("Credential error: {0}")]
    Credentials(#[from] CredentialError),

    #[error("Egress error: {0}")]
    Egress(#[from] EgressError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<LedgerError> for HarvestError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NoEligibleAccounts { kind } => Self::NoEligibleAccounts { kind },
            other => Self::Ledger(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_eligible_accounts_is_lifted() {
        let err: HarvestError = LedgerError::NoEligibleAccounts {
            kind: QuotaKind::Searches,
        }
        .into();
        assert!(matches!(
            err,
            HarvestError::NoEligibleAccounts {
                kind: QuotaKind::Searches
            }
        ));
    }

    #[test]
    fn test_other_ledger_errors_are_wrapped() {
        let err: HarvestError = LedgerError::UnknownAccount {
            account: "ghost".to_string(),
        }
        .into();
        assert!(err.to_string().contains("ghost"));
    }
}
