//! Error types for the ledger subsystem.

use quarry_core::QuotaKind;
use thiserror::Error;

/// Errors that can occur in ledger and selection operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Account is not registered in the ledger
    #[error("account not found in ledger: {account}")]
    UnknownAccount {
        /// The account that was not found
        account: String,
    },

    /// Every account has exhausted its quota for this kind.
    ///
    /// Terminal for the current operation.
    #[error("no eligible accounts: every account has reached its {kind} limit")]
    NoEligibleAccounts {
        /// Quota kind that was exhausted
        kind: QuotaKind,
    },
}

/// Errors raised while reading account credentials.
///
/// These are fatal at startup.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// A line of the logins file is malformed
    #[error("invalid logins file format at line {line}: {reason}")]
    Format {
        /// 1-based line number
        line: usize,
        /// What is wrong with the line
        reason: String,
    },

    /// The logins file could not be read
    #[error("failed to read logins file {path}: {source}")]
    Io {
        /// Path to the logins file
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
