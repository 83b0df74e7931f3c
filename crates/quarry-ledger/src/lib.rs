//! Quarry Ledger - per-account quota accounting and account selection.
//!
//! This crate owns the persistent quota ledger: daily usage counters for every
//! account, per-keyword pagination offsets, and the daily reset. It also picks
//! the accounts that may take part in an operation and reads the logins file.
//!
//! # Architecture
//!
//! - **Ledger** ([`ledger`]): Usage counters, offsets and the daily reset
//! - **Selector** ([`selector`]): Quota-aware choice of eligible accounts
//! - **Credentials** ([`credentials`]): Logins file parsing with zeroized secrets
//! - **Errors** ([`error`]): Ledger and credential error types
//!
//! # Example
//!
//! ```rust
//! use quarry_core::{AccountId, QuotaKind};
//! use quarry_ledger::{AccountSelector, Ledger, QuotaLimits};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut ledger = Ledger::new(QuotaLimits::default());
//! let account = AccountId::new("scout@example.com")?;
//! ledger.register_account(account.clone());
//!
//! let eligible = AccountSelector::new(&ledger).eligible(QuotaKind::ProfileVisits)?;
//! assert_eq!(eligible, vec![account.clone()]);
//!
//! ledger.record_usage(&account, QuotaKind::ProfileVisits, 1)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod credentials;
pub mod error;
pub mod ledger;
pub mod selector;

// Re-export commonly used types
pub use credentials::{Credential, CredentialBook};
pub use error::{CredentialError, LedgerError, Result};
pub use ledger::{AccountUsage, Ledger, QuotaLimits};
pub use selector::AccountSelector;
