//! Shared types used across Quarry.
//!
//! Newtypes and enums that give the ledger, selector and harvest crates a
//! common vocabulary.

use crate::error::QuarryError;
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Identifier of one authenticated worker identity.
///
/// Usually the login e-mail. Must be non-empty and contain neither
/// whitespace nor `:` (the logins file separator).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new `AccountId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID is empty or contains whitespace or `:`.
    pub fn new(id: impl Into<String>) -> Result<Self, QuarryError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> Result<(), QuarryError> {
        static ACCOUNT_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = ACCOUNT_REGEX.get_or_init(|| Regex::new(r"^[^\s:]+$").expect("valid regex"));

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(QuarryError::Validation(format!(
                "invalid account ID: must be non-empty without whitespace or ':', got '{id}'"
            )))
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two independent per-account usage counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaKind {
    /// Search calls (profile and job keyword searches)
    Searches,
    /// Detail fetches (profile and job detail views)
    ProfileVisits,
}

impl QuotaKind {
    /// Human-readable name used in log fields.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Searches => "searches",
            Self::ProfileVisits => "profile_visits",
        }
    }
}

impl fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pagination kinds with independent per-keyword offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchKind {
    /// People search
    #[serde(rename = "profile_keyword")]
    Profile,
    /// Job listing search
    #[serde(rename = "job_keyword")]
    Job,
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile => f.write_str("profile_keyword"),
            Self::Job => f.write_str("job_keyword"),
        }
    }
}

/// Current wall-clock time as epoch seconds.
#[must_use]
pub fn epoch_now() -> i64 {
    Utc::now().timestamp()
}
