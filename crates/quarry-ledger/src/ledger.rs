//! Persistent quota ledger.
//!
//! The ledger tracks, across runs, how much of each account's daily quota has
//! been used, and how far each keyword search has paginated. It is a plain
//! value: callers load it from the store, pass it by reference through
//! selection and merging, and save it back after every operation.

use crate::error::{LedgerError, Result};
use quarry_core::{AccountId, QuotaConfig, QuotaKind, SearchKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Configured per-account limits.
///
/// Limits are configuration, not state: they are attached to a loaded ledger
/// with [`Ledger::with_limits`] and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    /// Maximum search calls per day
    pub searches: u32,
    /// Maximum detail fetches per day
    pub profile_visits: u32,
    /// Seconds between counter resets
    pub day_length_secs: i64,
}

impl QuotaLimits {
    /// Build limits from the quota section of the configuration.
    #[must_use]
    pub fn from_config(config: &QuotaConfig) -> Self {
        Self {
            searches: config.search_limit_per_account,
            profile_visits: config.visit_limit_per_account,
            day_length_secs: config.day_length_secs,
        }
    }

    /// Limit for one counter kind.
    #[must_use]
    pub fn limit(&self, kind: QuotaKind) -> u32 {
        match kind {
            QuotaKind::Searches => self.searches,
            QuotaKind::ProfileVisits => self.profile_visits,
        }
    }
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self::from_config(&QuotaConfig::default())
    }
}

/// Usage counters of one account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUsage {
    /// Search calls made today
    #[serde(default)]
    pub searches: u32,
    /// Detail fetches made today
    #[serde(default)]
    pub profile_visits: u32,
    /// Immutable tracking id; survives daily resets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<String>,
}

impl AccountUsage {
    /// Current value of one counter.
    #[must_use]
    pub fn get(&self, kind: QuotaKind) -> u32 {
        match kind {
            QuotaKind::Searches => self.searches,
            QuotaKind::ProfileVisits => self.profile_visits,
        }
    }

    fn get_mut(&mut self, kind: QuotaKind) -> &mut u32 {
        match kind {
            QuotaKind::Searches => &mut self.searches,
            QuotaKind::ProfileVisits => &mut self.profile_visits,
        }
    }

    fn reset(&mut self) {
        self.searches = 0;
        self.profile_visits = 0;
    }
}

/// Usage counters, pagination offsets and the last reset time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    /// Epoch seconds of the last daily reset
    #[serde(default)]
    update_time: i64,
    #[serde(rename = "profile_keyword", default)]
    profile_offsets: BTreeMap<String, u32>,
    #[serde(rename = "job_keyword", default)]
    job_offsets: BTreeMap<String, u32>,
    #[serde(rename = "logins", default)]
    accounts: BTreeMap<AccountId, AccountUsage>,
    #[serde(skip)]
    limits: QuotaLimits,
}

impl Ledger {
    /// Create an empty ledger with the given limits.
    #[must_use]
    pub fn new(limits: QuotaLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Attach the configured limits to a loaded ledger.
    #[must_use]
    pub fn with_limits(mut self, limits: QuotaLimits) -> Self {
        self.limits = limits;
        self
    }

    /// The limits usage is clamped against.
    #[must_use]
    pub fn limits(&self) -> QuotaLimits {
        self.limits
    }

    /// Epoch seconds of the last daily reset.
    #[must_use]
    pub fn update_time(&self) -> i64 {
        self.update_time
    }

    fn offsets(&self, kind: SearchKind) -> &BTreeMap<String, u32> {
        match kind {
            SearchKind::Profile => &self.profile_offsets,
            SearchKind::Job => &self.job_offsets,
        }
    }

    fn offsets_mut(&mut self, kind: SearchKind) -> &mut BTreeMap<String, u32> {
        match kind {
            SearchKind::Profile => &mut self.profile_offsets,
            SearchKind::Job => &mut self.job_offsets,
        }
    }

    /// Stored offset for `keyword`, registering 0 if the keyword is new.
    pub fn get_offset(&mut self, keyword: &str, kind: SearchKind) -> u32 {
        *self
            .offsets_mut(kind)
            .entry(keyword.to_string())
            .or_insert_with(|| {
                debug!(keyword, kind = %kind, "registering new keyword offset");
                0
            })
    }

    /// Stored offset for `keyword` without registering it.
    #[must_use]
    pub fn peek_offset(&self, keyword: &str, kind: SearchKind) -> Option<u32> {
        self.offsets(kind).get(keyword).copied()
    }

    /// Number of keywords tracked for a pagination kind.
    #[must_use]
    pub fn keyword_count(&self, kind: SearchKind) -> usize {
        self.offsets(kind).len()
    }

    /// Move the offset for `keyword` forward by `delta` and return the new value.
    ///
    /// Offsets never decrease; the addition saturates.
    pub fn advance_offset(&mut self, keyword: &str, kind: SearchKind, delta: u32) -> u32 {
        let offset = self
            .offsets_mut(kind)
            .entry(keyword.to_string())
            .or_insert(0);
        *offset = offset.saturating_add(delta);
        *offset
    }

    /// Register an account with zeroed counters if it is not already known.
    pub fn register_account(&mut self, account: AccountId) {
        self.accounts.entry(account).or_default();
    }

    /// Make the ledger's account set match `accounts`.
    ///
    /// New accounts start with zeroed counters; accounts that are no longer
    /// listed are dropped. Counters of accounts present in both are kept.
    pub fn sync_accounts<'a>(&mut self, accounts: impl IntoIterator<Item = &'a AccountId>) {
        let listed: BTreeSet<&AccountId> = accounts.into_iter().collect();

        let before = self.accounts.len();
        self.accounts.retain(|id, _| listed.contains(id));
        let dropped = before - self.accounts.len();

        for id in listed {
            self.register_account(id.clone());
        }

        if dropped > 0 {
            info!(dropped, "dropped accounts no longer listed in logins file");
        }
    }

    /// Registered accounts in deterministic order.
    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &AccountUsage)> {
        self.accounts.iter()
    }

    /// Counters of one account.
    #[must_use]
    pub fn account(&self, account: &AccountId) -> Option<&AccountUsage> {
        self.accounts.get(account)
    }

    /// Set an immutable tracking id for an account.
    ///
    /// # Errors
    /// Returns `LedgerError::UnknownAccount` if the account is not registered.
    pub fn set_tracking_id(&mut self, account: &AccountId, tracking_id: String) -> Result<()> {
        let usage = self
            .accounts
            .get_mut(account)
            .ok_or_else(|| LedgerError::UnknownAccount {
                account: account.to_string(),
            })?;
        usage.tracking_id.get_or_insert(tracking_id);
        Ok(())
    }

    /// Current usage of one counter, or `None` for unknown accounts.
    #[must_use]
    pub fn usage(&self, account: &AccountId, kind: QuotaKind) -> Option<u32> {
        self.accounts.get(account).map(|usage| usage.get(kind))
    }

    /// Remaining quota of one counter before the limit is reached.
    #[must_use]
    pub fn remaining(&self, account: &AccountId, kind: QuotaKind) -> u32 {
        let used = self.usage(account, kind).unwrap_or(u32::MAX);
        self.limits.limit(kind).saturating_sub(used)
    }

    /// Increment one counter of an account and return the new value.
    ///
    /// The counter is clamped to the configured limit.
    ///
    /// # Errors
    /// Returns `LedgerError::UnknownAccount` if the account is not registered.
    pub fn record_usage(&mut self, account: &AccountId, kind: QuotaKind, delta: u32) -> Result<u32> {
        let limit = self.limits.limit(kind);
        let usage = self
            .accounts
            .get_mut(account)
            .ok_or_else(|| LedgerError::UnknownAccount {
                account: account.to_string(),
            })?;

        let counter = usage.get_mut(kind);
        let wanted = counter.saturating_add(delta);
        if wanted > limit {
            warn!(
                account = %account,
                kind = %kind,
                wanted,
                limit,
                "usage exceeds limit, clamping"
            );
        }
        *counter = wanted.min(limit);
        Ok(*counter)
    }

    /// Zero every counter if a full day has passed since the last reset.
    ///
    /// Tracking ids are preserved. Returns true if a reset happened; a second
    /// call before the next boundary is a no-op.
    pub fn reset_if_new_day(&mut self, now: i64) -> bool {
        if now.saturating_sub(self.update_time) < self.limits.day_length_secs {
            debug!(now, update_time = self.update_time, "not a new day, keeping counters");
            return false;
        }

        info!(accounts = self.accounts.len(), "new day, resetting usage counters");
        for usage in self.accounts.values_mut() {
            usage.reset();
        }
        self.update_time = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: &str) -> AccountId {
        AccountId::new(id).expect("valid account ID")
    }

    fn limits() -> QuotaLimits {
        QuotaLimits {
            searches: 10,
            profile_visits: 5,
            day_length_secs: 86_400,
        }
    }

    #[test]
    fn test_get_offset_registers_zero_once() {
        let mut ledger = Ledger::new(limits());
        assert_eq!(ledger.get_offset("rust", SearchKind::Profile), 0);
        assert_eq!(ledger.get_offset("rust", SearchKind::Profile), 0);
        assert_eq!(ledger.keyword_count(SearchKind::Profile), 1);
        assert_eq!(ledger.keyword_count(SearchKind::Job), 0);
    }

    #[test]
    fn test_offsets_are_independent_per_kind() {
        let mut ledger = Ledger::new(limits());
        ledger.advance_offset("engineer", SearchKind::Profile, 10);
        assert_eq!(ledger.get_offset("engineer", SearchKind::Job), 0);
        assert_eq!(ledger.peek_offset("engineer", SearchKind::Profile), Some(10));
    }

    #[test]
    fn test_job_offset_after_page() {
        let mut ledger = Ledger::new(limits());
        assert_eq!(ledger.peek_offset("engineer", SearchKind::Job), None);
        assert_eq!(ledger.get_offset("engineer", SearchKind::Job), 0);
        assert_eq!(ledger.peek_offset("engineer", SearchKind::Job), Some(0));
        assert_eq!(ledger.advance_offset("engineer", SearchKind::Job, 50), 50);
        assert_eq!(ledger.get_offset("engineer", SearchKind::Job), 50);
    }

    #[test]
    fn test_advance_offset_saturates() {
        let mut ledger = Ledger::new(limits());
        ledger.advance_offset("k", SearchKind::Job, u32::MAX - 1);
        assert_eq!(ledger.advance_offset("k", SearchKind::Job, 5), u32::MAX);
    }

    #[test]
    fn test_record_usage_clamps_at_limit() {
        let mut ledger = Ledger::new(limits());
        let a = account("a");
        ledger.register_account(a.clone());

        assert_eq!(ledger.record_usage(&a, QuotaKind::ProfileVisits, 3).expect("record"), 3);
        assert_eq!(ledger.record_usage(&a, QuotaKind::ProfileVisits, 4).expect("record"), 5);
        assert_eq!(ledger.usage(&a, QuotaKind::Searches), Some(0));
        assert_eq!(ledger.remaining(&a, QuotaKind::ProfileVisits), 0);
        assert_eq!(ledger.remaining(&a, QuotaKind::Searches), 10);
    }

    #[test]
    fn test_record_usage_unknown_account() {
        let mut ledger = Ledger::new(limits());
        let err = ledger
            .record_usage(&account("ghost"), QuotaKind::Searches, 1)
            .expect_err("unknown account");
        assert!(matches!(err, LedgerError::UnknownAccount { .. }));
    }

    #[test]
    fn test_reset_if_new_day_is_idempotent_within_day() {
        let mut ledger = Ledger::new(limits());
        let a = account("a");
        ledger.register_account(a.clone());
        ledger.set_tracking_id(&a, "trk-1".to_string()).expect("set tracking id");

        let day_one = 1_700_000_000;
        assert!(ledger.reset_if_new_day(day_one));
        ledger.record_usage(&a, QuotaKind::Searches, 4).expect("record");

        // Same day: counters untouched
        assert!(!ledger.reset_if_new_day(day_one + 3_600));
        assert_eq!(ledger.usage(&a, QuotaKind::Searches), Some(4));

        // Next day: counters zeroed, tracking id kept
        assert!(ledger.reset_if_new_day(day_one + 86_400));
        assert_eq!(ledger.usage(&a, QuotaKind::Searches), Some(0));
        assert_eq!(ledger.update_time(), day_one + 86_400);
        assert_eq!(
            ledger.account(&a).and_then(|u| u.tracking_id.as_deref()),
            Some("trk-1")
        );
        assert!(!ledger.reset_if_new_day(day_one + 86_401));
    }

    #[test]
    fn test_sync_accounts_keeps_counters_and_drops_unlisted() {
        let mut ledger = Ledger::new(limits());
        let (a, b, c) = (account("a"), account("b"), account("c"));
        ledger.register_account(a.clone());
        ledger.register_account(b.clone());
        ledger.record_usage(&a, QuotaKind::Searches, 2).expect("record");

        ledger.sync_accounts([&a, &c]);

        let ids: Vec<_> = ledger.accounts().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(ledger.usage(&a, QuotaKind::Searches), Some(2));
        assert_eq!(ledger.usage(&b, QuotaKind::Searches), None);
    }

    #[test]
    fn test_ledger_round_trips_through_json() {
        let mut ledger = Ledger::new(limits());
        let a = account("scout@example.com");
        ledger.register_account(a.clone());
        ledger.record_usage(&a, QuotaKind::ProfileVisits, 2).expect("record");
        ledger.advance_offset("rust", SearchKind::Profile, 49);

        let json = serde_json::to_value(&ledger).expect("serialize ledger");
        assert_eq!(json["profile_keyword"]["rust"], 49);
        assert_eq!(json["logins"]["scout@example.com"]["profile_visits"], 2);

        let loaded: Ledger = serde_json::from_value(json).expect("deserialize ledger");
        let loaded = loaded.with_limits(limits());
        assert_eq!(loaded, ledger);
    }
}
