//! Keyword search with a persisted pagination offset.
//!
//! Accounts take turns on one shared offset, so the pass is sequential: each
//! account requests the page after the one its predecessor got.

use crate::error::{HarvestError, Result};
use crate::merge::{merge_jobs, merge_search_profiles, MergeStats};
use crate::normalize::{normalize_job_search, normalize_search_profile};
use crate::source::{with_timeout, RemoteSource, SourceConnector};
use quarry_core::{JobDataset, ProfileDataset, QuotaKind, SearchKind};
use quarry_egress::{EgressProvider, LeaseBook};
use quarry_ledger::{AccountSelector, CredentialBook, Ledger};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Paging parameters.
#[derive(Debug, Clone, Copy)]
pub struct SearchSettings {
    /// Entries requested per page
    pub page_size: u32,
    /// A shorter page means the result set is exhausted
    pub min_page_threshold: usize,
    /// Searches charged per page request
    pub call_cost: u32,
    /// Deadline for each page request
    pub fetch_timeout: Duration,
}

/// Dataset a search pass feeds.
#[derive(Debug)]
pub enum SearchTarget<'a> {
    /// People search
    Profiles(&'a mut ProfileDataset),
    /// Job search
    Jobs(&'a mut JobDataset),
}

impl SearchTarget<'_> {
    fn kind(&self) -> SearchKind {
        match self {
            Self::Profiles(_) => SearchKind::Profile,
            Self::Jobs(_) => SearchKind::Job,
        }
    }
}

/// Result of one keyword search pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Pages requested successfully
    pub pages: usize,
    /// Page requests that failed
    pub failed_pages: usize,
    /// Entries returned across all pages
    pub entries: usize,
    /// What the merges changed
    pub stats: MergeStats,
    /// The upstream result set ran out
    pub exhausted: bool,
    /// Offset stored for the keyword after the pass
    pub offset: u32,
}

/// Runs keyword searches account by account.
pub struct KeywordSearch {
    connector: Arc<dyn SourceConnector>,
    egress: Arc<dyn EgressProvider>,
    settings: SearchSettings,
}

impl KeywordSearch {
    pub fn new(
        connector: Arc<dyn SourceConnector>,
        egress: Arc<dyn EgressProvider>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            connector,
            egress,
            settings,
        }
    }

    /// One pass over the accounts with search quota left.
    ///
    /// Each account reads the stored offset, requests one page, merges it
    /// into `target`, advances the offset by the page length and is charged
    /// the call cost. The pass stops early when a page is shorter than the
    /// threshold. A failed request is still charged, leaves the offset alone
    /// and hands over to the next account.
    ///
    /// # Errors
    /// `NoEligibleAccounts` when no account has search quota left, or an
    /// egress error when a lease cannot be acquired.
    pub async fn run(
        &self,
        keyword: &str,
        ledger: &mut Ledger,
        credentials: &CredentialBook,
        mut target: SearchTarget<'_>,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome> {
        let kind = target.kind();
        let accounts = AccountSelector::new(ledger).eligible(QuotaKind::Searches)?;
        let book = LeaseBook::new(Arc::clone(&self.egress));
        let mut outcome = SearchOutcome::default();

        info!(keyword, kind = %kind, accounts = accounts.len(), "starting keyword search");

        for account in &accounts {
            if cancel.is_cancelled() {
                info!(keyword, "keyword search cancelled");
                break;
            }

            let credential = credentials
                .get(account)
                .ok_or_else(|| HarvestError::MissingCredential {
                    account: account.clone(),
                })?;

            let Some(lease) = book.lease(1).await?.pop() else {
                continue;
            };

            let source = match self
                .connector
                .connect(account, credential, lease.lease())
                .await
            {
                Ok(source) => source,
                Err(e) => {
                    warn!(account = %account, error = %e, "session setup failed, trying next account");
                    if let Err(e) = lease.release().await {
                        error!(account = %account, error = %e, "failed to release egress lease");
                    }
                    continue;
                }
            };

            let offset = ledger.get_offset(keyword, kind);
            debug!(account = %account, keyword, offset, "requesting search page");
            let page = tokio::select! {
                () = cancel.cancelled() => None,
                page = self.fetch_page(source.as_ref(), kind, keyword, offset) => Some(page),
            };

            if let Err(e) = lease.release().await {
                error!(account = %account, error = %e, "failed to release egress lease");
            }
            let Some(page) = page else {
                info!(keyword, "keyword search cancelled");
                break;
            };

            ledger.record_usage(account, QuotaKind::Searches, self.settings.call_cost)?;

            let page = match page {
                Ok(page) => page,
                Err(e) => {
                    warn!(account = %account, keyword, error = %e, "search page failed");
                    outcome.failed_pages += 1;
                    continue;
                }
            };

            let len = page.len();
            outcome.pages += 1;
            outcome.entries += len;
            outcome.stats += match &mut target {
                SearchTarget::Profiles(profiles) => merge_search_profiles(
                    profiles,
                    page.iter()
                        .filter_map(|raw| normalize_search_profile(raw, account)),
                ),
                SearchTarget::Jobs(jobs) => merge_jobs(jobs, normalize_job_search(&page)),
            };
            let advanced = ledger.advance_offset(keyword, kind, u32::try_from(len).unwrap_or(u32::MAX));
            info!(account = %account, keyword, entries = len, offset = advanced, "search page merged");

            if len < self.settings.min_page_threshold {
                info!(keyword, "all results for keyword collected");
                outcome.exhausted = true;
                break;
            }
        }

        outcome.offset = ledger.peek_offset(keyword, kind).unwrap_or(0);
        book.settle().await;
        Ok(outcome)
    }

    async fn fetch_page(
        &self,
        source: &dyn RemoteSource,
        kind: SearchKind,
        keyword: &str,
        offset: u32,
    ) -> std::result::Result<Vec<Value>, crate::source::SourceError> {
        let limit = self.settings.page_size;
        match kind {
            SearchKind::Profile => {
                with_timeout(
                    self.settings.fetch_timeout,
                    source.search_profiles(keyword, offset, limit),
                )
                .await
            }
            SearchKind::Job => {
                with_timeout(
                    self.settings.fetch_timeout,
                    source.search_jobs(keyword, offset, limit),
                )
                .await
            }
        }
    }
}
