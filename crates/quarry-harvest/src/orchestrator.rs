//! Harvest orchestrator for the high-level operations.
//!
//! This module provides the `Harvester`, which owns the canonical datasets
//! and the quota ledger for a run. Every operation rolls the ledger over to a
//! new day if one has started, does its work, merges the results and writes
//! all datasets back to the store. The write also happens when there is
//! nothing to do or the operation fails, so a daily reset is never lost.

use crate::error::Result;
use crate::merge::{merge_job_details, merge_profiles, MergeStats};
use crate::pacing::Pacer;
use crate::pool::{BatchOutcome, WorkerPool};
use crate::search::{KeywordSearch, SearchOutcome, SearchSettings, SearchTarget};
use crate::source::SourceConnector;
use crate::task::{JobDetailTask, ProfileDetailTask};
use crate::worker::{WorkerReport, WorkerSettings};
use quarry_core::{
    epoch_now, unchecked_profiles, unscraped_jobs, AppConfig, JobDataset, ProfileDataset,
    QuotaKind,
};
use quarry_egress::EgressProvider;
use quarry_ledger::{CredentialBook, Ledger, QuotaLimits};
use quarry_store::{Store, JOB_DATASET, LEDGER_DATASET, PROFILE_DATASET};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Totals for one detail-fetch operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationSummary {
    /// Workers that reported back
    pub workers: usize,
    /// Items fetched successfully
    pub items_done: usize,
    /// Items recorded as unavailable
    pub items_failed: usize,
    /// Items left for a later run
    pub items_skipped: usize,
    /// Workers that panicked
    pub panicked: usize,
    /// What the merge changed
    pub stats: MergeStats,
}

impl OperationSummary {
    fn from_outcome<P>(outcome: &BatchOutcome<P>) -> Self {
        let mut summary = Self {
            workers: outcome.reports.len(),
            panicked: outcome.panicked,
            ..Self::default()
        };
        for report in &outcome.reports {
            summary.items_done += report.items_done;
            summary.items_failed += report.items_failed;
            summary.items_skipped += report.items_skipped;
        }
        summary
    }
}

/// Coordinates searches and detail fetches across all configured accounts.
pub struct Harvester {
    store: Store,
    credentials: CredentialBook,
    pool: WorkerPool,
    search: KeywordSearch,
    ledger: Ledger,
    profiles: ProfileDataset,
    jobs: JobDataset,
    cancel: CancellationToken,
}

impl Harvester {
    /// Open a harvester from configuration: reads the logins file, builds the
    /// egress provider and opens the store under the data directory.
    pub async fn open(config: &AppConfig, connector: Arc<dyn SourceConnector>) -> Result<Self> {
        let credentials = CredentialBook::load(&config.harvest.logins_file)?;
        let egress = quarry_egress::from_config(&config.egress)?;
        let data_dir = config.data_dir()?;
        let store = Store::open(&config.store, &data_dir).await?;

        Self::with_parts(config, store, credentials, connector, egress).await
    }

    /// Build a harvester from explicit parts and load its datasets.
    ///
    /// The stored ledger is synced with the configured accounts: new accounts
    /// start at zero and accounts no longer configured are dropped.
    pub async fn with_parts(
        config: &AppConfig,
        store: Store,
        credentials: CredentialBook,
        connector: Arc<dyn SourceConnector>,
        egress: Arc<dyn EgressProvider>,
    ) -> Result<Self> {
        let limits = QuotaLimits::from_config(&config.quota);
        let mut ledger = store.load::<Ledger>(LEDGER_DATASET).await?.with_limits(limits);
        ledger.sync_accounts(credentials.account_ids());

        let profiles: ProfileDataset = store.load(PROFILE_DATASET).await?;
        let jobs: JobDataset = store.load(JOB_DATASET).await?;

        let fetch_timeout = Duration::from_secs(config.harvest.fetch_timeout_secs);
        let pool = WorkerPool::new(
            Arc::clone(&connector),
            Arc::clone(&egress),
            WorkerSettings {
                fetch_timeout,
                pacer: Pacer::from_config(&config.pacing),
                quota_limit: limits.profile_visits,
            },
        );
        let search = KeywordSearch::new(
            connector,
            egress,
            SearchSettings {
                page_size: config.search.page_size,
                min_page_threshold: config.search.min_page_threshold,
                call_cost: config.quota.search_call_cost,
                fetch_timeout,
            },
        );

        info!(
            accounts = credentials.len(),
            profiles = profiles.len(),
            companies = jobs.len(),
            "harvester ready"
        );

        Ok(Self {
            store,
            credentials,
            pool,
            search,
            ledger,
            profiles,
            jobs,
            cancel: CancellationToken::new(),
        })
    }

    /// Token that interrupts the running operation when cancelled.
    ///
    /// Workers stop at the next fetch or pacing wait, release their leases and
    /// report what they have; the partial results are still merged and saved.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current quota ledger.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Canonical profile dataset.
    pub fn profiles(&self) -> &ProfileDataset {
        &self.profiles
    }

    /// Canonical job dataset.
    pub fn jobs(&self) -> &JobDataset {
        &self.jobs
    }

    /// Fetch the detail view of every unchecked profile.
    pub async fn scrape_profiles(&mut self) -> Result<OperationSummary> {
        self.roll_day();
        let items = unchecked_profiles(&self.profiles);
        if items.is_empty() {
            info!("no unchecked profiles");
            self.save().await?;
            return Ok(OperationSummary::default());
        }

        info!(items = items.len(), "scraping profiles");
        let outcome = match self
            .pool
            .run_batch(
                Arc::new(ProfileDetailTask::default()),
                &self.ledger,
                &self.credentials,
                items,
                &self.cancel,
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.save().await?;
                return Err(e);
            }
        };

        self.charge_visits(&outcome.reports)?;
        let mut summary = OperationSummary::from_outcome(&outcome);
        summary.stats = merge_profiles(
            &mut self.profiles,
            outcome.reports.into_iter().map(|report| report.partial),
        );
        self.save().await?;

        info!(
            done = summary.items_done,
            failed = summary.items_failed,
            skipped = summary.items_skipped,
            inserted = summary.stats.inserted,
            updated = summary.stats.updated,
            "profile scrape finished"
        );
        Ok(summary)
    }

    /// Fetch the detail view of every unscraped listing and its company.
    pub async fn scrape_jobs(&mut self) -> Result<OperationSummary> {
        self.roll_day();
        let items = unscraped_jobs(&self.jobs);
        if items.is_empty() {
            info!("no unscraped listings");
            self.save().await?;
            return Ok(OperationSummary::default());
        }

        info!(items = items.len(), "scraping listings");
        let outcome = match self
            .pool
            .run_batch(
                Arc::new(JobDetailTask),
                &self.ledger,
                &self.credentials,
                items,
                &self.cancel,
            )
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.save().await?;
                return Err(e);
            }
        };

        self.charge_visits(&outcome.reports)?;
        let mut summary = OperationSummary::from_outcome(&outcome);
        summary.stats = merge_job_details(
            &mut self.jobs,
            outcome.reports.into_iter().map(|report| report.partial),
        );
        self.save().await?;

        info!(
            done = summary.items_done,
            failed = summary.items_failed,
            skipped = summary.items_skipped,
            updated = summary.stats.updated,
            "listing scrape finished"
        );
        Ok(summary)
    }

    /// Page through people matching `keyword`, one page per account.
    pub async fn search_profiles(&mut self, keyword: &str) -> Result<SearchOutcome> {
        self.roll_day();
        let result = self
            .search
            .run(
                keyword,
                &mut self.ledger,
                &self.credentials,
                SearchTarget::Profiles(&mut self.profiles),
                &self.cancel,
            )
            .await;
        self.save().await?;
        result
    }

    /// Page through job postings matching `keyword`, one page per account.
    pub async fn search_jobs(&mut self, keyword: &str) -> Result<SearchOutcome> {
        self.roll_day();
        let result = self
            .search
            .run(
                keyword,
                &mut self.ledger,
                &self.credentials,
                SearchTarget::Jobs(&mut self.jobs),
                &self.cancel,
            )
            .await;
        self.save().await?;
        result
    }

    /// Write every dataset and the ledger to the store.
    pub async fn save(&self) -> Result<()> {
        self.store.save(PROFILE_DATASET, &self.profiles).await?;
        self.store.save(JOB_DATASET, &self.jobs).await?;
        self.store.save(LEDGER_DATASET, &self.ledger).await?;
        Ok(())
    }

    fn roll_day(&mut self) {
        if self.ledger.reset_if_new_day(epoch_now()) {
            info!("quota counters reset for the new day");
        }
    }

    fn charge_visits<P>(&mut self, reports: &[WorkerReport<P>]) -> Result<()> {
        for report in reports.iter().filter(|report| report.charged > 0) {
            self.ledger
                .record_usage(&report.account, QuotaKind::ProfileVisits, report.charged)?;
        }
        Ok(())
    }
}
