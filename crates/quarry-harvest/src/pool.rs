//! Parallel detail-fetch batches, one worker per eligible account.

use crate::error::{HarvestError, Result};
use crate::partition::divide;
use crate::source::SourceConnector;
use crate::task::DetailTask;
use crate::worker::{run_worker, WorkerJob, WorkerReport, WorkerSettings};
use futures::stream::{FuturesUnordered, StreamExt};
use quarry_core::QuotaKind;
use quarry_egress::{EgressProvider, LeaseBook};
use quarry_ledger::{AccountSelector, CredentialBook, Ledger};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Everything the workers of one batch reported.
#[derive(Debug)]
pub struct BatchOutcome<P> {
    /// One report per worker that finished, in completion order
    pub reports: Vec<WorkerReport<P>>,
    /// Workers that panicked; their partial results are lost
    pub panicked: usize,
    /// Leases returned through the tray rather than by their worker
    pub leases_settled: usize,
}

impl<P> BatchOutcome<P> {
    fn empty() -> Self {
        Self {
            reports: Vec::new(),
            panicked: 0,
            leases_settled: 0,
        }
    }
}

/// Runs detail-fetch batches across accounts.
pub struct WorkerPool {
    connector: Arc<dyn SourceConnector>,
    egress: Arc<dyn EgressProvider>,
    settings: WorkerSettings,
}

impl WorkerPool {
    /// Create a pool. `settings.quota_limit` is replaced per batch with the
    /// ledger's limit for the charged counter.
    pub fn new(
        connector: Arc<dyn SourceConnector>,
        egress: Arc<dyn EgressProvider>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            connector,
            egress,
            settings,
        }
    }

    /// Fetch details for `items` across every account with visit quota left.
    ///
    /// Blocks until every worker has finished, then drains the completion
    /// channel and settles any lease a worker did not release.
    ///
    /// # Errors
    /// Fails before any work starts with `NoEligibleAccounts` when no account
    /// has quota, `MissingCredential` when an eligible account has no
    /// credential, or an egress error when leases cannot be acquired.
    pub async fn run_batch<T: DetailTask>(
        &self,
        task: Arc<T>,
        ledger: &Ledger,
        credentials: &CredentialBook,
        items: Vec<T::Item>,
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome<T::Partial>> {
        let kind = QuotaKind::ProfileVisits;
        let accounts = AccountSelector::new(ledger).eligible(kind)?;

        if items.is_empty() {
            info!(task = task.name(), "no items to fetch");
            return Ok(BatchOutcome::empty());
        }

        // Resolve credentials before leasing anything
        let mut jobs: Vec<WorkerJob<T>> = Vec::with_capacity(accounts.len());
        for (account, partition) in accounts.iter().zip(divide(items, accounts.len())) {
            let credential = credentials
                .get(account)
                .ok_or_else(|| HarvestError::MissingCredential {
                    account: account.clone(),
                })?
                .clone();
            jobs.push(WorkerJob {
                account: account.clone(),
                credential,
                lease: None,
                starting_usage: ledger.usage(account, kind).unwrap_or(0),
                items: partition,
            });
        }

        let book = LeaseBook::new(Arc::clone(&self.egress));
        let busy = jobs.iter().filter(|job| !job.items.is_empty()).count();
        let mut leases = book.lease(busy).await?.into_iter();
        for job in jobs.iter_mut().filter(|job| !job.items.is_empty()) {
            job.lease = leases.next();
        }

        info!(
            task = task.name(),
            accounts = jobs.len(),
            busy,
            "starting worker batch"
        );

        let settings = WorkerSettings {
            quota_limit: ledger.limits().limit(kind),
            ..self.settings
        };
        let (completed_tx, mut completed_rx) = mpsc::unbounded_channel();
        let mut handles = FuturesUnordered::new();

        for job in jobs {
            handles.push(tokio::spawn(run_worker(
                Arc::clone(&task),
                Arc::clone(&self.connector),
                job,
                settings,
                cancel.clone(),
                completed_tx.clone(),
            )));
        }
        drop(completed_tx);

        let mut outcome = BatchOutcome::empty();
        while let Some(joined) = handles.next().await {
            if let Err(e) = joined {
                error!(task = task.name(), error = %e, "worker panicked");
                outcome.panicked += 1;
            }
        }

        while let Ok(report) = completed_rx.try_recv() {
            outcome.reports.push(report);
        }
        outcome.leases_settled = book.settle().await;

        info!(
            task = task.name(),
            reports = outcome.reports.len(),
            panicked = outcome.panicked,
            leases_settled = outcome.leases_settled,
            "worker batch finished"
        );
        Ok(outcome)
    }
}
