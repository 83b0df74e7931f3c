//! A single account's sequential pass over its partition.

use crate::pacing::Pacer;
use crate::source::SourceConnector;
use crate::task::DetailTask;
use quarry_core::AccountId;
use quarry_egress::LeaseGuard;
use quarry_ledger::Credential;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Settings shared by every worker of a batch.
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    /// Deadline for each remote call
    pub fetch_timeout: Duration,
    /// Delay between consecutive items
    pub pacer: Pacer,
    /// Per-account cap on the counter this batch charges
    pub quota_limit: u32,
}

/// What a worker publishes when it finishes.
#[derive(Debug)]
pub struct WorkerReport<P> {
    /// Account the worker ran as
    pub account: AccountId,
    /// Records accumulated by the worker
    pub partial: P,
    /// Account's usage counter after the batch
    pub usage: u32,
    /// Items charged to the account during the batch
    pub charged: u32,
    /// Items fetched successfully
    pub items_done: usize,
    /// Items whose fetch failed
    pub items_failed: usize,
    /// Items never attempted (quota, cancellation, session failure)
    pub items_skipped: usize,
}

impl<P: Default> WorkerReport<P> {
    fn new(account: AccountId, usage: u32) -> Self {
        Self {
            account,
            partial: P::default(),
            usage,
            charged: 0,
            items_done: 0,
            items_failed: 0,
            items_skipped: 0,
        }
    }
}

/// One account's share of a batch.
pub(crate) struct WorkerJob<T: DetailTask> {
    pub account: AccountId,
    pub credential: Credential,
    pub lease: Option<LeaseGuard>,
    pub items: Vec<T::Item>,
    pub starting_usage: u32,
}

/// Run one worker to completion and publish its report on `completed`.
///
/// Per-item failures are recorded through [`DetailTask::mark_unavailable`]
/// and never end the worker early. The lease is released before publishing.
pub(crate) async fn run_worker<T: DetailTask>(
    task: Arc<T>,
    connector: Arc<dyn SourceConnector>,
    job: WorkerJob<T>,
    settings: WorkerSettings,
    cancel: CancellationToken,
    completed: UnboundedSender<WorkerReport<T::Partial>>,
) {
    let WorkerJob {
        account,
        credential,
        lease,
        items,
        starting_usage,
    } = job;
    let mut report = WorkerReport::new(account.clone(), starting_usage);
    let total = items.len();

    let lease = match lease {
        Some(lease) if total > 0 => lease,
        _ => {
            debug!(account = %account, task = task.name(), "empty partition, nothing to do");
            report.items_skipped = total;
            publish(&completed, report);
            return;
        }
    };

    info!(account = %account, task = task.name(), items = total, "worker started");

    let source = match connector.connect(&account, &credential, lease.lease()).await {
        Ok(source) => source,
        Err(e) => {
            warn!(account = %account, error = %e, "session setup failed, skipping partition");
            report.items_skipped = total;
            release(lease, &account).await;
            publish(&completed, report);
            return;
        }
    };

    for (index, item) in items.iter().enumerate() {
        if cancel.is_cancelled() {
            report.items_skipped = total - index;
            break;
        }
        if report.usage >= settings.quota_limit {
            warn!(
                account = %account,
                usage = report.usage,
                limit = settings.quota_limit,
                skipped = total - index,
                "account quota reached, leaving remaining items for a later run"
            );
            report.items_skipped = total - index;
            break;
        }

        let outcome = tokio::select! {
            () = cancel.cancelled() => None,
            result = task.fetch(source.as_ref(), item, settings.fetch_timeout, &mut report.partial) => Some(result),
        };

        match outcome {
            None => {
                report.items_skipped = total - index;
                break;
            }
            Some(Ok(())) => report.items_done += 1,
            Some(Err(e)) => {
                warn!(account = %account, item = %item, error = %e, "item fetch failed");
                task.mark_unavailable(item, &mut report.partial);
                report.items_failed += 1;
            }
        }
        report.usage += 1;
        report.charged += 1;

        let remaining = total - index - 1;
        if remaining > 0 && !settings.pacer.pause(&cancel).await {
            report.items_skipped = remaining;
            break;
        }
    }

    if cancel.is_cancelled() {
        info!(account = %account, skipped = report.items_skipped, "worker cancelled");
    }
    info!(
        account = %account,
        task = task.name(),
        done = report.items_done,
        failed = report.items_failed,
        skipped = report.items_skipped,
        "worker finished"
    );

    release(lease, &account).await;
    publish(&completed, report);
}

async fn release(lease: LeaseGuard, account: &AccountId) {
    if let Err(e) = lease.release().await {
        error!(account = %account, error = %e, "failed to release egress lease");
    }
}

fn publish<P>(completed: &UnboundedSender<WorkerReport<P>>, report: WorkerReport<P>) {
    if completed.send(report).is_err() {
        warn!("completion channel closed before worker reported");
    }
}
