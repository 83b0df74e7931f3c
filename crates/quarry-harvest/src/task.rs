//! Detail-fetch task kinds run by the worker pool.

use crate::normalize::{normalize_company, normalize_profile};
use crate::source::{with_timeout, RemoteSource, SourceError};
use async_trait::async_trait;
use chrono::Datelike;
use quarry_core::{CompanyData, JobRef, ProfileDataset, ProfileRecord};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// One kind of per-item detail fetch.
///
/// A worker calls [`DetailTask::fetch`] for each item of its partition and
/// [`DetailTask::mark_unavailable`] when that fails.
#[async_trait]
pub trait DetailTask: Send + Sync + 'static {
    /// Unit of work
    type Item: Clone + fmt::Display + Send + Sync + 'static;
    /// What one worker accumulates
    type Partial: Default + fmt::Debug + Send + 'static;

    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Fetch and normalize one item into `partial`.
    ///
    /// `fetch_timeout` bounds each remote call.
    async fn fetch(
        &self,
        source: &dyn RemoteSource,
        item: &Self::Item,
        fetch_timeout: Duration,
        partial: &mut Self::Partial,
    ) -> Result<(), SourceError>;

    /// Record a failed item.
    fn mark_unavailable(&self, item: &Self::Item, partial: &mut Self::Partial);
}

/// Fetches the detail view of unchecked profiles.
#[derive(Debug, Clone, Copy)]
pub struct ProfileDetailTask {
    current_year: i32,
}

impl ProfileDetailTask {
    /// Years of experience are counted up to `current_year`.
    pub fn new(current_year: i32) -> Self {
        Self { current_year }
    }
}

impl Default for ProfileDetailTask {
    fn default() -> Self {
        Self::new(chrono::Utc::now().year())
    }
}

#[async_trait]
impl DetailTask for ProfileDetailTask {
    type Item = String;
    type Partial = ProfileDataset;

    fn name(&self) -> &'static str {
        "profile_detail"
    }

    async fn fetch(
        &self,
        source: &dyn RemoteSource,
        public_id: &String,
        fetch_timeout: Duration,
        partial: &mut ProfileDataset,
    ) -> Result<(), SourceError> {
        let raw = with_timeout(fetch_timeout, source.fetch_profile(public_id)).await?;
        partial.insert(public_id.clone(), normalize_profile(&raw, self.current_year));
        Ok(())
    }

    fn mark_unavailable(&self, public_id: &String, partial: &mut ProfileDataset) {
        // Unchecked: the merge keeps stored details and the next batch retries it
        partial.insert(public_id.clone(), ProfileRecord::unavailable());
    }
}

/// Outcome of a job detail batch for one worker.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct JobDetailPartial {
    /// Listings whose detail view was fetched
    pub scraped: Vec<JobRef>,
    /// Listings whose fetch failed; they stay unscraped
    pub failed: Vec<JobRef>,
    /// Company details fetched alongside the listings
    pub companies: BTreeMap<String, CompanyData>,
}

/// Fetches the detail view of unscraped listings and their companies.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobDetailTask;

#[async_trait]
impl DetailTask for JobDetailTask {
    type Item = JobRef;
    type Partial = JobDetailPartial;

    fn name(&self) -> &'static str {
        "job_detail"
    }

    async fn fetch(
        &self,
        source: &dyn RemoteSource,
        job: &JobRef,
        fetch_timeout: Duration,
        partial: &mut JobDetailPartial,
    ) -> Result<(), SourceError> {
        with_timeout(fetch_timeout, source.fetch_job(&job.job_id)).await?;
        partial.scraped.push(job.clone());

        if partial.companies.contains_key(&job.company_id) {
            return Ok(());
        }

        match with_timeout(fetch_timeout, source.fetch_company(&job.company_id)).await {
            Ok(raw) => {
                partial
                    .companies
                    .insert(job.company_id.clone(), normalize_company(&raw));
            }
            Err(e) => {
                // The listing itself was fetched, so it still counts as scraped
                warn!(company = %job.company_id, error = %e, "company fetch failed");
            }
        }
        Ok(())
    }

    fn mark_unavailable(&self, job: &JobRef, partial: &mut JobDetailPartial) {
        partial.failed.push(job.clone());
    }
}
