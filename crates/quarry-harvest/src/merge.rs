//! Folding worker results into the canonical datasets.
//!
//! Merges are total: every input is absorbed or logged and skipped, and
//! applying the same input twice leaves the dataset as it was after the
//! first application.

use crate::task::JobDetailPartial;
use quarry_core::{CompanyData, JobDataset, ProfileDataset, ProfileRecord};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::ops::AddAssign;
use tracing::warn;

/// Counts of what a merge changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    /// New keys added
    pub inserted: usize,
    /// Existing entries that changed
    pub updated: usize,
    /// Entries left as they were
    pub unchanged: usize,
}

impl AddAssign for MergeStats {
    fn add_assign(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
    }
}

fn merge_profile(existing: &mut ProfileRecord, incoming: &ProfileRecord) -> bool {
    let before = existing.clone();

    // An unchecked record is a failed fetch; keep what is already known
    if incoming.checked {
        existing.overwrite_details(incoming);
    }
    for entry in &incoming.outreach_log {
        if !existing.outreach_log.contains(entry) {
            existing.outreach_log.push(entry.clone());
        }
    }
    if incoming.discovered_by.is_known() {
        existing.discovered_by = incoming.discovered_by.clone();
    }

    *existing != before
}

/// Write every detail record into the canonical dataset, last writer wins.
///
/// Records with `checked == false` stand for failed fetches and never
/// overwrite the details of an existing entry. The outreach log only grows,
/// and a known `discovered_by` is never replaced by an unavailable one.
pub fn merge_profiles(
    canonical: &mut ProfileDataset,
    partials: impl IntoIterator<Item = ProfileDataset>,
) -> MergeStats {
    let mut stats = MergeStats::default();

    for partial in partials {
        for (public_id, incoming) in partial {
            match canonical.entry(public_id) {
                Entry::Vacant(slot) => {
                    slot.insert(incoming);
                    stats.inserted += 1;
                }
                Entry::Occupied(mut slot) => {
                    if merge_profile(slot.get_mut(), &incoming) {
                        stats.updated += 1;
                    } else {
                        stats.unchanged += 1;
                    }
                }
            }
        }
    }

    stats
}

/// Add profiles seen in a search page. Existing records are left untouched.
pub fn merge_search_profiles(
    canonical: &mut ProfileDataset,
    found: impl IntoIterator<Item = (String, ProfileRecord)>,
) -> MergeStats {
    let mut stats = MergeStats::default();

    for (public_id, record) in found {
        match canonical.entry(public_id) {
            Entry::Vacant(slot) => {
                slot.insert(ProfileRecord {
                    checked: false,
                    ..record
                });
                stats.inserted += 1;
            }
            Entry::Occupied(_) => stats.unchanged += 1,
        }
    }

    stats
}

/// Add listings from a job search.
///
/// Unknown companies are inserted whole. For known companies only unseen
/// job ids are added; stored listings never change here. Company details
/// are then applied with [`merge_company_data`].
pub fn merge_jobs(canonical: &mut JobDataset, incoming: JobDataset) -> MergeStats {
    let mut stats = MergeStats::default();
    let mut company_updates = BTreeMap::new();

    for (company_id, mut company) in incoming {
        if let Some(data) = company.company_data.take() {
            company_updates.insert(company_id.clone(), data);
        }

        match canonical.entry(company_id) {
            Entry::Vacant(slot) => {
                stats.inserted += company.jobs.len();
                slot.insert(company);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                for (job_id, job) in company.jobs {
                    match existing.jobs.entry(job_id) {
                        Entry::Vacant(job_slot) => {
                            job_slot.insert(job);
                            stats.inserted += 1;
                        }
                        Entry::Occupied(_) => stats.unchanged += 1,
                    }
                }
            }
        }
    }

    stats += merge_company_data(canonical, company_updates);
    stats
}

/// Overwrite company details for companies already in the dataset.
pub fn merge_company_data(
    canonical: &mut JobDataset,
    updates: impl IntoIterator<Item = (String, CompanyData)>,
) -> MergeStats {
    let mut stats = MergeStats::default();

    for (company_id, data) in updates {
        let Some(company) = canonical.get_mut(&company_id) else {
            warn!(company = %company_id, "company details for unknown company, skipping");
            continue;
        };

        match &company.company_data {
            None => stats.inserted += 1,
            Some(previous) if *previous == data => stats.unchanged += 1,
            Some(_) => stats.updated += 1,
        }
        company.company_data = Some(data);
    }

    stats
}

/// Apply job detail results: mark fetched listings scraped and overwrite
/// company details. No other listing field is touched.
pub fn merge_job_details(
    canonical: &mut JobDataset,
    partials: impl IntoIterator<Item = JobDetailPartial>,
) -> MergeStats {
    let mut stats = MergeStats::default();

    for partial in partials {
        for job_ref in partial.scraped {
            let Some(job) = canonical
                .get_mut(&job_ref.company_id)
                .and_then(|company| company.jobs.get_mut(&job_ref.job_id))
            else {
                warn!(job = %job_ref, "scraped listing not in dataset, skipping");
                continue;
            };

            if job.scraped {
                stats.unchanged += 1;
            } else {
                job.scraped = true;
                stats.updated += 1;
            }
        }
        stats.unchanged += partial.failed.len();
        stats += merge_company_data(canonical, partial.companies);
    }

    stats
}
