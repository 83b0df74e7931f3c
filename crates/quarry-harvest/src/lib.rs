//! Quarry Harvest - quota-aware bulk collection across many accounts.
//!
//! This crate runs the high-level operations: keyword searches that page
//! through the remote service with a persisted offset, and detail fetches
//! that fan out one worker per eligible account. Results are merged into the
//! canonical datasets and saved after every operation.
//!
//! # Features
//!
//! - One worker per account, each holding an exclusive egress lease
//! - Even partitioning of work across accounts with quota left
//! - Per-item timeouts and randomized pacing between requests
//! - Per-item failures recorded as unavailable records, never fatal
//! - Cooperative cancellation that still merges and saves partial results
//!
//! # Example
//!
//! ```rust,ignore
//! use quarry_core::AppConfig;
//! use quarry_harvest::Harvester;
//! use std::sync::Arc;
//!
//! let config = AppConfig::load_with_env()?;
//! let mut harvester = Harvester::open(&config, Arc::new(connector)).await?;
//!
//! harvester.search_profiles("platform engineer").await?;
//! let summary = harvester.scrape_profiles().await?;
//! println!("fetched {} profiles", summary.items_done);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod error;
pub mod merge;
pub mod normalize;
pub mod orchestrator;
#[allow(missing_docs)]
pub mod pacing;
pub mod partition;
pub mod pool;
#[allow(missing_docs)]
pub mod search;
#[allow(missing_docs)]
pub mod source;
pub mod task;
pub mod worker;

// Re-export commonly used types
pub use error::{HarvestError, Result};
pub use merge::{
    merge_company_data, merge_job_details, merge_jobs, merge_profiles, merge_search_profiles,
    MergeStats,
};
pub use orchestrator::{Harvester, OperationSummary};
pub use pacing::Pacer;
pub use partition::divide;
pub use pool::{BatchOutcome, WorkerPool};
pub use search::{KeywordSearch, SearchOutcome, SearchSettings, SearchTarget};
pub use source::{RemoteSource, SourceConnector, SourceError};
pub use task::{DetailTask, JobDetailPartial, JobDetailTask, ProfileDetailTask};
pub use worker::{WorkerReport, WorkerSettings};
