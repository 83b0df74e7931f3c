//! Quarry Core - Foundation crate for the Quarry harvesting system.
//!
//! This crate provides the shared types, canonical record shapes,
//! configuration and error handling that the ledger, store, egress and
//! harvest crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Core error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared newtypes and enums (`AccountId`, `QuotaKind`, `SearchKind`)
//! - [`records`] - Canonical dataset records with explicit unavailable sentinels
//!
//! # Example
//!
//! ```rust
//! use quarry_core::{AppConfig, Field, ProfileRecord};
//!
//! let config = AppConfig::default();
//! assert_eq!(config.quota.visit_limit_per_account, 80);
//!
//! let record = ProfileRecord::unavailable();
//! assert_eq!(record.country, Field::Unavailable);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
#[allow(missing_docs)]
pub mod records;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, EgressConfig, HarvestConfig, PacingConfig, QuotaConfig, SearchConfig,
    StoreBackendKind, StoreConfig,
};
pub use error::{ConfigError, ConfigResult, QuarryError, Result};
pub use records::{
    unchecked_profiles, unscraped_jobs, CompanyData, CompanyRecord, Field, JobDataset, JobRecord,
    JobRef, ProfileDataset, ProfileRecord,
};
pub use types::{epoch_now, AccountId, QuotaKind, SearchKind};
