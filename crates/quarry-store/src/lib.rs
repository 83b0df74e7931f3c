//! Quarry Dataset Store
//!
//! Persists the canonical profile and job datasets and the quota ledger as
//! named JSON documents.
//!
//! # Architecture
//!
//! - **Store** ([`store`]): Typed load/save with corruption recovery
//! - **Backends** ([`backend`]): Raw byte storage trait and an in-memory backend
//! - **Files** ([`file`]): One JSON file per dataset, written atomically
//! - **SQLite** ([`sqlite`]): One row per dataset, via `SQLx`
//! - **Migrations** ([`migrations`]): Embedded, versioned schema migrations
//!
//! # Example
//!
//! ```ignore
//! use quarry_store::{JsonDirBackend, Store, PROFILE_DATASET};
//! use quarry_core::ProfileDataset;
//!
//! let store = Store::new(JsonDirBackend::new("data"));
//! let profiles: ProfileDataset = store.load(PROFILE_DATASET).await?;
//! store.save(PROFILE_DATASET, &profiles).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod backend;
pub mod error;
pub mod file;
pub mod migrations;
pub mod sqlite;
pub mod store;

// Re-export commonly used types
pub use backend::{MemoryBackend, StoreBackend};
pub use error::{Result, StoreError};
pub use file::JsonDirBackend;
pub use sqlite::SqliteBackend;
pub use store::{
    corrupt_copy_name, Store, DATABASE_FILE, JOB_DATASET, LEDGER_DATASET, PROFILE_DATASET,
};
