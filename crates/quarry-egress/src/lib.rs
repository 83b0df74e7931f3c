//! Network egress leasing for account sessions.
//!
//! Each worker holds one exclusive egress lease for its lifetime. Leases are
//! returned on every exit path: explicitly on the normal path, or through the
//! batch's tray when a guard is dropped.

pub mod error;
pub mod lease;
pub mod provider;

pub use error::{EgressError, Result};
pub use lease::{EgressLease, LeaseBook, LeaseGuard};
pub use provider::{from_config, DirectEgress, EgressProvider, ProxyPool};
