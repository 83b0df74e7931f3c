use crate::error::Result;
use crate::provider::EgressProvider;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, warn};
use url::Url;
use uuid::Uuid;

/// One exclusive network egress channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EgressLease {
    id: Uuid,
    proxy: Option<Url>,
}

impl EgressLease {
    /// A handle for direct traffic with no proxy behind it
    pub fn direct() -> Self {
        Self {
            id: Uuid::new_v4(),
            proxy: None,
        }
    }

    /// A handle routed through `proxy`
    pub fn via_proxy(proxy: Url) -> Self {
        Self {
            id: Uuid::new_v4(),
            proxy: Some(proxy),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn proxy(&self) -> Option<&Url> {
        self.proxy.as_ref()
    }

    pub fn is_direct(&self) -> bool {
        self.proxy.is_none()
    }
}

impl fmt::Display for EgressLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.proxy {
            Some(proxy) => write!(f, "{} via {}", self.id, proxy.host_str().unwrap_or("proxy")),
            None => write!(f, "{} direct", self.id),
        }
    }
}

type Tray = Arc<Mutex<Vec<EgressLease>>>;

fn push_to_tray(tray: &Tray, lease: EgressLease) {
    tray.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(lease);
}

/// Leases handed out for one batch, plus the tray that catches any lease a
/// worker failed to release itself.
pub struct LeaseBook {
    provider: Arc<dyn EgressProvider>,
    tray: Tray,
}

impl LeaseBook {
    pub fn new(provider: Arc<dyn EgressProvider>) -> Self {
        Self {
            provider,
            tray: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Acquire `n` leases, each wrapped in a guard that always returns it
    pub async fn lease(&self, n: usize) -> Result<Vec<LeaseGuard>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let leases = self.provider.acquire(n).await?;
        debug!(leases = leases.len(), "egress leases acquired for batch");

        Ok(leases
            .into_iter()
            .map(|lease| LeaseGuard {
                lease: Some(lease),
                provider: Arc::clone(&self.provider),
                tray: Arc::clone(&self.tray),
            })
            .collect())
    }

    /// Number of leases waiting in the tray
    pub fn pending(&self) -> usize {
        self.tray
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Return every lease left in the tray to the provider.
    ///
    /// Returns the number of leases settled. A provider failure is logged
    /// and the leases are dropped from the tray.
    pub async fn settle(&self) -> usize {
        let leases: Vec<EgressLease> = std::mem::take(
            &mut *self.tray.lock().unwrap_or_else(PoisonError::into_inner),
        );
        if leases.is_empty() {
            return 0;
        }

        let count = leases.len();
        match self.provider.release(leases).await {
            Ok(()) => debug!(leases = count, "settled stray egress leases"),
            Err(e) => error!(leases = count, error = %e, "failed to settle egress leases"),
        }
        count
    }
}

impl fmt::Debug for LeaseBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeaseBook")
            .field("pending", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Holds one lease for a worker's lifetime.
///
/// Call [`LeaseGuard::release`] on the normal path. If the guard is dropped
/// without it (cancellation, panic), the lease goes to the batch's tray and
/// [`LeaseBook::settle`] returns it.
pub struct LeaseGuard {
    lease: Option<EgressLease>,
    provider: Arc<dyn EgressProvider>,
    tray: Tray,
}

impl LeaseGuard {
    /// The held lease.
    ///
    /// # Panics
    /// Never: the lease is only taken by `release` or `drop`, both of which
    /// consume the guard.
    pub fn lease(&self) -> &EgressLease {
        self.lease
            .as_ref()
            .expect("lease is present until the guard is consumed")
    }

    /// Return the lease to the provider.
    ///
    /// On failure the lease is parked in the tray for the coordinator to
    /// retry during settlement.
    pub async fn release(mut self) -> Result<()> {
        let Some(lease) = self.lease.take() else {
            return Ok(());
        };

        match self.provider.release(vec![lease.clone()]).await {
            Ok(()) => {
                debug!(lease = %lease, "egress lease released");
                Ok(())
            }
            Err(e) => {
                error!(lease = %lease, error = %e, "egress lease release failed");
                push_to_tray(&self.tray, lease);
                Err(e)
            }
        }
    }
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        if let Some(lease) = self.lease.take() {
            warn!(lease = %lease, "egress lease dropped without release, returning to tray");
            push_to_tray(&self.tray, lease);
        }
    }
}

impl fmt::Debug for LeaseGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeaseGuard")
            .field("lease", &self.lease)
            .finish_non_exhaustive()
    }
}
