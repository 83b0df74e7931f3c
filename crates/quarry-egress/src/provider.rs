use crate::error::{EgressError, Result};
use crate::lease::EgressLease;
use async_trait::async_trait;
use quarry_core::EgressConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

/// Source of network egress channels for account sessions
#[async_trait]
pub trait EgressProvider: Send + Sync {
    /// Acquire `n` exclusive leases, or none at all
    async fn acquire(&self, n: usize) -> Result<Vec<EgressLease>>;

    /// Return leases to the provider
    async fn release(&self, leases: Vec<EgressLease>) -> Result<()>;
}

/// Build the provider selected by configuration.
///
/// Leasing enabled with an empty proxy list falls back to direct egress.
pub fn from_config(config: &EgressConfig) -> Result<Arc<dyn EgressProvider>> {
    if !config.enabled {
        debug!("egress leasing disabled, using direct egress");
        return Ok(Arc::new(DirectEgress));
    }

    if config.proxies.is_empty() {
        info!("egress leasing enabled but no proxies configured, using direct egress");
        return Ok(Arc::new(DirectEgress));
    }

    Ok(Arc::new(ProxyPool::new(&config.proxies)?))
}

/// Provider that hands out inert handles; traffic goes out directly
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectEgress;

#[async_trait]
impl EgressProvider for DirectEgress {
    async fn acquire(&self, n: usize) -> Result<Vec<EgressLease>> {
        Ok((0..n).map(|_| EgressLease::direct()).collect())
    }

    async fn release(&self, _leases: Vec<EgressLease>) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PoolState {
    free: VecDeque<Url>,
    leased: HashMap<Uuid, Url>,
}

/// Fixed set of proxies, each leased to at most one holder at a time
#[derive(Debug)]
pub struct ProxyPool {
    state: Mutex<PoolState>,
}

impl ProxyPool {
    /// Create a pool from proxy URL strings
    pub fn new(proxies: &[String]) -> Result<Self> {
        let free = proxies
            .iter()
            .map(|raw| {
                Url::parse(raw).map_err(|e| EgressError::InvalidProxy {
                    url: raw.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<VecDeque<_>>>()?;

        Ok(Self {
            state: Mutex::new(PoolState {
                free,
                leased: HashMap::new(),
            }),
        })
    }

    /// Number of proxies not currently leased
    pub async fn available(&self) -> usize {
        self.state.lock().await.free.len()
    }

    /// Number of proxies currently leased
    pub async fn leased(&self) -> usize {
        self.state.lock().await.leased.len()
    }
}

#[async_trait]
impl EgressProvider for ProxyPool {
    async fn acquire(&self, n: usize) -> Result<Vec<EgressLease>> {
        let mut state = self.state.lock().await;
        if state.free.len() < n {
            return Err(EgressError::Exhausted {
                requested: n,
                available: state.free.len(),
            });
        }

        let leases: Vec<EgressLease> = state
            .free
            .drain(..n)
            .map(EgressLease::via_proxy)
            .collect();
        for lease in &leases {
            if let Some(proxy) = lease.proxy() {
                state.leased.insert(lease.id(), proxy.clone());
            }
        }

        debug!(leased = n, free = state.free.len(), "acquired proxy leases");
        Ok(leases)
    }

    async fn release(&self, leases: Vec<EgressLease>) -> Result<()> {
        let mut state = self.state.lock().await;

        // Check every id first so a bad batch returns nothing
        if let Some(unknown) = leases.iter().find(|l| !state.leased.contains_key(&l.id())) {
            return Err(EgressError::UnknownLease(unknown.id()));
        }

        for lease in &leases {
            if let Some(proxy) = state.leased.remove(&lease.id()) {
                state.free.push_back(proxy);
            }
        }

        debug!(released = leases.len(), free = state.free.len(), "released proxy leases");
        Ok(())
    }
}
