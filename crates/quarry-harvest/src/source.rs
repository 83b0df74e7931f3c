//! Contract with the remote data service.
//!
//! Payloads are opaque JSON; [`crate::normalize`] turns them into records.

use async_trait::async_trait;
use quarry_core::AccountId;
use quarry_egress::EgressLease;
use quarry_ledger::Credential;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Per-call failures of the remote service. All of them are recoverable.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("rate limited by remote service")]
    RateLimited,

    #[error("challenge required by remote service")]
    Challenge,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("session expired")]
    SessionExpired,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),
}

/// An authenticated session against the remote service.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_profile(&self, public_id: &str) -> Result<Value, SourceError>;

    async fn fetch_job(&self, job_id: &str) -> Result<Value, SourceError>;

    async fn fetch_company(&self, company_id: &str) -> Result<Value, SourceError>;

    /// One page of people matching `keyword`.
    async fn search_profiles(
        &self,
        keyword: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Value>, SourceError>;

    /// One page of job postings matching `keyword`.
    async fn search_jobs(
        &self,
        keyword: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Value>, SourceError>;
}

/// Opens sessions for accounts over a leased egress channel.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    async fn connect(
        &self,
        account: &AccountId,
        credential: &Credential,
        lease: &EgressLease,
    ) -> Result<Box<dyn RemoteSource>, SourceError>;
}

/// Run one remote call under a deadline; expiry is a [`SourceError::Timeout`].
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, SourceError>
where
    F: Future<Output = Result<T, SourceError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(SourceError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_maps_elapsed() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(120)).await;
            Ok::<_, SourceError>(Value::Null)
        };
        let err = with_timeout(Duration::from_secs(90), slow)
            .await
            .expect_err("deadline expires");
        assert!(matches!(err, SourceError::Timeout(d) if d == Duration::from_secs(90)));
    }

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let fast = async { Err::<Value, _>(SourceError::NotFound("jane".to_string())) };
        let err = with_timeout(Duration::from_secs(1), fast)
            .await
            .expect_err("inner error");
        assert_eq!(err.to_string(), "not found: jane");
    }
}
