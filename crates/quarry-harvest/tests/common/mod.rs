//! Scripted remote service shared by the harvest integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use quarry_core::AccountId;
use quarry_egress::EgressLease;
use quarry_harvest::{Pacer, RemoteSource, SourceConnector, SourceError, WorkerSettings};
use quarry_ledger::{Credential, CredentialBook, Ledger, QuotaLimits};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

type Page = Result<Vec<Value>, SourceError>;

/// Canned responses, keyed by id or by search offset.
#[derive(Default)]
pub struct FakeRemote {
    pub profiles: HashMap<String, Value>,
    pub jobs: HashMap<String, Value>,
    pub companies: HashMap<String, Value>,
    pub profile_pages: HashMap<u32, Page>,
    pub job_pages: HashMap<u32, Page>,
    /// Ids whose detail fetch fails with a rate limit
    pub failing: HashSet<String>,
    /// Ids whose detail fetch never answers
    pub hanging: HashSet<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeRemote {
    pub fn with_profiles(ids: &[&str]) -> Self {
        let mut remote = Self::default();
        for id in ids {
            remote.profiles.insert((*id).to_string(), profile_payload(id));
        }
        remote
    }

    /// (account, call) pairs in the order they were made.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, account: &AccountId, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((account.to_string(), call));
        }
    }

    async fn detail(&self, map: &HashMap<String, Value>, id: &str) -> Result<Value, SourceError> {
        if self.hanging.contains(id) {
            tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
        }
        if self.failing.contains(id) {
            return Err(SourceError::RateLimited);
        }
        map.get(id)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(id.to_string()))
    }
}

struct FakeSession {
    account: AccountId,
    remote: Arc<FakeRemote>,
}

#[async_trait]
impl RemoteSource for FakeSession {
    async fn fetch_profile(&self, public_id: &str) -> Result<Value, SourceError> {
        self.remote.record(&self.account, format!("profile:{public_id}"));
        self.remote.detail(&self.remote.profiles, public_id).await
    }

    async fn fetch_job(&self, job_id: &str) -> Result<Value, SourceError> {
        self.remote.record(&self.account, format!("job:{job_id}"));
        self.remote.detail(&self.remote.jobs, job_id).await
    }

    async fn fetch_company(&self, company_id: &str) -> Result<Value, SourceError> {
        self.remote.record(&self.account, format!("company:{company_id}"));
        self.remote.detail(&self.remote.companies, company_id).await
    }

    async fn search_profiles(
        &self,
        keyword: &str,
        offset: u32,
        _limit: u32,
    ) -> Result<Vec<Value>, SourceError> {
        self.remote
            .record(&self.account, format!("search_profiles:{keyword}:{offset}"));
        self.remote
            .profile_pages
            .get(&offset)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn search_jobs(
        &self,
        keyword: &str,
        offset: u32,
        _limit: u32,
    ) -> Result<Vec<Value>, SourceError> {
        self.remote
            .record(&self.account, format!("search_jobs:{keyword}:{offset}"));
        self.remote
            .job_pages
            .get(&offset)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Hands out sessions over a [`FakeRemote`] and remembers which egress
/// each account was given.
pub struct FakeConnector {
    remote: Arc<FakeRemote>,
    refused: HashSet<String>,
    sessions: Mutex<Vec<(String, Option<Url>)>>,
}

impl FakeConnector {
    pub fn new(remote: FakeRemote) -> Arc<Self> {
        Self::refusing(remote, &[])
    }

    /// A connector whose session setup fails for the listed accounts.
    pub fn refusing(remote: FakeRemote, accounts: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            remote: Arc::new(remote),
            refused: accounts.iter().map(|a| (*a).to_string()).collect(),
            sessions: Mutex::new(Vec::new()),
        })
    }

    pub fn remote(&self) -> &FakeRemote {
        &self.remote
    }

    pub fn sessions(&self) -> Vec<(String, Option<Url>)> {
        self.sessions
            .lock()
            .map(|sessions| sessions.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SourceConnector for FakeConnector {
    async fn connect(
        &self,
        account: &AccountId,
        credential: &Credential,
        lease: &EgressLease,
    ) -> Result<Box<dyn RemoteSource>, SourceError> {
        assert!(!credential.expose().is_empty());
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.push((account.to_string(), lease.proxy().cloned()));
        }
        if self.refused.contains(account.as_str()) {
            return Err(SourceError::Challenge);
        }
        Ok(Box::new(FakeSession {
            account: account.clone(),
            remote: Arc::clone(&self.remote),
        }))
    }
}

pub fn account(id: &str) -> AccountId {
    AccountId::new(id).expect("valid account ID")
}

pub fn credentials(ids: &[&str]) -> CredentialBook {
    let contents: String = ids.iter().map(|id| format!("{id}:secret-{id}\n")).collect();
    CredentialBook::parse(&contents).expect("valid logins")
}

pub fn limits(searches: u32, profile_visits: u32) -> QuotaLimits {
    QuotaLimits {
        searches,
        profile_visits,
        ..QuotaLimits::default()
    }
}

/// A ledger with every account in `book` registered at zero usage.
pub fn ledger_for(book: &CredentialBook, limits: QuotaLimits) -> Ledger {
    let mut ledger = Ledger::new(limits);
    ledger.sync_accounts(book.account_ids());
    ledger
}

pub fn worker_settings() -> WorkerSettings {
    WorkerSettings {
        fetch_timeout: Duration::from_secs(90),
        pacer: Pacer::new(Duration::from_secs(30), Duration::from_secs(33)),
        quota_limit: 80,
    }
}

pub fn profile_payload(public_id: &str) -> Value {
    json!({
        "firstName": public_id,
        "lastName": "Doe",
        "headline": "Engineer",
        "geoLocationName": "Berlin",
        "geoCountryName": "Germany",
        "member_urn": format!("urn:li:member:{}", public_id.len()),
        "experience": [
            { "timePeriod": { "startDate": { "year": 2015 } } }
        ]
    })
}

pub fn search_profile(public_id: &str) -> Value {
    json!({ "public_id": public_id, "location": "Berlin", "jobtitle": "Engineer" })
}

pub fn job_posting(company: &str, job: &str) -> Value {
    json!({
        "title": format!("Role {job}"),
        "companyDetails": { "company": format!("urn:li:fs_normalized_company:{company}") },
        "dashEntityUrn": format!("urn:li:fsd_jobPosting:{job}"),
        "formattedLocation": "Remote"
    })
}

pub fn company_payload(staff: u64) -> Value {
    json!({
        "staffCount": staff,
        "url": "https://www.example.com/company/acme",
        "companyIndustries": [{ "localizedName": "Software" }],
        "followingInfo": { "followerCount": 1200 }
    })
}
