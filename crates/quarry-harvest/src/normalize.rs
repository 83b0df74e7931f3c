//! Raw payloads to canonical records.
//!
//! Normalization never fails: a missing or mistyped key becomes
//! [`Field::Unavailable`] and the record keeps every field.

use quarry_core::{
    AccountId, CompanyData, CompanyRecord, Field, JobDataset, JobRecord, ProfileRecord,
};
use serde_json::Value;
use tracing::warn;

/// Last `:`-separated segment of a URN.
pub fn urn_tail(urn: &str) -> &str {
    urn.rsplit(':').next().unwrap_or(urn)
}

fn text(raw: &Value, pointer: &str) -> Field<String> {
    raw.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .into()
}

fn count(raw: &Value, pointer: &str) -> Field<u64> {
    raw.pointer(pointer).and_then(Value::as_u64).into()
}

fn any(raw: &Value, pointer: &str) -> Field<Value> {
    raw.pointer(pointer).filter(|v| !v.is_null()).cloned().into()
}

/// Years since the start of the earliest dated position.
///
/// Positions are listed newest first, so the last entry carrying a time
/// period is the earliest.
pub fn years_experience(raw: &Value, current_year: i32) -> Option<u32> {
    let start = raw
        .get("experience")?
        .as_array()?
        .iter()
        .filter_map(|position| position.get("timePeriod"))
        .last()?
        .pointer("/startDate/year")?
        .as_i64()?;

    u32::try_from(i64::from(current_year) - start).ok()
}

/// Detail view of a person. The result is marked checked.
pub fn normalize_profile(raw: &Value, current_year: i32) -> ProfileRecord {
    ProfileRecord {
        country: text(raw, "/geoCountryName"),
        location: text(raw, "/geoLocationName"),
        first_name: text(raw, "/firstName"),
        last_name: text(raw, "/lastName"),
        years_experience: years_experience(raw, current_year).into(),
        jobs: any(raw, "/experience"),
        summary: text(raw, "/summary"),
        headline: text(raw, "/headline"),
        member_id: raw
            .get("member_urn")
            .and_then(Value::as_str)
            .map(|urn| urn_tail(urn).to_string())
            .into(),
        outreach_log: Vec::new(),
        checked: true,
        discovered_by: Field::Unavailable,
    }
}

/// One entry of a people search page, keyed by its public id.
///
/// Returns `None` if the entry has no public id.
pub fn normalize_search_profile(raw: &Value, account: &AccountId) -> Option<(String, ProfileRecord)> {
    let public_id = raw.get("public_id").and_then(Value::as_str)?.to_string();
    let record = ProfileRecord {
        location: text(raw, "/location"),
        headline: text(raw, "/jobtitle"),
        checked: false,
        discovered_by: Field::Known(account.to_string()),
        ..ProfileRecord::default()
    };
    Some((public_id, record))
}

/// Company id of a job posting: the company URN's tail, else the trimmed
/// company name.
fn company_id(raw: &Value) -> Option<String> {
    if let Some(urn) = raw.pointer("/companyDetails/company").and_then(Value::as_str) {
        return Some(urn_tail(urn).to_string());
    }
    raw.pointer("/companyDetails/companyName")
        .and_then(Value::as_str)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

fn normalize_job(raw: &Value) -> JobRecord {
    JobRecord {
        title: text(raw, "/title"),
        compensation: any(raw, "/salaryInsights/compensationBreakdown"),
        location: text(raw, "/formattedLocation"),
        benefits: text(raw, "/briefBenefitsDescription"),
        apply_url: text(raw, "/applyMethod/companyApplyUrl"),
        scraped: false,
    }
}

/// A job search page grouped by company. Every listing starts unscraped.
///
/// Postings without a company or job id are skipped.
pub fn normalize_job_search(page: &[Value]) -> JobDataset {
    let mut dataset = JobDataset::new();

    for raw in page {
        let Some(company) = company_id(raw) else {
            warn!("job posting without company id, skipping");
            continue;
        };
        let Some(job) = raw
            .get("dashEntityUrn")
            .and_then(Value::as_str)
            .map(|urn| urn_tail(urn).to_string())
        else {
            warn!(company = %company, "job posting without entity urn, skipping");
            continue;
        };

        dataset
            .entry(company)
            .or_insert_with(CompanyRecord::default)
            .jobs
            .insert(job, normalize_job(raw));
    }

    dataset
}

/// Company detail view.
pub fn normalize_company(raw: &Value) -> CompanyData {
    let industries = raw
        .get("companyIndustries")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|industry| industry.get("localizedName").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        });

    CompanyData {
        staff_count: count(raw, "/staffCount"),
        url: text(raw, "/url"),
        industries: industries.into(),
        follower_count: count(raw, "/followingInfo/followerCount"),
    }
}
