//! Canonical record shapes.
//!
//! Every optional value is a [`Field`], so a record always carries every key:
//! a value that could not be obtained is stored as [`Field::Unavailable`]
//! rather than being left out. On disk the sentinel is `false`; `false` and
//! `null` both read back as `Unavailable`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// A value that is either known or explicitly unavailable.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    /// The value was present in the fetched payload
    Known(T),
    /// The value could not be obtained
    Unavailable,
}

impl<T> Field<T> {
    /// Returns true if the value is known.
    #[must_use]
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Borrow the known value, if any.
    #[must_use]
    pub fn as_known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            Self::Unavailable => None,
        }
    }

    /// Convert into an `Option`.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Known(value) => Some(value),
            Self::Unavailable => None,
        }
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Unavailable
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unavailable, Self::Known)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(value) => value.serialize(serializer),
            Self::Unavailable => serializer.serialize_bool(false),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldRepr<T> {
    Missing(()),
    Flag(bool),
    Value(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match FieldRepr::<T>::deserialize(deserializer)? {
            FieldRepr::Missing(()) | FieldRepr::Flag(false) => Ok(Self::Unavailable),
            FieldRepr::Flag(true) => Err(D::Error::custom(
                "`true` is not a valid value or unavailable sentinel",
            )),
            FieldRepr::Value(value) => Ok(Self::Known(value)),
        }
    }
}

/// A person, keyed by public identifier in [`ProfileDataset`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub country: Field<String>,
    #[serde(default)]
    pub location: Field<String>,
    #[serde(rename = "firstName", default)]
    pub first_name: Field<String>,
    #[serde(rename = "lastName", default)]
    pub last_name: Field<String>,
    /// Years since the earliest dated position
    #[serde(rename = "experience", default)]
    pub years_experience: Field<u32>,
    /// Raw job history as returned by the remote source
    #[serde(default)]
    pub jobs: Field<serde_json::Value>,
    #[serde(default)]
    pub summary: Field<String>,
    #[serde(default)]
    pub headline: Field<String>,
    /// Canonical member id (last segment of the member URN)
    #[serde(rename = "member_urn", default)]
    pub member_id: Field<String>,
    /// Outreach sent to this person, oldest first
    #[serde(rename = "sentEmails", default)]
    pub outreach_log: Vec<String>,
    /// Whether the detail view has been fetched
    #[serde(default)]
    pub checked: bool,
    /// Account whose search surfaced this record
    #[serde(rename = "email_used", default)]
    pub discovered_by: Field<String>,
}

impl ProfileRecord {
    /// A record whose every detail field is unavailable.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Copy every detail field and the checked flag from `other`.
    ///
    /// The outreach log and `discovered_by` are left alone; they follow their
    /// own merge rules.
    pub fn overwrite_details(&mut self, other: &Self) {
        self.country = other.country.clone();
        self.location = other.location.clone();
        self.first_name = other.first_name.clone();
        self.last_name = other.last_name.clone();
        self.years_experience = other.years_experience.clone();
        self.jobs = other.jobs.clone();
        self.summary = other.summary.clone();
        self.headline = other.headline.clone();
        self.member_id = other.member_id.clone();
        self.checked = other.checked;
    }
}

/// A job listing inside a [`CompanyRecord`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(default)]
    pub title: Field<String>,
    #[serde(rename = "compBreakdown", default)]
    pub compensation: Field<serde_json::Value>,
    #[serde(default)]
    pub location: Field<String>,
    #[serde(default)]
    pub benefits: Field<String>,
    #[serde(rename = "applyUrl", default)]
    pub apply_url: Field<String>,
    /// Whether the detail view has been fetched
    #[serde(default)]
    pub scraped: bool,
}

/// Company-level details fetched separately from its listings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompanyData {
    #[serde(rename = "staffCount", default)]
    pub staff_count: Field<u64>,
    #[serde(default)]
    pub url: Field<String>,
    #[serde(default)]
    pub industries: Field<Vec<String>>,
    #[serde(rename = "followerCount", default)]
    pub follower_count: Field<u64>,
}

/// A company and the listings seen for it, keyed by company id in [`JobDataset`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompanyRecord {
    #[serde(default)]
    pub jobs: BTreeMap<String, JobRecord>,
    #[serde(rename = "companyData", default, skip_serializing_if = "Option::is_none")]
    pub company_data: Option<CompanyData>,
}

/// Reference to one listing in a [`JobDataset`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobRef {
    pub company_id: String,
    pub job_id: String,
}

impl std::fmt::Display for JobRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.company_id, self.job_id)
    }
}

/// Canonical profile dataset: public id → record.
pub type ProfileDataset = BTreeMap<String, ProfileRecord>;

/// Canonical job dataset: company id → company.
pub type JobDataset = BTreeMap<String, CompanyRecord>;

/// Public ids whose detail view has not been fetched yet.
#[must_use]
pub fn unchecked_profiles(dataset: &ProfileDataset) -> Vec<String> {
    dataset
        .iter()
        .filter(|(_, record)| !record.checked)
        .map(|(id, _)| id.clone())
        .collect()
}

/// Listings whose detail view has not been fetched yet.
#[must_use]
pub fn unscraped_jobs(dataset: &JobDataset) -> Vec<JobRef> {
    dataset
        .iter()
        .flat_map(|(company_id, company)| {
            company
                .jobs
                .iter()
                .filter(|(_, job)| !job.scraped)
                .map(move |(job_id, _)| JobRef {
                    company_id: company_id.clone(),
                    job_id: job_id.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unavailable_serializes_as_false_and_keeps_key() {
        let record = ProfileRecord::unavailable();
        let value = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(value["country"], json!(false));
        assert_eq!(value["firstName"], json!(false));
        assert_eq!(value["sentEmails"], json!([]));
        assert_eq!(value["checked"], json!(false));
    }

    #[test]
    fn test_field_reads_false_and_null_as_unavailable() {
        let record: JobRecord = serde_json::from_value(json!({
            "title": false,
            "location": null,
            "benefits": "Dental",
            "scraped": true
        }))
        .expect("deserialize job");
        assert_eq!(record.title, Field::Unavailable);
        assert_eq!(record.location, Field::Unavailable);
        assert_eq!(record.benefits, Field::Known("Dental".to_string()));
        // Missing keys default to unavailable
        assert_eq!(record.apply_url, Field::Unavailable);
        assert!(record.scraped);
    }

    #[test]
    fn test_field_rejects_true_sentinel() {
        let result: Result<CompanyData, _> = serde_json::from_value(json!({ "url": true }));
        assert!(result.is_err());
    }

    #[test]
    fn test_field_option_conversions() {
        let known: Field<u32> = Some(7).into();
        assert!(known.is_known());
        assert_eq!(known.as_known(), Some(&7));
        let missing: Field<u32> = None.into();
        assert_eq!(missing.into_option(), None);
    }

    #[test]
    fn test_overwrite_details_keeps_outreach_and_discovery() {
        let mut existing = ProfileRecord {
            headline: Field::Known("Old".to_string()),
            outreach_log: vec!["intro".to_string()],
            discovered_by: Field::Known("a@example.com".to_string()),
            ..ProfileRecord::default()
        };
        let incoming = ProfileRecord {
            headline: Field::Known("New".to_string()),
            checked: true,
            ..ProfileRecord::default()
        };

        existing.overwrite_details(&incoming);

        assert_eq!(existing.headline, Field::Known("New".to_string()));
        assert!(existing.checked);
        assert_eq!(existing.outreach_log, vec!["intro".to_string()]);
        assert!(existing.discovered_by.is_known());
    }

    #[test]
    fn test_pending_work_queries() {
        let mut profiles = ProfileDataset::new();
        profiles.insert("done".to_string(), ProfileRecord { checked: true, ..Default::default() });
        profiles.insert("todo".to_string(), ProfileRecord::default());
        assert_eq!(unchecked_profiles(&profiles), vec!["todo".to_string()]);

        let mut jobs = JobDataset::new();
        let mut company = CompanyRecord::default();
        company.jobs.insert("1".to_string(), JobRecord { scraped: true, ..Default::default() });
        company.jobs.insert("2".to_string(), JobRecord::default());
        jobs.insert("acme".to_string(), company);
        assert_eq!(
            unscraped_jobs(&jobs),
            vec![JobRef {
                company_id: "acme".to_string(),
                job_id: "2".to_string()
            }]
        );
    }

    #[test]
    fn test_company_data_omitted_when_absent() {
        let value = serde_json::to_value(CompanyRecord::default()).expect("serialize company");
        assert!(value.get("companyData").is_none());
        assert_eq!(value["jobs"], json!({}));
    }
}
