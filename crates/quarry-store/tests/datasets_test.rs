use quarry_core::{Field, JobDataset, ProfileDataset, ProfileRecord};
use quarry_store::{JsonDirBackend, SqliteBackend, Store, JOB_DATASET, PROFILE_DATASET};
use tempfile::TempDir;

fn sample_profiles() -> ProfileDataset {
    let mut profiles = ProfileDataset::new();
    profiles.insert(
        "jane-doe-1a2b3c".to_string(),
        ProfileRecord {
            first_name: Field::Known("Jane".to_string()),
            headline: Field::Known("Platform Engineer".to_string()),
            discovered_by: Field::Known("scout@example.com".to_string()),
            ..ProfileRecord::default()
        },
    );
    profiles
}

#[tokio::test]
async fn test_profile_dataset_on_disk_keeps_unavailable_keys() {
    let tmp = TempDir::new().expect("create temp dir");
    let store = Store::new(JsonDirBackend::new(tmp.path()));

    store
        .save(PROFILE_DATASET, &sample_profiles())
        .await
        .expect("save profiles");

    let raw = std::fs::read_to_string(tmp.path().join("profile_data.json")).expect("read file");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    let record = &value["jane-doe-1a2b3c"];
    assert_eq!(record["firstName"], "Jane");
    assert_eq!(record["country"], false);
    assert_eq!(record["email_used"], "scout@example.com");
    assert_eq!(record["checked"], false);

    let loaded: ProfileDataset = store.load(PROFILE_DATASET).await.expect("load profiles");
    assert_eq!(loaded, sample_profiles());
}

#[tokio::test]
async fn test_corrupt_file_is_recovered_as_empty() {
    let tmp = TempDir::new().expect("create temp dir");
    std::fs::write(tmp.path().join("job_data.json"), "[1, 2,").expect("write corrupt file");

    let store = Store::new(JsonDirBackend::new(tmp.path()));
    let jobs: JobDataset = store.load(JOB_DATASET).await.expect("load jobs");
    assert!(jobs.is_empty());

    store.save(JOB_DATASET, &jobs).await.expect("save jobs");
    let kept = std::fs::read_to_string(tmp.path().join("job_data_corrupt.json"))
        .expect("corrupt copy written");
    assert_eq!(kept, "[1, 2,");
}

#[tokio::test]
async fn test_sqlite_backend_holds_typed_datasets() {
    let store = Store::new(SqliteBackend::in_memory().await.expect("open database"));

    store
        .save(PROFILE_DATASET, &sample_profiles())
        .await
        .expect("save profiles");
    let loaded: ProfileDataset = store.load(PROFILE_DATASET).await.expect("load profiles");
    assert_eq!(loaded.len(), 1);

    let jobs: JobDataset = store.load(JOB_DATASET).await.expect("load jobs");
    assert!(jobs.is_empty());
}
