use serde_json::json;
use waygate_io::{JsonFileStore, RecordStore, StoreError};

#[test]
fn missing_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path().join("portals.json"));
    assert!(store.load_all().unwrap().is_empty());
}

#[test]
fn save_then_load_keeps_records_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonFileStore::new(dir.path().join("data").join("portals.json"));
    let records = vec![json!({"id": "a"}), json!({"id": "b", "n": 2})];
    store.save_all(&records).unwrap();
    assert_eq!(store.load_all().unwrap(), records);
    // No temp file left behind
    assert!(!dir.path().join("data").join("portals.json.tmp").exists());
}

#[test]
fn malformed_and_future_documents_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("portals.json");
    std::fs::write(&path, "{ not json").unwrap();
    let store = JsonFileStore::new(&path);
    assert!(matches!(store.load_all(), Err(StoreError::Malformed { .. })));

    std::fs::write(&path, r#"{"version": 99, "records": []}"#).unwrap();
    assert!(matches!(store.load_all(), Err(StoreError::Version { found: 99 })));
}
