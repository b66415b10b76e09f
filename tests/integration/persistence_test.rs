use chrono::Local;
use smartbin::core::bin_monitor::{load_store, save_store, LogKind, StateStore};
use smartbin::core::config::Settings;
use smartbin::core::protocol::split_chunk;
use smartbin::core::storage::{BlobStore, FileBlobStore, KEY_DB, KEY_HISTORY, KEY_SETTINGS};
use std::fs;
use tempfile::TempDir;

fn populated_store() -> StateStore {
    let settings = Settings {
        alert_threshold: 65,
        ..Settings::default()
    };
    let mut store = StateStore::new(settings);
    store.apply_batch(&split_chunk("BUKA,45,27,3,120\n"), Local::now());
    store.log(LogKind::Info, "Connected", None, Local::now());
    store
}

#[test]
fn test_file_store_round_trip_restores_everything() {
    let temp_dir = TempDir::new().unwrap();
    let blobs = FileBlobStore::new(temp_dir.path());
    let original = populated_store();

    assert!(save_store(&blobs, &original));
    let restored = load_store(&blobs);

    assert_eq!(restored.snapshot(), original.snapshot());
    assert_eq!(restored.settings(), original.settings());
    assert_eq!(restored.history(), original.history());
    assert_eq!(restored.logs().len(), original.logs().len());
}

#[test]
fn test_keys_are_namespaced_files() {
    let temp_dir = TempDir::new().unwrap();
    let blobs = FileBlobStore::new(temp_dir.path());
    save_store(&blobs, &populated_store());

    for key in [KEY_DB, KEY_SETTINGS, KEY_HISTORY] {
        let path = temp_dir.path().join(format!("smartbin.{}.json", key));
        assert!(path.exists(), "missing {}", path.display());
    }
}

#[test]
fn test_corrupted_files_fall_back_to_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let blobs = FileBlobStore::new(temp_dir.path());
    save_store(&blobs, &populated_store());

    fs::write(temp_dir.path().join("smartbin.db.json"), "{ not json").unwrap();
    fs::write(temp_dir.path().join("smartbin.history.json"), "[]").unwrap();

    let restored = load_store(&blobs);
    assert_eq!(restored.state().capacity, 0);
    assert!(restored.history().is_empty());
    // The separate settings key is still intact
    assert_eq!(restored.settings().alert_threshold, 65);
}

#[test]
fn test_missing_directory_loads_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let blobs = FileBlobStore::new(temp_dir.path().join("not-created-yet"));

    let store = load_store(&blobs);
    assert_eq!(store.state().total_usage, 0);
    assert!(blobs.get(KEY_DB).unwrap().is_none());
}

#[test]
fn test_save_creates_missing_directory() {
    let temp_dir = TempDir::new().unwrap();
    let blobs = FileBlobStore::new(temp_dir.path().join("nested").join("smartbin"));

    assert!(save_store(&blobs, &populated_store()));
    assert!(blobs.get(KEY_DB).unwrap().is_some());
}
