use smartbin::core::config::{Settings, UsageCounting, SETTING_KEYS};
use smartbin::core::storage::{BlobStore, FileBlobStore, KEY_SETTINGS};
use tempfile::TempDir;

#[test]
fn test_settings_default_when_nothing_stored() {
    let temp_dir = TempDir::new().unwrap();
    let blobs = FileBlobStore::new(temp_dir.path());

    let settings = Settings::load(&blobs).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_set_save_and_reload() {
    let temp_dir = TempDir::new().unwrap();
    let blobs = FileBlobStore::new(temp_dir.path());

    let mut settings = Settings::load(&blobs).unwrap();
    settings.set_value("portPath", "/dev/ttyACM0").unwrap();
    settings.set_value("connection_baud", "9600").unwrap();
    settings.set_value("usageCounting", "deviceOnly").unwrap();
    settings.save(&blobs).unwrap();

    let reloaded = Settings::load(&blobs).unwrap();
    assert_eq!(reloaded.port_path.as_deref(), Some("/dev/ttyACM0"));
    assert_eq!(reloaded.connection_baud, 9600);
    assert_eq!(reloaded.usage_counting, UsageCounting::DeviceOnly);
}

#[test]
fn test_stored_json_uses_camel_case() {
    let temp_dir = TempDir::new().unwrap();
    let blobs = FileBlobStore::new(temp_dir.path());
    Settings::default().save(&blobs).unwrap();

    let raw = blobs.get(KEY_SETTINGS).unwrap().unwrap();
    assert!(raw.contains("\"connectionBaud\": 115200"));
    assert!(raw.contains("\"autoRefreshInterval\": 5000"));
    assert!(raw.contains("\"alertThreshold\": 80"));
}

#[test]
fn test_partial_file_fills_in_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let blobs = FileBlobStore::new(temp_dir.path());
    blobs
        .put(KEY_SETTINGS, r#"{ "alertThreshold": 90, "autoRefresh": true }"#)
        .unwrap();

    let settings = Settings::load(&blobs).unwrap();
    assert_eq!(settings.alert_threshold, 90);
    assert!(settings.auto_refresh);
    assert_eq!(settings.connection_baud, 115_200);
}

#[test]
fn test_out_of_range_values_are_sanitized_on_load() {
    let temp_dir = TempDir::new().unwrap();
    let blobs = FileBlobStore::new(temp_dir.path());
    blobs
        .put(
            KEY_SETTINGS,
            r#"{ "autoRefreshInterval": 10, "minDistance": 60, "maxDistance": 20 }"#,
        )
        .unwrap();

    let settings = Settings::load(&blobs).unwrap();
    assert!(settings.auto_refresh_interval >= 500);
    assert!(settings.max_distance > settings.min_distance);
}

#[test]
fn test_every_listed_key_is_readable() {
    let settings = Settings::default();
    for key in SETTING_KEYS {
        assert!(settings.get_value(key).is_some(), "no value for {}", key);
    }
    assert!(settings.get_value("colour").is_none());
}
