//! Environment overrides for the storage config
//!
//! Kept in its own test binary so the environment it sets does not leak into
//! other config tests.

use std::path::PathBuf;

use live_schemas::StorageConfig;

#[test]
fn test_numeric_env_value_stays_a_path() {
    std::env::set_var("LIVE_SCHEMAS__STORAGE__SCHEMA_VOLUME_PATH", "2024");

    let config = StorageConfig::load().unwrap();
    assert_eq!(config.storage.schema_volume_path, PathBuf::from("2024"));

    std::env::remove_var("LIVE_SCHEMAS__STORAGE__SCHEMA_VOLUME_PATH");
}
