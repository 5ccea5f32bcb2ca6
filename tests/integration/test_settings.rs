//! Settings file creation and layered loading.

use citelens::Settings;
use tempfile::TempDir;

#[test]
fn test_init_then_load_round_trips_defaults() {
    let dir = TempDir::new().unwrap();
    let path = Settings::init_config_file_in(dir.path(), false).unwrap();
    assert!(path.ends_with(".citelens/settings.toml"));

    let settings = Settings::load_from(&path).unwrap();
    let defaults = Settings::default();
    assert_eq!(settings.clustering.num_clusters, defaults.clustering.num_clusters);
    assert_eq!(settings.gaps.limit, defaults.gaps.limit);
    assert_eq!(settings.search.threshold, defaults.search.threshold);
    assert_eq!(settings.naming.timeout_ms, defaults.naming.timeout_ms);
    settings.validate().unwrap();
}

#[test]
fn test_init_refuses_to_overwrite_without_force() {
    let dir = TempDir::new().unwrap();
    Settings::init_config_file_in(dir.path(), false).unwrap();
    assert!(Settings::init_config_file_in(dir.path(), false).is_err());
    assert!(Settings::init_config_file_in(dir.path(), true).is_ok());
}

#[test]
fn test_partial_file_keeps_other_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(
        &path,
        "[clustering]\nnum_clusters = 8\nseed = 42\n\n[gaps]\nyear_from = 2015\n",
    )
    .unwrap();

    let settings = Settings::load_from(&path).unwrap();
    assert_eq!(settings.clustering.num_clusters, 8);
    assert_eq!(settings.clustering.seed, Some(42));
    assert_eq!(settings.clustering.min_cluster_size, 3);
    assert_eq!(settings.gaps.year_from, Some(2015));
    assert_eq!(settings.gaps.threshold, 0.7);
}

#[test]
fn test_out_of_range_file_value_fails_validation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, "[clustering]\nnum_clusters = 40\n").unwrap();

    let settings = Settings::load_from(&path).unwrap();
    assert!(settings.validate().is_err());
}

#[test]
fn test_saved_settings_load_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("settings.toml");
    let mut settings = Settings::default();
    settings.search.limit = 7;
    settings.save(&path).unwrap();

    assert_eq!(Settings::load_from(&path).unwrap().search.limit, 7);
}
