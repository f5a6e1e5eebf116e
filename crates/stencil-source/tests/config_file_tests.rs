use std::fs;

use stencil_source::{ConfigError, EngineConfig};
use tempfile::TempDir;

#[test]
fn test_load_config_from_file() {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let path = temp_dir.path().join("engine.toml");
    fs::write(
        &path,
        r#"
[compile]
no_result_value = true

[heap]
gc_threshold = 2048
max_bytes = 65536

[link]
validate_stencils = true
"#,
    )
    .expect("Failed to write config file");

    let config = EngineConfig::load(&path).expect("config should load");
    assert!(config.compile.no_result_value);
    assert_eq!(config.heap.gc_threshold, 2048);
    assert_eq!(config.heap.max_bytes, 65536);
    assert!(!config.heap.gc_zeal);
    assert!(config.link.validate_stencils);
}

#[test]
fn test_missing_config_file() {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let path = temp_dir.path().join("missing.toml");

    match EngineConfig::load(&path) {
        Err(ConfigError::ReadError { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected ReadError, got {:?}", other),
    }
}
