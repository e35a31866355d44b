use std::fs;
use std::path::PathBuf;

use slideconfig::{ConfigError, SlideshowConfig};
use tempfile::TempDir;

#[test]
fn relative_paths_resolve_against_config_directory() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("slidewall.toml");
    fs::write(
        &config_path,
        r#"
version = 1
displacement = "maps/displacement.jpg"
slides = ["images/a.jpg", "/absolute/b.jpg"]
"#,
    )
    .unwrap();

    let config = SlideshowConfig::from_path(&config_path).unwrap();
    config.validate().unwrap();
    assert_eq!(
        config.displacement,
        Some(dir.path().join("maps/displacement.jpg"))
    );
    assert_eq!(
        config.slides,
        vec![dir.path().join("images/a.jpg"), PathBuf::from("/absolute/b.jpg")]
    );
}

#[test]
fn missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");
    let err = SlideshowConfig::from_path(&missing).unwrap_err();
    match err {
        ConfigError::Io { path, .. } => assert_eq!(path, missing),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("slidewall.toml");
    fs::write(&config_path, "version = [").unwrap();
    let err = SlideshowConfig::from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
