//! Configuration resolution through the public API
//!
//! File on disk → CLI/env overrides → resolved config, the way the binary
//! assembles it.

use audit_common::config::{spec_cache_file, DEFAULT_CATALOG_BASE_URL};
use audit_common::{CatalogYear, Error, ScraperConfig, TomlConfig};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_file_supplies_credentials_and_overrides_win() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    let path = write_config(
        &dir,
        &format!(
            r#"
student_id = "12345678"
auth_header = "Bearer from-file"
request_delay_ms = 1500
data_folder = "{}"
course_index_path = "/srv/courses.json"
"#,
            data.display()
        ),
    );

    let file = TomlConfig::load(&path).unwrap();
    let overrides = TomlConfig {
        auth_header: Some("Bearer from-cli".to_string()),
        max_retries: Some(0),
        ..Default::default()
    };
    let config = ScraperConfig::resolve(overrides, file).unwrap();

    assert_eq!(config.student_id, "12345678");
    assert_eq!(config.auth_header, "Bearer from-cli");
    assert_eq!(config.request_delay, Duration::from_millis(1500));
    assert_eq!(config.max_retries, 0);
    assert_eq!(config.catalog_base_url, DEFAULT_CATALOG_BASE_URL);
    assert_eq!(config.course_index_path, Some(PathBuf::from("/srv/courses.json")));
    assert_eq!(config.output_path, data.join("programs.json"));
    assert_eq!(
        config.spec_cache_path(CatalogYear::starting(2025)),
        spec_cache_file(&data, CatalogYear::starting(2025))
    );
}

#[test]
fn test_defaults_without_file() {
    let dir = TempDir::new().unwrap();
    let file = TomlConfig::load(&dir.path().join("missing.toml")).unwrap();
    let overrides = TomlConfig {
        student_id: Some("1".to_string()),
        auth_header: Some("Bearer x".to_string()),
        data_folder: Some(dir.path().to_path_buf()),
        ..Default::default()
    };

    let config = ScraperConfig::resolve(overrides, file).unwrap();
    assert_eq!(config.request_delay, Duration::from_millis(1000));
    assert_eq!(config.request_timeout, Duration::from_secs(60));
    assert_eq!(config.max_retries, 3);
    assert!(config.course_index_path.is_none());
    assert!(config.log_level.contains("audit_scraper=info"));
}

#[test]
fn test_malformed_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "student_id = [\n");
    assert!(matches!(TomlConfig::load(&path), Err(Error::Config(_))));
}
