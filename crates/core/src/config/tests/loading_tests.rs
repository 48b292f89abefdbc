use crate::config::models::{AppConfig, StoreBackend};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::with_suffix(".toml").unwrap();
    writeln!(
        file,
        r#"
[scheduler]
eviction_interval_seconds = 2

[task_store]
backend = "redis"

[[workers]]
id = "worker-a"
addr = "10.0.0.1:9000"
"#
    )
    .unwrap();

    let path = file.path().to_str().unwrap();
    let config = AppConfig::load(Some(path)).unwrap();

    assert_eq!(config.scheduler.eviction_interval_seconds, 2);
    assert_eq!(config.scheduler.stale_threshold_seconds, 300);
    assert_eq!(config.task_store.backend, StoreBackend::Redis);
    assert_eq!(config.workers.len(), 1);
    assert_eq!(config.workers[0].id, "worker-a");
}

#[test]
fn test_load_missing_file() {
    let result = AppConfig::load(Some("/nonexistent/docsched.toml"));
    assert!(result.is_err());
}

#[test]
fn test_load_rejects_invalid_file() {
    let mut file = NamedTempFile::with_suffix(".toml").unwrap();
    writeln!(
        file,
        r#"
[scheduler]
load_balancer = "least_conn"
"#
    )
    .unwrap();

    let result = AppConfig::load(Some(file.path().to_str().unwrap()));
    assert!(result.is_err());
}
