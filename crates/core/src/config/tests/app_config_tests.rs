use crate::config::models::{AppConfig, LogFormat, StoreBackend};

#[test]
fn test_default_config() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());

    // 验证默认值
    assert_eq!(config.scheduler.load_balancer, "rr");
    assert_eq!(config.scheduler.eviction_interval_seconds, 5);
    assert_eq!(config.scheduler.stale_threshold_seconds, 300);
    assert_eq!(config.scheduler.max_error_count, 3);
    assert!(config.scheduler.health_check_enabled);
    assert!(!config.scheduler.rollback_on_dispatch_failure);
    assert_eq!(config.worker_store.backend, StoreBackend::Memory);
    assert_eq!(config.task_store.backend, StoreBackend::Memory);
    assert_eq!(config.redis.key_prefix, "ktools");
    assert_eq!(config.redis.command_timeout_seconds, 5);
    assert_eq!(config.redis.worker_ttl_seconds, 300);
    assert_eq!(config.worker_client.request_timeout_seconds, 5);
    assert!(config.workers.is_empty());
}

#[test]
fn test_config_from_toml() {
    let toml_content = r#"
[scheduler]
load_balancer = "wrr"
eviction_interval_seconds = 10
stale_threshold_seconds = 60
rollback_on_dispatch_failure = true

[worker_store]
backend = "redis"

[redis]
url = "redis://cache:6379"
key_prefix = "test"

[logging]
level = "debug"
format = "json"

[[workers]]
id = "worker-1"
addr = "127.0.0.1:9000"

[[workers]]
id = "worker-2"
addr = "127.0.0.1:9001"
weight = 3
"#;

    let config = AppConfig::from_toml(toml_content).unwrap();

    assert_eq!(config.scheduler.load_balancer, "wrr");
    assert_eq!(config.scheduler.eviction_interval_seconds, 10);
    assert_eq!(config.scheduler.stale_threshold_seconds, 60);
    assert!(config.scheduler.rollback_on_dispatch_failure);
    // 未写出的字段取默认值
    assert_eq!(config.scheduler.max_error_count, 3);

    assert_eq!(config.worker_store.backend, StoreBackend::Redis);
    assert_eq!(config.task_store.backend, StoreBackend::Memory);
    assert!(config.uses_redis());
    assert_eq!(config.redis.url, "redis://cache:6379");
    assert_eq!(config.redis.key_prefix, "test");
    assert_eq!(config.redis.worker_ttl_seconds, 300);

    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, LogFormat::Json);

    assert_eq!(config.workers.len(), 2);
    assert_eq!(config.workers[0].weight, 1);
    assert_eq!(config.workers[1].weight, 3);
}

#[test]
fn test_invalid_load_balancer() {
    let mut config = AppConfig::default();
    config.scheduler.load_balancer = "random".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_zero_intervals_rejected() {
    let mut config = AppConfig::default();
    config.scheduler.eviction_interval_seconds = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.scheduler.stale_threshold_seconds = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.worker_client.request_timeout_seconds = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_redis_url_only_checked_when_used() {
    let mut config = AppConfig::default();
    config.redis.url = "http://not-redis".to_string();
    assert!(config.validate().is_ok());

    config.task_store.backend = StoreBackend::Redis;
    assert!(config.validate().is_err());

    config.redis.url = "redis://127.0.0.1:6379/2".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_worker_ttl_checked_for_memory_backend() {
    let result = AppConfig::from_toml(
        r#"
[redis]
worker_ttl_seconds = 0
"#,
    );
    assert!(result.is_err());
}

#[test]
fn test_stale_threshold_must_not_exceed_worker_ttl() {
    let mut config = AppConfig::default();
    config.scheduler.stale_threshold_seconds = 600;
    config.redis.worker_ttl_seconds = 300;
    assert!(config.validate().is_err());

    config.redis.worker_ttl_seconds = 600;
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_log_level() {
    let result = AppConfig::from_toml(
        r#"
[logging]
level = "verbose"
"#,
    );
    assert!(result.is_err());
}

#[test]
fn test_static_worker_requires_addr() {
    let result = AppConfig::from_toml(
        r#"
[[workers]]
id = "worker-1"
addr = ""
"#,
    );
    assert!(result.is_err());
}
