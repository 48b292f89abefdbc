use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{
    logging::LogConfig,
    scheduler::{SchedulerConfig, WorkerClientConfig},
    store::{RedisConfig, StoreBackend, StoreConfig},
};
use crate::models::WorkerRegistration;

/// 未指定配置文件时依次尝试的路径
const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "config/docsched.toml",
    "docsched.toml",
    "/etc/docsched/config.toml",
];

/// System configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub scheduler: SchedulerConfig,
    pub worker_store: StoreConfig,
    pub task_store: StoreConfig,
    pub redis: RedisConfig,
    pub worker_client: WorkerClientConfig,
    pub logging: LogConfig,
    /// 启动时静态注册的 Worker
    pub workers: Vec<WorkerRegistration>,
}

impl AppConfig {
    /// Load configuration from config file and environment variables
    ///
    /// Load order:
    /// 1. Default configuration
    /// 2. Config file (TOML format)
    /// 3. Environment variable overrides (prefix: DOCSCHED, separator: `__`)
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else if let Some(path) = DEFAULT_CONFIG_PATHS
            .iter()
            .find(|path| Path::new(path).exists())
        {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("DOCSCHED")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;

        config.validate()?;
        Ok(config)
    }

    /// 是否有任一注册表使用 Redis
    pub fn uses_redis(&self) -> bool {
        self.worker_store.backend == StoreBackend::Redis
            || self.task_store.backend == StoreBackend::Redis
    }

    /// Validate configuration effectiveness
    pub fn validate(&self) -> Result<()> {
        self.scheduler.validate().context("调度器配置验证失败")?;

        self.worker_client
            .validate()
            .context("Worker客户端配置验证失败")?;

        if self.uses_redis() {
            self.redis.validate().context("Redis配置验证失败")?;
        }

        self.validate_worker_ttl()?;

        self.logging.validate().context("日志配置验证失败")?;

        for worker in &self.workers {
            if worker.id.is_empty() {
                return Err(anyhow::anyhow!("静态Worker的ID不能为空"));
            }
            if worker.addr.is_empty() {
                return Err(anyhow::anyhow!("Worker {} 的地址不能为空", worker.id));
            }
        }

        Ok(())
    }

    /// Worker 记录过期时间对两种后端都生效
    ///
    /// 心跳超时阈值大于过期时间时，记录总会先过期，驱逐检查的心跳超时判断不会生效。
    fn validate_worker_ttl(&self) -> Result<()> {
        let ttl = self.redis.worker_ttl_seconds;
        if ttl == 0 {
            return Err(anyhow::anyhow!("Worker记录过期时间必须大于0"));
        }

        if self.scheduler.stale_threshold_seconds > ttl {
            return Err(anyhow::anyhow!(
                "心跳超时阈值 ({}秒) 不能大于Worker记录过期时间 ({}秒)",
                self.scheduler.stale_threshold_seconds,
                ttl
            ));
        }

        Ok(())
    }
}
