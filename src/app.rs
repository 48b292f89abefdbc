use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{info, warn};

use docsched_core::{AppConfig, LogFormat};
use docsched_dispatcher::{
    load_balancer_from_name, Scheduler, SchedulerOptions, WorkerManager, WorkerManagerConfig,
};
use docsched_infrastructure::StoreFactory;

/// 命令行对配置的覆盖
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub log_level: Option<String>,
    pub log_format: Option<String>,
}

/// 加载配置并应用命令行覆盖
pub fn load_config(config_path: Option<&str>, overrides: &CliOverrides) -> Result<AppConfig> {
    let mut config = AppConfig::load(config_path)
        .with_context(|| format!("加载配置失败: {}", config_path.unwrap_or("<默认路径>")))?;

    if let Some(level) = &overrides.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &overrides.log_format {
        config.logging.format = format.parse::<LogFormat>()?;
    }

    config.validate()?;
    Ok(config)
}

/// 按配置组装调度器
///
/// 必须在 tokio 运行时中调用，Worker 驱逐循环随之启动。
pub async fn build_scheduler(config: &AppConfig) -> Result<Scheduler> {
    let stores = StoreFactory::create(config)
        .await
        .context("创建注册表失败")?;
    let load_balancer = load_balancer_from_name(&config.scheduler.load_balancer)?;
    let manager_config = WorkerManagerConfig::from_config(&config.scheduler, &config.worker_client);
    let worker_manager = WorkerManager::new(stores.worker_store, load_balancer, manager_config)
        .context("创建Worker管理器失败")?;

    let options = SchedulerOptions {
        rollback_on_dispatch_failure: config.scheduler.rollback_on_dispatch_failure,
    };

    Ok(Scheduler::new(
        stores.task_store,
        Arc::new(worker_manager),
        options,
    ))
}

/// 主应用程序
pub struct Application {
    config: AppConfig,
    scheduler: Arc<Scheduler>,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self> {
        info!(
            "初始化应用程序 (负载均衡: {}, Worker注册表: {:?}, 任务注册表: {:?})",
            config.scheduler.load_balancer, config.worker_store.backend, config.task_store.backend
        );

        let scheduler = Arc::new(build_scheduler(&config).await?);
        Ok(Self { config, scheduler })
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// 启动调度器并注册静态 Worker，返回注册成功的数量
    pub async fn start(&self) -> Result<usize> {
        self.scheduler.start()?;

        let mut registered = 0;
        for worker in &self.config.workers {
            match self.scheduler.register_worker(worker.clone()).await {
                Ok(()) => registered += 1,
                Err(e) => warn!("注册静态Worker {} 失败: {}", worker.id, e),
            }
        }

        info!(
            "应用程序已启动，静态Worker {}/{} 个",
            registered,
            self.config.workers.len()
        );
        Ok(registered)
    }

    /// 运行直到收到关闭信号
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        self.start().await?;

        let _ = shutdown_rx.recv().await;
        info!("收到关闭信号，停止调度器");

        self.scheduler.stop().await.context("停止调度器失败")?;
        Ok(())
    }
}
