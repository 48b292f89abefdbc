use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use docsched_core::config::{SchedulerConfig, WorkerClientConfig};
use docsched_core::{
    LoadBalancer, SchedulerError, SchedulerResult, WorkerId, WorkerRecord, WorkerRegistration,
    WorkerStore, WorkerSummary,
};

use crate::metrics::SchedulerMetrics;
use crate::worker::{build_http_client, RemoteWorker};

/// Worker管理配置
#[derive(Debug, Clone)]
pub struct WorkerManagerConfig {
    /// 驱逐检查间隔
    pub eviction_interval: Duration,
    /// 心跳超时阈值
    pub stale_threshold: Duration,
    /// 驱逐检查时是否探测 Worker 健康状态
    pub health_check_enabled: bool,
    /// 连续健康检查失败达到该值时驱逐
    pub max_error_count: u32,
    pub client: WorkerClientConfig,
}

impl Default for WorkerManagerConfig {
    fn default() -> Self {
        Self::from_config(&SchedulerConfig::default(), &WorkerClientConfig::default())
    }
}

impl WorkerManagerConfig {
    pub fn from_config(scheduler: &SchedulerConfig, client: &WorkerClientConfig) -> Self {
        Self {
            eviction_interval: scheduler.eviction_interval(),
            stale_threshold: scheduler.stale_threshold(),
            health_check_enabled: scheduler.health_check_enabled,
            max_error_count: scheduler.max_error_count,
            client: client.clone(),
        }
    }
}

/// 一次驱逐检查的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub evicted_stale: usize,
    pub evicted_unhealthy: usize,
    /// 因注册表错误未能检查的 Worker 数
    pub failed: usize,
}

impl SweepReport {
    pub fn evicted(&self) -> usize {
        self.evicted_stale + self.evicted_unhealthy
    }
}

/// 单个 Worker 的检查结果
enum SweepOutcome {
    /// 读取时记录已不存在
    Missing,
    Kept,
    EvictedStale,
    EvictedUnhealthy,
}

struct EvictionLoop {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

struct Inner {
    store: Arc<dyn WorkerStore>,
    load_balancer: Arc<dyn LoadBalancer>,
    proxies: RwLock<HashMap<WorkerId, Arc<RemoteWorker>>>,
    client: reqwest::Client,
    config: WorkerManagerConfig,
    metrics: SchedulerMetrics,
}

/// Worker 管理器
///
/// 组合 Worker 注册表和负载均衡策略，并持有唯一的后台驱逐循环。
/// 驱逐循环在构造时启动（需要处于 tokio 运行时中），`stop` 后结束。
pub struct WorkerManager {
    inner: Arc<Inner>,
    eviction: Mutex<Option<EvictionLoop>>,
}

impl WorkerManager {
    pub fn new(
        store: Arc<dyn WorkerStore>,
        load_balancer: Arc<dyn LoadBalancer>,
        config: WorkerManagerConfig,
    ) -> SchedulerResult<Self> {
        let client = build_http_client(&config.client)?;
        let manager = Self {
            inner: Arc::new(Inner {
                store,
                load_balancer,
                proxies: RwLock::new(HashMap::new()),
                client,
                config,
                metrics: SchedulerMetrics::new(),
            }),
            eviction: Mutex::new(None),
        };

        if tokio::runtime::Handle::try_current().is_ok() {
            manager.start();
        } else {
            warn!("当前不在tokio运行时中，驱逐循环需要稍后调用start启动");
        }

        Ok(manager)
    }

    /// 启动驱逐循环；已在运行时不做任何事
    pub fn start(&self) -> bool {
        let mut eviction = match self.eviction.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if eviction.as_ref().is_some_and(|e| !e.handle.is_finished()) {
            return false;
        }

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(run_eviction_loop(Arc::clone(&self.inner), shutdown_rx));
        *eviction = Some(EvictionLoop {
            shutdown_tx,
            handle,
        });
        info!(
            "Worker驱逐循环已启动 (间隔: {:?}, 心跳超时: {:?})",
            self.inner.config.eviction_interval, self.inner.config.stale_threshold
        );
        true
    }

    /// 停止驱逐循环
    pub async fn stop(&self) {
        let eviction = match self.eviction.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(EvictionLoop {
            shutdown_tx,
            handle,
        }) = eviction
        {
            let _ = shutdown_tx.send(());
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!("驱逐循环异常退出: {}", e);
                }
            }
            info!("Worker驱逐循环已停止");
        }
    }

    pub fn is_running(&self) -> bool {
        match self.eviction.lock() {
            Ok(guard) => guard.as_ref().is_some_and(|e| !e.handle.is_finished()),
            Err(_) => false,
        }
    }

    /// 停止驱逐循环并释放注册表
    pub async fn close(&self) -> SchedulerResult<()> {
        self.stop().await;
        self.inner.store.close().await
    }

    /// 注册 Worker，已存在时刷新心跳
    ///
    /// 注册视为 Worker 重新上线，代理上累计的错误计数清零。
    pub async fn add_worker(
        &self,
        registration: WorkerRegistration,
    ) -> SchedulerResult<Arc<RemoteWorker>> {
        let record = WorkerRecord::new(registration);
        self.inner.store.add_worker(&record).await?;
        let record = self.inner.store.heartbeat(&record).await?;

        let proxy = self.inner.resolve(&record).await;
        proxy.reset_error_count();
        self.inner.load_balancer.observe(&record);

        info!("Worker {} 注册成功: {}", record.id, record.addr);
        Ok(proxy)
    }

    /// 注销 Worker；幂等
    pub async fn del_worker(&self, id: &str) -> SchedulerResult<()> {
        self.inner.remove(id).await?;
        info!("Worker {} 已注销", id);
        Ok(())
    }

    /// 选择一个 Worker，没有存活 Worker 时返回 `None`
    ///
    /// 选中的 Worker 在读取记录前过期时，从剩余的 ID 中重新选择。
    pub async fn select_worker(&self) -> SchedulerResult<Option<Arc<RemoteWorker>>> {
        let mut ids = self.inner.store.get_worker_ids().await?;

        loop {
            let Some(id) = self.inner.load_balancer.select(&ids) else {
                debug!("没有可用的Worker");
                return Ok(None);
            };

            match self.inner.store.get_worker(&id).await {
                Ok(record) => return Ok(Some(self.inner.resolve(&record).await)),
                Err(SchedulerError::WorkerNotFound { .. }) => {
                    debug!("Worker {} 在选择后已过期，重新选择", id);
                    ids.retain(|other| other != &id);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// 按ID获取 Worker 代理
    pub async fn get_worker(&self, id: &str) -> SchedulerResult<Arc<RemoteWorker>> {
        let record = self.inner.store.get_worker(id).await?;
        Ok(self.inner.resolve(&record).await)
    }

    /// 处理 Worker 主动上报的心跳
    pub async fn heartbeat(&self, id: &str) -> SchedulerResult<WorkerRecord> {
        let record = self.inner.store.get_worker(id).await?;
        let record = self.inner.store.heartbeat(&record).await?;
        self.inner.resolve(&record).await.reset_error_count();
        self.inner.load_balancer.observe(&record);
        debug!("Worker {} 心跳", id);
        Ok(record)
    }

    /// 列出当前存活的 Worker
    pub async fn get_workers(&self) -> SchedulerResult<Vec<WorkerSummary>> {
        let ids = self.inner.store.get_worker_ids().await?;
        let mut summaries = Vec::with_capacity(ids.len());

        for id in ids {
            let record = match self.inner.store.get_worker(&id).await {
                Ok(record) => record,
                Err(SchedulerError::WorkerNotFound { .. }) => continue,
                Err(e) => return Err(e),
            };
            let proxy = self.inner.resolve(&record).await;
            summaries.push(WorkerSummary {
                id: record.id,
                addr: record.addr,
                last_heartbeat: record.last_heartbeat,
                weight: record.weight,
                error_count: proxy.error_count(),
                status: proxy.status_snapshot(),
            });
        }

        Ok(summaries)
    }

    /// 执行一次驱逐检查
    pub async fn sweep(&self) -> SchedulerResult<SweepReport> {
        self.inner.sweep().await
    }
}

impl Drop for WorkerManager {
    fn drop(&mut self) {
        let eviction = match self.eviction.get_mut() {
            Ok(eviction) => eviction.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(eviction) = eviction {
            eviction.handle.abort();
        }
    }
}

impl Inner {
    /// 取得记录对应的代理；地址变化时重建
    async fn resolve(&self, record: &WorkerRecord) -> Arc<RemoteWorker> {
        if let Some(proxy) = self.proxies.read().await.get(&record.id) {
            if proxy.addr() == record.addr {
                return Arc::clone(proxy);
            }
        }

        let mut proxies = self.proxies.write().await;
        match proxies.get(&record.id) {
            Some(proxy) if proxy.addr() == record.addr => Arc::clone(proxy),
            _ => {
                let proxy = Arc::new(RemoteWorker::from_record(record, self.client.clone()));
                proxies.insert(record.id.clone(), Arc::clone(&proxy));
                proxy
            }
        }
    }

    async fn remove(&self, id: &str) -> SchedulerResult<()> {
        self.store.del_worker(id).await?;
        self.proxies.write().await.remove(id);
        self.load_balancer.forget(id);
        Ok(())
    }

    async fn evict(&self, id: &str, reason: &str) -> SchedulerResult<()> {
        self.remove(id).await?;
        self.metrics.record_eviction();
        info!("驱逐Worker {}: {}", id, reason);
        Ok(())
    }

    async fn sweep(&self) -> SchedulerResult<SweepReport> {
        let ids = self.store.get_worker_ids().await?;
        let now = Utc::now();
        let mut report = SweepReport::default();

        for id in &ids {
            match self.sweep_one(id, now).await {
                Ok(SweepOutcome::Missing) => {}
                Ok(outcome) => {
                    report.examined += 1;
                    match outcome {
                        SweepOutcome::EvictedStale => report.evicted_stale += 1,
                        SweepOutcome::EvictedUnhealthy => report.evicted_unhealthy += 1,
                        _ => {}
                    }
                }
                Err(e) => {
                    report.failed += 1;
                    warn!("检查Worker {} 失败: {}", id, e);
                }
            }
        }

        if let Err(e) = self.prune_cache().await {
            warn!("清理Worker代理缓存失败: {}", e);
        }

        if report.evicted() > 0 || report.failed > 0 {
            info!(
                "驱逐检查完成: 检查 {} 个, 心跳超时 {} 个, 健康检查失败 {} 个, 检查出错 {} 个",
                report.examined, report.evicted_stale, report.evicted_unhealthy, report.failed
            );
        } else {
            debug!("驱逐检查完成: 检查 {} 个Worker", report.examined);
        }

        Ok(report)
    }

    async fn sweep_one(&self, id: &str, now: DateTime<Utc>) -> SchedulerResult<SweepOutcome> {
        let record = match self.store.get_worker(id).await {
            Ok(record) => record,
            Err(SchedulerError::WorkerNotFound { .. }) => return Ok(SweepOutcome::Missing),
            Err(e) => return Err(e),
        };

        if record.is_stale(now, self.config.stale_threshold) {
            self.evict(id, "心跳超时").await?;
            return Ok(SweepOutcome::EvictedStale);
        }

        if !self.config.health_check_enabled {
            return Ok(SweepOutcome::Kept);
        }

        let proxy = self.resolve(&record).await;
        match proxy.check_status().await {
            // 健康检查期间 Worker 可能已被注销，心跳只刷新仍存在的记录
            Ok(_) => match self.store.heartbeat(&record).await {
                Ok(_) => Ok(SweepOutcome::Kept),
                Err(SchedulerError::WorkerNotFound { .. }) => {
                    debug!("Worker {} 在健康检查期间已移除", id);
                    Ok(SweepOutcome::Kept)
                }
                Err(e) => Err(e),
            },
            Err(_) => {
                self.metrics.record_health_check_failure();
                if proxy.error_count() >= self.config.max_error_count {
                    self.evict(id, "连续健康检查失败").await?;
                    Ok(SweepOutcome::EvictedUnhealthy)
                } else {
                    Ok(SweepOutcome::Kept)
                }
            }
        }
    }

    /// 丢弃已不在注册表中的 Worker 的代理和权重
    ///
    /// 持有缓存写锁读取存活集合，避免与并发注册交错。
    async fn prune_cache(&self) -> SchedulerResult<()> {
        let mut proxies = self.proxies.write().await;
        let live: HashSet<WorkerId> = self.store.get_worker_ids().await?.into_iter().collect();

        let gone: Vec<WorkerId> = proxies
            .keys()
            .filter(|id| !live.contains(*id))
            .cloned()
            .collect();
        for id in &gone {
            proxies.remove(id);
            self.load_balancer.forget(id);
        }

        if !gone.is_empty() {
            debug!("清理 {} 个已过期Worker的代理", gone.len());
        }
        Ok(())
    }
}

async fn run_eviction_loop(inner: Arc<Inner>, mut shutdown_rx: broadcast::Receiver<()>) {
    let mut ticker = tokio::time::interval(inner.config.eviction_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // 第一次 tick 立即完成
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                debug!("收到停止信号，退出驱逐循环");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = inner.sweep().await {
                    error!("Worker驱逐检查失败: {}", e);
                }
            }
        }
    }
}
