use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use docsched_core::{SchedulerError, SchedulerResult, WorkerId, WorkerRecord, WorkerStore};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// 默认记录过期时间，与 Redis 后端一致
pub const DEFAULT_WORKER_TTL: Duration = Duration::from_secs(300);

struct Entry {
    record: WorkerRecord,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// 内存 Worker 注册表
///
/// 没有原生过期机制，记录过期由读取时惰性清理模拟。
pub struct MemoryWorkerStore {
    workers: RwLock<HashMap<WorkerId, Entry>>,
    ttl: Duration,
}

impl Default for MemoryWorkerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryWorkerStore {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_WORKER_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            workers: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// 写入记录并重置过期时间，返回写入前是否存在存活记录
    async fn put(&self, record: WorkerRecord) -> bool {
        let now = Instant::now();
        let entry = Entry {
            record,
            expires_at: now + self.ttl,
        };
        self.workers
            .write()
            .await
            .insert(entry.record.id.clone(), entry)
            .is_some_and(|previous| previous.is_live(now))
    }
}

#[async_trait]
impl WorkerStore for MemoryWorkerStore {
    async fn add_worker(&self, worker: &WorkerRecord) -> SchedulerResult<()> {
        if self.put(worker.clone()).await {
            debug!("Worker {} 已存在，刷新过期时间", worker.id);
        } else {
            info!("Worker {} 已注册: {}", worker.id, worker.addr);
        }
        Ok(())
    }

    async fn del_worker(&self, id: &str) -> SchedulerResult<()> {
        if self.workers.write().await.remove(id).is_some() {
            info!("Worker {} 已移除", id);
        }
        Ok(())
    }

    async fn get_worker(&self, id: &str) -> SchedulerResult<WorkerRecord> {
        let now = Instant::now();
        self.workers
            .read()
            .await
            .get(id)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.record.clone())
            .ok_or_else(|| SchedulerError::worker_not_found(id))
    }

    async fn get_worker_ids(&self) -> SchedulerResult<Vec<WorkerId>> {
        let now = Instant::now();
        let mut workers = self.workers.write().await;
        workers.retain(|id, entry| {
            let live = entry.is_live(now);
            if !live {
                debug!("Worker {} 记录已过期", id);
            }
            live
        });

        let mut ids: Vec<WorkerId> = workers.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn heartbeat(&self, worker: &WorkerRecord) -> SchedulerResult<WorkerRecord> {
        let now = Instant::now();
        let mut workers = self.workers.write().await;
        let Some(entry) = workers.get_mut(&worker.id).filter(|entry| entry.is_live(now)) else {
            debug!("Worker {} 不在注册表中，忽略心跳", worker.id);
            return Err(SchedulerError::worker_not_found(&worker.id));
        };

        let mut record = worker.clone();
        record.touch();
        entry.record = record.clone();
        entry.expires_at = now + self.ttl;
        debug!("Worker {} 心跳已刷新", record.id);
        Ok(record)
    }

    async fn close(&self) -> SchedulerResult<()> {
        self.workers.write().await.clear();
        Ok(())
    }
}
