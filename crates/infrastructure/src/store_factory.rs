use std::sync::Arc;
use std::time::Duration;

use docsched_core::{AppConfig, SchedulerResult, StoreBackend, TaskStore, WorkerStore};
use tracing::{debug, info};

use crate::memory::{MemoryTaskStore, MemoryWorkerStore};
use crate::redis_store::{RedisConnection, RedisTaskStore, RedisWorkerStore};

/// 按配置创建的一对注册表
#[derive(Clone)]
pub struct Stores {
    pub worker_store: Arc<dyn WorkerStore>,
    pub task_store: Arc<dyn TaskStore>,
}

impl Stores {
    /// 两个注册表都使用内存后端
    pub fn in_memory() -> Self {
        Self {
            worker_store: Arc::new(MemoryWorkerStore::new()),
            task_store: Arc::new(MemoryTaskStore::new()),
        }
    }
}

pub struct StoreFactory;

impl StoreFactory {
    /// 按配置创建注册表；两个注册表都使用 Redis 时共享同一个连接
    pub async fn create(config: &AppConfig) -> SchedulerResult<Stores> {
        debug!(
            "创建注册表: worker_store={:?}, task_store={:?}",
            config.worker_store.backend, config.task_store.backend
        );

        let redis = if config.uses_redis() {
            Some(RedisConnection::connect(&config.redis).await?)
        } else {
            None
        };
        let worker_ttl = Duration::from_secs(config.redis.worker_ttl_seconds);

        let worker_store: Arc<dyn WorkerStore> = match (config.worker_store.backend, &redis) {
            (StoreBackend::Redis, Some(conn)) => {
                info!("Worker注册表使用Redis后端");
                Arc::new(RedisWorkerStore::new(conn.clone(), worker_ttl))
            }
            _ => {
                info!("Worker注册表使用内存后端");
                Arc::new(MemoryWorkerStore::with_ttl(worker_ttl))
            }
        };

        let task_store: Arc<dyn TaskStore> = match (config.task_store.backend, &redis) {
            (StoreBackend::Redis, Some(conn)) => {
                info!("任务注册表使用Redis后端");
                Arc::new(RedisTaskStore::new(conn.clone()))
            }
            _ => {
                info!("任务注册表使用内存后端");
                Arc::new(MemoryTaskStore::new())
            }
        };

        Ok(Stores {
            worker_store,
            task_store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsched_core::{WorkerRecord, WorkerRegistration};

    #[tokio::test]
    async fn test_memory_backends_need_no_redis() {
        let mut config = AppConfig::default();
        // 不会被连接
        config.redis.url = "redis://127.0.0.1:1".to_string();

        let stores = StoreFactory::create(&config).await.unwrap();
        let record = WorkerRecord::new(WorkerRegistration::new("w1", "127.0.0.1:9000"));
        stores.worker_store.add_worker(&record).await.unwrap();
        assert_eq!(stores.worker_store.get_worker_ids().await.unwrap(), vec!["w1"]);
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_store_unavailable() {
        let mut config = AppConfig::default();
        config.task_store.backend = StoreBackend::Redis;
        config.redis.url = "redis://127.0.0.1:1".to_string();
        config.redis.command_timeout_seconds = 1;

        let result = StoreFactory::create(&config).await;
        assert!(matches!(
            result,
            Err(docsched_core::SchedulerError::StoreUnavailable(_))
        ));
    }
}
