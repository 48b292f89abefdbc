use async_trait::async_trait;
use chrono::Utc;
use docsched_core::{SchedulerError, SchedulerResult, Task, TaskRecord, TaskStore};
use tracing::{debug, instrument};

use super::connection::RedisConnection;

/// Redis 任务注册表
///
/// 所有任务记录存放在同一个哈希 `{prefix}:task` 中，字段为任务ID，
/// 值为记录 JSON。记录没有过期时间。
pub struct RedisTaskStore {
    redis: RedisConnection,
    hash_key: String,
}

impl RedisTaskStore {
    pub fn new(redis: RedisConnection) -> Self {
        let hash_key = redis.key("task");
        Self { redis, hash_key }
    }

    async fn load_record(&self, id: &str) -> SchedulerResult<Option<TaskRecord>> {
        let mut cmd = redis::cmd("HGET");
        cmd.arg(&self.hash_key).arg(id);
        let payload: Option<String> = self.redis.query(&cmd).await?;

        payload
            .map(|payload| -> SchedulerResult<TaskRecord> {
                let mut record: TaskRecord = serde_json::from_str(&payload)?;
                if record.id.is_empty() {
                    record.id = id.to_string();
                }
                Ok(record)
            })
            .transpose()
    }

    async fn store_record(&self, record: &TaskRecord) -> SchedulerResult<()> {
        let payload = serde_json::to_string(record)?;
        let mut cmd = redis::cmd("HSET");
        cmd.arg(&self.hash_key).arg(&record.id).arg(payload);
        self.redis.query::<i64>(&cmd).await?;
        Ok(())
    }
}

#[async_trait]
impl TaskStore for RedisTaskStore {
    #[instrument(skip(self, task), fields(task_id = %task.id()))]
    async fn add_task(&self, task: &Task) -> SchedulerResult<()> {
        self.store_record(&task.to_record()).await?;
        debug!("任务已写入Redis: {}", task.id());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_task(&self, id: &str) -> SchedulerResult<Task> {
        self.load_record(id)
            .await?
            .map(Task::from_record)
            .ok_or_else(|| SchedulerError::task_not_found(id))
    }

    #[instrument(skip(self, task), fields(task_id = %task.id()))]
    async fn update_task(&self, task: &Task) -> SchedulerResult<()> {
        let existing = self
            .load_record(task.id())
            .await?
            .ok_or_else(|| SchedulerError::task_not_found(task.id()))?;

        let mut record = task.to_record();
        record.created_at = existing.created_at;
        record.updated_at = Utc::now();
        self.store_record(&record).await
    }

    #[instrument(skip(self))]
    async fn del_task(&self, id: &str) -> SchedulerResult<()> {
        let mut cmd = redis::cmd("HDEL");
        cmd.arg(&self.hash_key).arg(id);
        let removed: i64 = self.redis.query(&cmd).await?;
        if removed > 0 {
            debug!("任务已从Redis删除: {}", id);
        }
        Ok(())
    }
}
