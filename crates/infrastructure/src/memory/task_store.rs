use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use docsched_core::{SchedulerError, SchedulerResult, Task, TaskRecord, TaskStore};
use tokio::sync::RwLock;
use tracing::debug;

/// 内存任务注册表，适用于单进程部署和测试
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<String, TaskRecord>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn add_task(&self, task: &Task) -> SchedulerResult<()> {
        let record = task.to_record();
        debug!("写入任务: {} ({}/{})", record.id, record.task_type, record.sub_type);
        self.tasks.write().await.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get_task(&self, id: &str) -> SchedulerResult<Task> {
        self.tasks
            .read()
            .await
            .get(id)
            .cloned()
            .map(Task::from_record)
            .ok_or_else(|| SchedulerError::task_not_found(id))
    }

    async fn update_task(&self, task: &Task) -> SchedulerResult<()> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(task.id()) {
            Some(existing) => {
                let mut record = task.to_record();
                record.created_at = existing.created_at;
                record.updated_at = Utc::now();
                *existing = record;
                Ok(())
            }
            None => Err(SchedulerError::task_not_found(task.id())),
        }
    }

    async fn del_task(&self, id: &str) -> SchedulerResult<()> {
        if self.tasks.write().await.remove(id).is_some() {
            debug!("删除任务: {}", id);
        }
        Ok(())
    }
}
