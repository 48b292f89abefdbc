use std::sync::Arc;

use tracing::{debug, instrument, warn};

use docsched_core::{SchedulerError, SchedulerResult, Task, TaskFuture, WorkerTaskResult};

use crate::worker_manager::WorkerManager;

/// 任务执行器
///
/// 选择 Worker 并分发任务，之后向同一个 Worker 查询任务状态。
/// 不做重试，也不在 Worker 之间转移任务。
pub struct Executor {
    worker_manager: Arc<WorkerManager>,
}

impl Executor {
    pub fn new(worker_manager: Arc<WorkerManager>) -> Self {
        Self { worker_manager }
    }

    /// 分发任务，成功时返回的任务已带有 Worker 分配信息
    #[instrument(skip(self, task), fields(task_id = %task.id()))]
    pub async fn execute(&self, task: Task) -> SchedulerResult<TaskFuture> {
        let worker = self
            .worker_manager
            .select_worker()
            .await?
            .ok_or(SchedulerError::NoWorkerAvailable)?;

        debug!("任务 {} 选中Worker {}", task.id(), worker.id());
        worker.exec(task).await.inspect_err(|e| {
            warn!("任务分发到Worker {} 失败: {}", worker.id(), e);
        })
    }

    /// 查询任务在指定 Worker 上的状态
    ///
    /// Worker 已被驱逐时返回 `WorkerNotFound`，不会换到其他 Worker。
    #[instrument(skip(self))]
    pub async fn get_task_status(
        &self,
        remote_task_id: &str,
        worker_id: &str,
    ) -> SchedulerResult<WorkerTaskResult> {
        let worker = self.worker_manager.get_worker(worker_id).await?;
        worker.get_task_status(remote_task_id).await
    }
}
