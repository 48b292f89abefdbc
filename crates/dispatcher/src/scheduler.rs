use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use docsched_core::{
    SchedulerResult, Task, TaskFuture, TaskResult, TaskStore, WorkerRecord, WorkerRegistration,
    WorkerSummary,
};

use crate::executor::Executor;
use crate::metrics::SchedulerMetrics;
use crate::worker_manager::WorkerManager;

/// 调度器选项
#[derive(Debug, Clone, Default)]
pub struct SchedulerOptions {
    /// 分发失败时删除已写入的任务记录；默认保留 PENDING 记录
    pub rollback_on_dispatch_failure: bool,
}

/// 调度器门面
///
/// 外部的 HTTP 层只通过它提交任务、查询状态和管理 Worker。
/// 每个进程应只构造一个实例，并在退出前调用 [`Scheduler::stop`]。
pub struct Scheduler {
    task_store: Arc<dyn TaskStore>,
    worker_manager: Arc<WorkerManager>,
    executor: Executor,
    options: SchedulerOptions,
    metrics: SchedulerMetrics,
}

impl Scheduler {
    pub fn new(
        task_store: Arc<dyn TaskStore>,
        worker_manager: Arc<WorkerManager>,
        options: SchedulerOptions,
    ) -> Self {
        let executor = Executor::new(Arc::clone(&worker_manager));
        Self {
            task_store,
            worker_manager,
            executor,
            options,
            metrics: SchedulerMetrics::new(),
        }
    }

    pub fn worker_manager(&self) -> &Arc<WorkerManager> {
        &self.worker_manager
    }

    /// 启动后台驱逐循环；重复调用无副作用
    pub fn start(&self) -> SchedulerResult<()> {
        if self.worker_manager.start() {
            info!("调度器已启动");
        }
        Ok(())
    }

    /// 停止驱逐循环并释放注册表
    pub async fn stop(&self) -> SchedulerResult<()> {
        info!("正在停止调度器");
        self.worker_manager.close().await?;
        self.task_store.close().await?;
        info!("调度器已停止");
        Ok(())
    }

    /// 提交任务
    ///
    /// 调用方负责在提交前校验任务类型。任务先以 PENDING 状态写入任务注册表，
    /// 分发成功后写回 Worker 分配信息。
    #[instrument(skip(self, task), fields(task_id = %task.id()))]
    pub async fn schedule(&self, task: Task) -> SchedulerResult<TaskFuture> {
        self.task_store.add_task(&task).await?;
        let task_id = task.id().to_string();

        match self.executor.execute(task).await {
            Ok(future) => {
                self.task_store.update_task(future.task()).await?;
                self.metrics.record_dispatch();
                info!(
                    "任务 {} 已分发到Worker {}",
                    task_id,
                    future.task().assigned_worker_id().unwrap_or_default()
                );
                Ok(future)
            }
            Err(e) => {
                self.metrics.record_dispatch_failure();
                warn!("任务 {} 分发失败: {}", task_id, e);
                if self.options.rollback_on_dispatch_failure {
                    if let Err(del_err) = self.task_store.del_task(&task_id).await {
                        error!("回滚任务 {} 失败: {}", task_id, del_err);
                    }
                }
                Err(e)
            }
        }
    }

    /// 查询任务状态，观察到终态后删除任务记录
    #[instrument(skip(self))]
    pub async fn get_task_status(&self, task_id: &str) -> SchedulerResult<TaskResult> {
        let task = self.task_store.get_task(task_id).await?;

        let (Some(worker_id), Some(remote_task_id)) =
            (task.assigned_worker_id(), task.remote_task_id())
        else {
            debug!("任务 {} 尚未分配Worker", task_id);
            return Ok(TaskResult::local(&task));
        };

        let result = self
            .executor
            .get_task_status(remote_task_id, worker_id)
            .await?;

        if result.task_status.is_terminal() {
            self.task_store.del_task(task_id).await?;
            info!("任务 {} 已结束: {}", task_id, result.task_status);
        }

        Ok(TaskResult::from_worker(&task, result))
    }

    pub async fn register_worker(&self, registration: WorkerRegistration) -> SchedulerResult<()> {
        self.worker_manager.add_worker(registration).await?;
        Ok(())
    }

    pub async fn deregister_worker(&self, worker_id: &str) -> SchedulerResult<()> {
        self.worker_manager.del_worker(worker_id).await
    }

    pub async fn heartbeat(&self, worker_id: &str) -> SchedulerResult<WorkerRecord> {
        self.worker_manager.heartbeat(worker_id).await
    }

    pub async fn get_workers(&self) -> SchedulerResult<Vec<WorkerSummary>> {
        self.worker_manager.get_workers().await
    }
}
