use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{SchedulerError, SchedulerResult};
use crate::models::worker::WorkerId;

/// 任务状态
///
/// `DONE`、`FAILURE`、`CANCELLED` 为终态，观察到终态后任务记录会被清理。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TaskState {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "RUNNING")]
    Running,
    #[serde(rename = "DONE")]
    Done,
    #[serde(rename = "FAILURE")]
    Failure,
    #[serde(rename = "CANCELLED")]
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Done | TaskState::Failure | TaskState::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "PENDING",
            TaskState::Running => "RUNNING",
            TaskState::Done => "DONE",
            TaskState::Failure => "FAILURE",
            TaskState::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 任务优先级，目前仅作参考，不参与调度
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum TaskPriority {
    #[default]
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "HIGH")]
    High,
}

/// 任务定义
///
/// 创建后只有 Worker 分配信息（`assigned_worker_id` 与 `remote_task_id`）可以变更，
/// 且两者在分发成功后一次性写入，不会被再次覆盖。
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    id: String,
    task_type: String,
    sub_type: String,
    state: TaskState,
    priority: TaskPriority,
    created_at: DateTime<Utc>,
    user_def: serde_json::Value,
    assigned_worker_id: Option<WorkerId>,
    remote_task_id: Option<String>,
}

impl Task {
    /// 创建新任务，状态为 `PENDING`
    ///
    /// 类型校验由调用方通过 [`crate::models::task_type::validate_task`] 完成。
    pub fn new(
        task_type: impl Into<String>,
        sub_type: impl Into<String>,
        user_def: serde_json::Value,
    ) -> Self {
        Self::with_priority(task_type, sub_type, user_def, TaskPriority::default())
    }

    pub fn with_priority(
        task_type: impl Into<String>,
        sub_type: impl Into<String>,
        user_def: serde_json::Value,
        priority: TaskPriority,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            task_type: task_type.into(),
            sub_type: sub_type.into(),
            state: TaskState::Pending,
            priority,
            created_at: Utc::now(),
            user_def,
            assigned_worker_id: None,
            remote_task_id: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn user_def(&self) -> &serde_json::Value {
        &self.user_def
    }

    pub fn assigned_worker_id(&self) -> Option<&str> {
        self.assigned_worker_id.as_deref()
    }

    pub fn remote_task_id(&self) -> Option<&str> {
        self.remote_task_id.as_deref()
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_worker_id.is_some()
    }

    /// 记录分发结果，同一任务只允许分配一次
    pub fn assign(
        &mut self,
        worker_id: impl Into<WorkerId>,
        remote_task_id: impl Into<String>,
    ) -> SchedulerResult<()> {
        if self.is_assigned() {
            return Err(SchedulerError::Internal(format!(
                "任务 {} 已分配给Worker {}，不允许重复分配",
                self.id,
                self.assigned_worker_id.as_deref().unwrap_or_default()
            )));
        }

        let worker_id = worker_id.into();
        let remote_task_id = remote_task_id.into();
        debug!(
            "任务 {} 分配给Worker {} (远程任务ID: {})",
            self.id, worker_id, remote_task_id
        );
        self.assigned_worker_id = Some(worker_id);
        self.remote_task_id = Some(remote_task_id);
        Ok(())
    }

    /// 从持久化记录恢复任务
    pub fn from_record(record: TaskRecord) -> Self {
        // 分配信息必须成对出现，缺一视为未分配
        let (assigned_worker_id, remote_task_id) = match (record.worker_id, record.worker_task_id) {
            (Some(worker_id), Some(remote_id)) if !worker_id.is_empty() && !remote_id.is_empty() => {
                (Some(worker_id), Some(remote_id))
            }
            _ => (None, None),
        };

        Self {
            id: record.id,
            task_type: record.task_type,
            sub_type: record.sub_type,
            state: record.state,
            priority: record.priority,
            created_at: record.created_at,
            user_def: record.user_def,
            assigned_worker_id,
            remote_task_id,
        }
    }

    /// 转换为持久化记录
    pub fn to_record(&self) -> TaskRecord {
        TaskRecord {
            id: self.id.clone(),
            state: self.state,
            task_type: self.task_type.clone(),
            sub_type: self.sub_type.clone(),
            priority: self.priority,
            worker_id: self.assigned_worker_id.clone(),
            worker_task_id: self.remote_task_id.clone(),
            created_at: self.created_at,
            updated_at: Utc::now(),
            user_def: self.user_def.clone(),
        }
    }
}

/// 任务的持久化形式
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "task_state")]
    pub state: TaskState,
    #[serde(rename = "type")]
    pub task_type: String,
    pub sub_type: String,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub worker_id: Option<WorkerId>,
    #[serde(default)]
    pub worker_task_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub user_def: serde_json::Value,
}

/// 分发时返回的任务句柄
///
/// 取消尚未实现，`cancel` 始终返回 `false`。
#[derive(Debug, Clone)]
pub struct TaskFuture {
    task: Task,
}

impl TaskFuture {
    pub fn new(task: Task) -> Self {
        Self { task }
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn task_id(&self) -> &str {
        self.task.id()
    }

    pub fn into_task(self) -> Task {
        self.task
    }

    pub fn is_done(&self) -> bool {
        self.task.state().is_terminal()
    }

    pub fn cancel(&self) -> bool {
        debug!("任务取消尚未支持: {}", self.task.id());
        false
    }
}

/// 返回给调用方的任务状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskResult {
    pub task_id: String,
    pub state: TaskState,
    pub task_type: String,
    pub sub_type: String,
    pub data: serde_json::Value,
}

impl TaskResult {
    /// 尚未分配Worker的任务，只能报告本地状态
    pub fn local(task: &Task) -> Self {
        Self {
            task_id: task.id().to_string(),
            state: task.state(),
            task_type: task.task_type().to_string(),
            sub_type: task.sub_type().to_string(),
            data: serde_json::Value::Null,
        }
    }

    pub fn from_worker(task: &Task, result: WorkerTaskResult) -> Self {
        Self {
            task_id: task.id().to_string(),
            state: result.task_status,
            task_type: task.task_type().to_string(),
            sub_type: task.sub_type().to_string(),
            data: result.data,
        }
    }
}

/// Worker 返回的任务状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerTaskResult {
    pub task_id: String,
    pub task_status: TaskState,
    #[serde(default)]
    pub data: serde_json::Value,
}
