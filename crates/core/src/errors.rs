use thiserror::Error;

/// 与远程Worker通信失败的细分原因
///
/// 区分“连不上”与“连上了但被拒绝”，调用方据此决定是否换一个Worker重试。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkerCallError {
    #[error("Worker {worker_id} 网络错误: {message}")]
    Transport { worker_id: String, message: String },

    #[error("Worker {worker_id} 拒绝请求: HTTP {status} - {body}")]
    Rejected {
        worker_id: String,
        status: u16,
        body: String,
    },

    #[error("Worker {worker_id} 响应格式错误: {message}")]
    MalformedResponse { worker_id: String, message: String },
}

impl WorkerCallError {
    pub fn worker_id(&self) -> &str {
        match self {
            WorkerCallError::Transport { worker_id, .. }
            | WorkerCallError::Rejected { worker_id, .. }
            | WorkerCallError::MalformedResponse { worker_id, .. } => worker_id,
        }
    }

    /// 是否为传输层失败（连接失败、超时等）
    pub fn is_transport(&self) -> bool {
        matches!(self, WorkerCallError::Transport { .. })
    }
}

/// 调度器错误类型定义
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("无效的任务类型: {task_type}/{sub_type}")]
    InvalidTask { task_type: String, sub_type: String },

    #[error("任务未找到: {id}")]
    TaskNotFound { id: String },

    #[error("Worker未找到: {id}")]
    WorkerNotFound { id: String },

    #[error("没有可用的Worker")]
    NoWorkerAvailable,

    #[error("任务分发失败: {0}")]
    DispatchFailure(WorkerCallError),

    #[error("状态检查失败: {0}")]
    StatusCheckFailure(WorkerCallError),

    #[error("存储不可用: {0}")]
    StoreUnavailable(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl SchedulerError {
    pub fn task_not_found(id: impl Into<String>) -> Self {
        SchedulerError::TaskNotFound { id: id.into() }
    }

    pub fn worker_not_found(id: impl Into<String>) -> Self {
        SchedulerError::WorkerNotFound { id: id.into() }
    }

    /// 提交阶段的失败（任务未被任何Worker接收）
    pub fn is_submission_failure(&self) -> bool {
        matches!(
            self,
            SchedulerError::InvalidTask { .. }
                | SchedulerError::NoWorkerAvailable
                | SchedulerError::DispatchFailure(_)
        )
    }
}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        SchedulerError::Serialization(err.to_string())
    }
}

/// 统一的Result类型
pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;
