//! # docsched-core
//!
//! 文档转换任务调度核心的公共定义：错误类型、配置模型、日志初始化、
//! 任务与 Worker 数据模型，以及注册表和负载均衡的抽象接口。

pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod traits;

pub use config::{AppConfig, LogConfig, LogFormat, RedisConfig, SchedulerConfig, StoreBackend};
pub use errors::*;
pub use logging::init_logging;
pub use models::task_type::{is_valid_task, validate_task};
pub use models::{
    Task, TaskFuture, TaskPriority, TaskRecord, TaskResult, TaskState, WorkerId, WorkerRecord,
    WorkerRegistration, WorkerStatusSnapshot, WorkerSummary, WorkerTaskResult,
};
pub use traits::{LoadBalancer, TaskStore, WorkerStore};
