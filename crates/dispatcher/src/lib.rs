//! # docsched-dispatcher
//!
//! 任务分发链路：负载均衡策略 → Worker 管理与驱逐 → 远程 Worker 代理 →
//! 执行器 → 调度器门面。

pub mod executor;
pub mod metrics;
pub mod scheduler;
pub mod strategies;
pub mod worker;
pub mod worker_manager;

pub use executor::Executor;
pub use metrics::SchedulerMetrics;
pub use scheduler::{Scheduler, SchedulerOptions};
pub use strategies::{load_balancer_from_name, RoundRobinStrategy, WeightedRoundRobinStrategy};
pub use worker::{build_http_client, RemoteWorker};
pub use worker_manager::{SweepReport, WorkerManager, WorkerManagerConfig};
