//! # 数据模型
//!
//! 调度核心使用的数据结构：任务、任务句柄、Worker 注册记录和状态快照。
//!
//! ## 任务状态流转
//! ```text
//! PENDING → RUNNING → DONE
//!              ↓
//!         FAILURE / CANCELLED
//! ```
//!
//! 任务在提交时写入任务存储（`PENDING`），分发成功后记录 Worker 分配信息，
//! 轮询到终态后从任务存储删除。
//!
//! ## Worker 生命周期
//! ```text
//! 注册 → 心跳续期 … → 主动注销 / 心跳超时驱逐 / 健康检查失败驱逐
//! ```

pub mod task;
pub mod task_type;
pub mod worker;

pub use task::*;
pub use worker::*;
