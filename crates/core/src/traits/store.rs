//! 注册表存储接口
//!
//! 调度核心依赖两类注册表：
//! - `TaskStore` - 进行中任务的元数据（分配到哪个 Worker、远程任务ID）
//! - `WorkerStore` - Worker 成员关系及心跳存活信息
//!
//! 两者都有内存实现和 Redis 实现，由配置选择。所有方法都是异步的，
//! 远程后端的每次调用都必须带有超时。

use async_trait::async_trait;

use crate::models::{Task, WorkerId, WorkerRecord};
use crate::SchedulerResult;

/// 任务注册表
///
/// 调度器独占任务记录的创建与删除。任务记录没有过期时间，
/// 只在观察到终态后被显式删除。
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// 写入新任务（同ID覆盖）
    async fn add_task(&self, task: &Task) -> SchedulerResult<()>;

    /// 读取任务
    ///
    /// # 错误
    ///
    /// * `TaskNotFound` - 任务不存在
    /// * `StoreUnavailable` - 后端不可达或超时
    async fn get_task(&self, id: &str) -> SchedulerResult<Task>;

    /// 更新已存在的任务记录，用于持久化分发后的 Worker 分配信息
    ///
    /// # 错误
    ///
    /// * `TaskNotFound` - 任务不存在
    async fn update_task(&self, task: &Task) -> SchedulerResult<()>;

    /// 删除任务；删除不存在的任务不是错误
    async fn del_task(&self, id: &str) -> SchedulerResult<()>;

    /// 释放后端资源
    async fn close(&self) -> SchedulerResult<()> {
        Ok(())
    }
}

/// Worker 注册表
///
/// 存活成员集合由未过期的记录决定，与进程内缓存无关。
/// 过期条目和已删除条目都等同于不存在。
#[async_trait]
pub trait WorkerStore: Send + Sync {
    /// 注册 Worker；已存在时只刷新心跳和过期时间，不产生重复成员
    async fn add_worker(&self, worker: &WorkerRecord) -> SchedulerResult<()>;

    /// 删除 Worker；幂等
    async fn del_worker(&self, id: &str) -> SchedulerResult<()>;

    /// 读取 Worker 记录
    ///
    /// # 错误
    ///
    /// * `WorkerNotFound` - 不存在或已过期
    async fn get_worker(&self, id: &str) -> SchedulerResult<WorkerRecord>;

    /// 当前存活的 Worker ID，按字典序排列
    async fn get_worker_ids(&self) -> SchedulerResult<Vec<WorkerId>>;

    /// 刷新心跳时间和过期时间，返回刷新后的记录
    ///
    /// 只刷新仍然存活的记录，不会把已删除或已过期的 Worker 重新写回；
    /// 重新加入只能通过 [`WorkerStore::add_worker`]。
    ///
    /// # 错误
    ///
    /// * `WorkerNotFound` - 记录不存在或已过期
    async fn heartbeat(&self, worker: &WorkerRecord) -> SchedulerResult<WorkerRecord>;

    /// 释放后端资源
    async fn close(&self) -> SchedulerResult<()> {
        Ok(())
    }
}
