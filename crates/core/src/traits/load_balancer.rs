use crate::models::{WorkerId, WorkerRecord};

/// Worker 选择策略
///
/// 每次选择都传入从注册表实时读取的 ID 列表，策略自身不持有成员关系。
/// 实现必须允许任意数量的并发调用方。
pub trait LoadBalancer: Send + Sync {
    /// 从候选列表中选出一个 Worker，列表为空时返回 `None`
    fn select(&self, worker_ids: &[WorkerId]) -> Option<WorkerId>;

    /// 策略名称
    fn name(&self) -> &str;

    /// 观察到 Worker 注册或心跳，需要权重等元数据的策略在此更新
    fn observe(&self, _worker: &WorkerRecord) {}

    /// Worker 已被移除
    fn forget(&self, _worker_id: &str) {}
}
