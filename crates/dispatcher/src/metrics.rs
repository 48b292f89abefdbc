use metrics::{counter, Counter};

/// 调度核心的计数器
///
/// 库本身不安装导出器，由嵌入进程决定是否采集。
#[derive(Clone)]
pub struct SchedulerMetrics {
    tasks_dispatched_total: Counter,
    dispatch_failures_total: Counter,
    workers_evicted_total: Counter,
    worker_health_check_failures_total: Counter,
}

impl SchedulerMetrics {
    pub fn new() -> Self {
        Self {
            tasks_dispatched_total: counter!("docsched_tasks_dispatched_total"),
            dispatch_failures_total: counter!("docsched_dispatch_failures_total"),
            workers_evicted_total: counter!("docsched_workers_evicted_total"),
            worker_health_check_failures_total: counter!(
                "docsched_worker_health_check_failures_total"
            ),
        }
    }

    pub fn record_dispatch(&self) {
        self.tasks_dispatched_total.increment(1);
    }

    pub fn record_dispatch_failure(&self) {
        self.dispatch_failures_total.increment(1);
    }

    pub fn record_eviction(&self) {
        self.workers_evicted_total.increment(1);
    }

    pub fn record_health_check_failure(&self) {
        self.worker_health_check_failures_total.increment(1);
    }
}

impl Default for SchedulerMetrics {
    fn default() -> Self {
        Self::new()
    }
}
