use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 已知的负载均衡策略名称
pub const LOAD_BALANCER_NAMES: [&str; 2] = ["rr", "wrr"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    /// "rr" 轮询, "wrr" 加权轮询
    pub load_balancer: String,
    pub eviction_interval_seconds: u64,
    pub stale_threshold_seconds: u64,
    pub health_check_enabled: bool,
    pub max_error_count: u32,
    /// 分发失败时是否删除已写入的 PENDING 任务
    pub rollback_on_dispatch_failure: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            load_balancer: "rr".to_string(),
            eviction_interval_seconds: 5,
            stale_threshold_seconds: 300,
            health_check_enabled: true,
            max_error_count: 3,
            rollback_on_dispatch_failure: false,
        }
    }
}

impl SchedulerConfig {
    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.eviction_interval_seconds)
    }

    pub fn stale_threshold(&self) -> Duration {
        Duration::from_secs(self.stale_threshold_seconds)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !LOAD_BALANCER_NAMES.contains(&self.load_balancer.as_str()) {
            return Err(anyhow::anyhow!(
                "无效的负载均衡策略: {}，支持的策略: {:?}",
                self.load_balancer,
                LOAD_BALANCER_NAMES
            ));
        }

        if self.eviction_interval_seconds == 0 {
            return Err(anyhow::anyhow!("驱逐检查间隔必须大于0"));
        }

        if self.stale_threshold_seconds == 0 {
            return Err(anyhow::anyhow!("心跳超时阈值必须大于0"));
        }

        if self.health_check_enabled && self.max_error_count == 0 {
            return Err(anyhow::anyhow!("最大连续错误次数必须大于0"));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkerClientConfig {
    pub request_timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
}

impl Default for WorkerClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 5,
            connect_timeout_seconds: 3,
        }
    }
}

impl WorkerClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("Worker请求超时时间必须大于0"));
        }

        if self.connect_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("Worker连接超时时间必须大于0"));
        }

        Ok(())
    }
}
