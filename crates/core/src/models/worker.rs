use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Worker 标识，由注册方提供
pub type WorkerId = String;

fn default_weight() -> u32 {
    1
}

/// Worker注册请求
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerRegistration {
    pub id: WorkerId,
    pub addr: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

impl WorkerRegistration {
    pub fn new(id: impl Into<WorkerId>, addr: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            addr: addr.into(),
            weight: default_weight(),
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }
}

/// Worker 注册表中的持久化记录
///
/// 错误计数等运行时信息属于进程内的 Worker 代理，不写入注册表。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerRecord {
    pub id: WorkerId,
    pub addr: String,
    #[serde(rename = "last_ping_time")]
    pub last_heartbeat: DateTime<Utc>,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

impl WorkerRecord {
    pub fn new(registration: WorkerRegistration) -> Self {
        Self {
            id: registration.id,
            addr: registration.addr,
            last_heartbeat: Utc::now(),
            weight: registration.weight.max(1),
        }
    }

    /// 刷新心跳时间
    pub fn touch(&mut self) {
        self.last_heartbeat = Utc::now();
    }

    /// 心跳间隔超过阈值（毫秒精度）
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        match chrono::Duration::from_std(threshold) {
            Ok(threshold) => now - self.last_heartbeat > threshold,
            Err(_) => false,
        }
    }
}

/// Worker 通过 `/executor/status` 上报的运行状况，仅作参考
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerStatusSnapshot {
    #[serde(default)]
    pub is_healthy: bool,
    #[serde(default)]
    pub active_tasks: u64,
    #[serde(default)]
    pub completed_tasks: u64,
    #[serde(default)]
    pub failed_tasks: u64,
    #[serde(default)]
    pub cancelled_tasks: u64,
}

/// 对外展示的Worker概要
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerSummary {
    pub id: WorkerId,
    pub addr: String,
    pub last_heartbeat: DateTime<Utc>,
    pub weight: u32,
    pub error_count: u32,
    pub status: WorkerStatusSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        let record = WorkerRecord::new(WorkerRegistration::new("w1", "127.0.0.1:9000"));
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["id"], "w1");
        assert_eq!(value["addr"], "127.0.0.1:9000");
        assert!(value.get("last_ping_time").is_some());
        assert_eq!(value["weight"], 1);
    }

    #[test]
    fn test_record_without_weight_defaults_to_one() {
        let record: WorkerRecord = serde_json::from_str(
            r#"{"id":"w1","addr":"10.0.0.1:80","last_ping_time":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(record.weight, 1);
    }

    #[test]
    fn test_zero_weight_is_clamped() {
        let record = WorkerRecord::new(WorkerRegistration::new("w1", "h:1").with_weight(0));
        assert_eq!(record.weight, 1);
    }

    #[test]
    fn test_is_stale_with_sub_second_threshold() {
        let now = Utc::now();
        let mut record = WorkerRecord::new(WorkerRegistration::new("w1", "h:1"));

        record.last_heartbeat = now - chrono::Duration::milliseconds(50);
        assert!(!record.is_stale(now, Duration::from_millis(100)));

        record.last_heartbeat = now - chrono::Duration::milliseconds(150);
        assert!(record.is_stale(now, Duration::from_millis(100)));

        record.touch();
        assert!(!record.is_stale(Utc::now(), Duration::from_millis(100)));
    }

    #[test]
    fn test_status_snapshot_tolerates_missing_fields() {
        let snapshot: WorkerStatusSnapshot =
            serde_json::from_str(r#"{"is_healthy":true,"active_tasks":2}"#).unwrap();
        assert!(snapshot.is_healthy);
        assert_eq!(snapshot.active_tasks, 2);
        assert_eq!(snapshot.failed_tasks, 0);
    }
}
