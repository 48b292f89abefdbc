//! 配置管理
//!
//! 配置按以下顺序叠加：
//! 1. 结构体默认值
//! 2. TOML 配置文件（`--config` 指定，或默认路径）
//! 3. 环境变量覆盖，前缀 `DOCSCHED`，层级分隔符 `__`
//!
//! ```text
//! DOCSCHED__SCHEDULER__LOAD_BALANCER=wrr
//! DOCSCHED__WORKER_STORE__BACKEND=redis
//! DOCSCHED__REDIS__URL=redis://10.0.0.5:6379
//! ```
//!
//! # 配置示例
//!
//! ```toml
//! [scheduler]
//! load_balancer = "rr"
//! eviction_interval_seconds = 5
//! stale_threshold_seconds = 300
//!
//! [worker_store]
//! backend = "redis"
//!
//! [redis]
//! url = "redis://127.0.0.1:6379"
//! key_prefix = "ktools"
//!
//! [[workers]]
//! id = "worker-1"
//! addr = "127.0.0.1:9000"
//! ```

pub mod models;

#[cfg(test)]
mod tests;

pub use models::*;
