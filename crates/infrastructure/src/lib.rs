//! # docsched-infrastructure
//!
//! 任务注册表与 Worker 注册表的具体实现：
//! - `memory` - 进程内实现，Worker 记录过期由读取时清理模拟
//! - `redis_store` - Redis 实现，所有命令带超时

pub mod memory;
pub mod redis_store;
pub mod store_factory;

pub use memory::{MemoryTaskStore, MemoryWorkerStore};
pub use redis_store::{RedisConnection, RedisTaskStore, RedisWorkerStore};
pub use store_factory::{StoreFactory, Stores};
