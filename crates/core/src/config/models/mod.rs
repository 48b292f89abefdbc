pub mod app_config;
pub mod logging;
pub mod scheduler;
pub mod store;

// Re-export main types for easier imports
pub use app_config::AppConfig;
pub use logging::{LogConfig, LogFormat};
pub use scheduler::{SchedulerConfig, WorkerClientConfig, LOAD_BALANCER_NAMES};
pub use store::{RedisConfig, StoreBackend, StoreConfig};
