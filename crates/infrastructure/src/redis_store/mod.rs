pub mod connection;
pub mod task_store;
pub mod worker_store;

pub use connection::RedisConnection;
pub use task_store::RedisTaskStore;
pub use worker_store::RedisWorkerStore;
