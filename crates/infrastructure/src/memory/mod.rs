pub mod task_store;
pub mod worker_store;

pub use task_store::MemoryTaskStore;
pub use worker_store::{MemoryWorkerStore, DEFAULT_WORKER_TTL};
