#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use docsched_dispatcher::{
    RoundRobinStrategy, Scheduler, SchedulerOptions, WorkerManager, WorkerManagerConfig,
};
use docsched_infrastructure::{MemoryTaskStore, MemoryWorkerStore};

#[derive(Default)]
pub struct MockWorkerState {
    /// 收到的分发请求
    pub received: Vec<Value>,
    /// 远程任务ID → 状态
    pub statuses: HashMap<String, String>,
    pub reject_dispatch: bool,
    pub healthy: bool,
    /// 健康检查接口的响应延迟
    pub status_delay: Duration,
    next_id: usize,
}

/// 用 axum 模拟的远程 Worker
pub struct MockWorker {
    pub addr: SocketAddr,
    pub state: Arc<Mutex<MockWorkerState>>,
}

impl MockWorker {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(MockWorkerState {
            healthy: true,
            ..MockWorkerState::default()
        }));

        let app = Router::new()
            .route("/task", post(dispatch))
            .route("/task/{id}", get(task_status))
            .route("/executor/status", get(executor_status))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Failed to start mock worker");
        });

        Self { addr, state }
    }

    pub fn addr_string(&self) -> String {
        self.addr.to_string()
    }

    pub fn set_status(&self, remote_task_id: &str, status: &str) {
        self.state
            .lock()
            .unwrap()
            .statuses
            .insert(remote_task_id.to_string(), status.to_string());
    }

    pub fn reject_dispatch(&self, reject: bool) {
        self.state.lock().unwrap().reject_dispatch = reject;
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.state.lock().unwrap().healthy = healthy;
    }

    pub fn set_status_delay(&self, delay: Duration) {
        self.state.lock().unwrap().status_delay = delay;
    }

    pub fn received(&self) -> Vec<Value> {
        self.state.lock().unwrap().received.clone()
    }
}

async fn dispatch(
    State(state): State<Arc<Mutex<MockWorkerState>>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = state.lock().unwrap();
    if state.reject_dispatch {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "busy"})),
        );
    }

    state.next_id += 1;
    let remote_id = format!("w-{}", state.next_id);
    state.received.push(body);
    state
        .statuses
        .insert(remote_id.clone(), "RUNNING".to_string());

    (StatusCode::OK, Json(json!({ "task_id": remote_id })))
}

async fn task_status(
    State(state): State<Arc<Mutex<MockWorkerState>>>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    let state = state.lock().unwrap();
    match state.statuses.get(&id) {
        Some(status) => (
            StatusCode::OK,
            Json(json!({
                "task_id": id,
                "task_status": status,
                "data": {"output": format!("{id}.out")},
            })),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "task not found"})),
        ),
    }
}

async fn executor_status(
    State(state): State<Arc<Mutex<MockWorkerState>>>,
) -> (StatusCode, Json<Value>) {
    let delay = state.lock().unwrap().status_delay;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let state = state.lock().unwrap();
    if !state.healthy {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "unhealthy"})),
        );
    }

    let active = state
        .statuses
        .values()
        .filter(|s| s.as_str() == "RUNNING")
        .count();
    (
        StatusCode::OK,
        Json(json!({
            "is_healthy": true,
            "active_tasks": active,
            "completed_tasks": 0,
            "failed_tasks": 0,
            "cancelled_tasks": 0,
        })),
    )
}

/// 不会自行触发的驱逐配置，测试中手动调用 sweep
pub fn manual_sweep_config() -> WorkerManagerConfig {
    WorkerManagerConfig {
        eviction_interval: Duration::from_secs(3600),
        ..WorkerManagerConfig::default()
    }
}

pub struct TestScheduler {
    pub scheduler: Scheduler,
    pub task_store: Arc<MemoryTaskStore>,
}

pub fn build_scheduler(config: WorkerManagerConfig, options: SchedulerOptions) -> TestScheduler {
    let task_store = Arc::new(MemoryTaskStore::new());
    let worker_manager = WorkerManager::new(
        Arc::new(MemoryWorkerStore::new()),
        Arc::new(RoundRobinStrategy::new()),
        config,
    )
    .expect("Failed to build worker manager");

    TestScheduler {
        scheduler: Scheduler::new(task_store.clone(), Arc::new(worker_manager), options),
        task_store,
    }
}
