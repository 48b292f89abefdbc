use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use docsched_core::config::WorkerClientConfig;
use docsched_core::{
    SchedulerError, SchedulerResult, Task, TaskFuture, WorkerCallError, WorkerId, WorkerRecord,
    WorkerStatusSnapshot, WorkerTaskResult,
};

/// 按配置构建访问 Worker 的 HTTP 客户端
pub fn build_http_client(config: &WorkerClientConfig) -> SchedulerResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .connect_timeout(config.connect_timeout())
        .build()
        .map_err(|e| SchedulerError::Configuration(format!("创建HTTP客户端失败: {e}")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DispatchRequest<'a> {
    task_id: &'a str,
    task_type: &'a str,
    task_sub_type: &'a str,
    task_detail: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct DispatchAck {
    #[serde(alias = "taskId")]
    task_id: String,
}

/// 远程 Worker 代理
///
/// 地址等静态信息来自注册表；连续错误计数和状态快照只存在于进程内，
/// 不写回注册表。
pub struct RemoteWorker {
    id: WorkerId,
    addr: String,
    base_url: String,
    client: reqwest::Client,
    error_count: AtomicU32,
    status: RwLock<WorkerStatusSnapshot>,
}

impl RemoteWorker {
    pub fn new(id: impl Into<WorkerId>, addr: impl Into<String>, client: reqwest::Client) -> Self {
        let addr = addr.into();
        let base_url = if addr.starts_with("http://") || addr.starts_with("https://") {
            addr.trim_end_matches('/').to_string()
        } else {
            format!("http://{addr}")
        };

        Self {
            id: id.into(),
            addr,
            base_url,
            client,
            error_count: AtomicU32::new(0),
            status: RwLock::new(WorkerStatusSnapshot::default()),
        }
    }

    pub fn from_record(record: &WorkerRecord, client: reqwest::Client) -> Self {
        Self::new(record.id.clone(), record.addr.clone(), client)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn error_count(&self) -> u32 {
        self.error_count.load(Ordering::Acquire)
    }

    pub fn incr_error_count(&self) -> u32 {
        self.error_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn reset_error_count(&self) {
        self.error_count.store(0, Ordering::Release);
    }

    /// 最近一次健康检查得到的状态
    pub fn status_snapshot(&self) -> WorkerStatusSnapshot {
        match self.status.read() {
            Ok(status) => status.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// 分发任务
    ///
    /// 只有 HTTP 200 且响应中带有远程任务ID才算成功，成功后任务记录分配信息。
    #[instrument(skip(self, task), fields(worker_id = %self.id, task_id = %task.id()))]
    pub async fn exec(&self, mut task: Task) -> SchedulerResult<TaskFuture> {
        let url = self
            .endpoint(&["task"])
            .map_err(SchedulerError::DispatchFailure)?;
        let request = DispatchRequest {
            task_id: task.id(),
            task_type: task.task_type(),
            task_sub_type: task.sub_type(),
            task_detail: task.user_def(),
        };

        debug!("分发任务到 {}", url);
        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SchedulerError::DispatchFailure(self.transport_error(e)))?;

        let ack: DispatchAck = self
            .read_json(response)
            .await
            .map_err(SchedulerError::DispatchFailure)?;

        if ack.task_id.is_empty() {
            return Err(SchedulerError::DispatchFailure(
                WorkerCallError::MalformedResponse {
                    worker_id: self.id.clone(),
                    message: "响应缺少task_id".to_string(),
                },
            ));
        }

        task.assign(self.id.clone(), ack.task_id)?;
        self.reset_error_count();
        Ok(TaskFuture::new(task))
    }

    /// 查询远程任务状态
    #[instrument(skip(self), fields(worker_id = %self.id))]
    pub async fn get_task_status(&self, remote_task_id: &str) -> SchedulerResult<WorkerTaskResult> {
        let url = self
            .endpoint(&["task", remote_task_id])
            .map_err(SchedulerError::StatusCheckFailure)?;

        debug!("查询任务状态: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SchedulerError::StatusCheckFailure(self.transport_error(e)))?;

        let result: WorkerTaskResult = self
            .read_json(response)
            .await
            .map_err(SchedulerError::StatusCheckFailure)?;

        self.reset_error_count();
        Ok(result)
    }

    /// 健康检查
    ///
    /// 成功时刷新状态快照并清零错误计数，失败时错误计数加一。
    #[instrument(skip(self), fields(worker_id = %self.id))]
    pub async fn check_status(&self) -> SchedulerResult<WorkerStatusSnapshot> {
        let outcome = match self.endpoint(&["executor", "status"]) {
            Ok(url) => match self.client.get(url).send().await {
                Ok(response) => self.read_json::<WorkerStatusSnapshot>(response).await,
                Err(e) => Err(self.transport_error(e)),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(snapshot) => {
                self.reset_error_count();
                match self.status.write() {
                    Ok(mut status) => *status = snapshot.clone(),
                    Err(poisoned) => *poisoned.into_inner() = snapshot.clone(),
                }
                debug!("Worker {} 健康检查通过: {:?}", self.id, snapshot);
                Ok(snapshot)
            }
            Err(e) => {
                let count = self.incr_error_count();
                warn!("Worker {} 健康检查失败 (连续 {} 次): {}", self.id, count, e);
                Err(SchedulerError::StatusCheckFailure(e))
            }
        }
    }

    /// 拼接接口地址，路径段逐个编码
    fn endpoint(&self, segments: &[&str]) -> Result<Url, WorkerCallError> {
        let invalid = |message: String| WorkerCallError::Transport {
            worker_id: self.id.clone(),
            message,
        };

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("无效的Worker地址 {}: {e}", self.addr)))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("Worker地址不能作为基础URL: {}", self.addr)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn transport_error(&self, err: reqwest::Error) -> WorkerCallError {
        WorkerCallError::Transport {
            worker_id: self.id.clone(),
            message: err.to_string(),
        }
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, WorkerCallError> {
        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if status != StatusCode::OK {
            return Err(WorkerCallError::Rejected {
                worker_id: self.id.clone(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        serde_json::from_slice(&body).map_err(|e| WorkerCallError::MalformedResponse {
            worker_id: self.id.clone(),
            message: e.to_string(),
        })
    }
}

impl std::fmt::Debug for RemoteWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteWorker")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .field("error_count", &self.error_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> reqwest::Client {
        build_http_client(&WorkerClientConfig::default()).unwrap()
    }

    #[test]
    fn test_base_url() {
        let worker = RemoteWorker::new("w1", "127.0.0.1:9000", client());
        assert_eq!(worker.base_url, "http://127.0.0.1:9000");

        let worker = RemoteWorker::new("w2", "https://worker.local/", client());
        assert_eq!(worker.base_url, "https://worker.local");
        assert_eq!(worker.addr(), "https://worker.local/");
    }

    #[test]
    fn test_endpoint_encodes_path_segments() {
        let worker = RemoteWorker::new("w1", "127.0.0.1:9000", client());
        assert_eq!(
            worker.endpoint(&["executor", "status"]).unwrap().as_str(),
            "http://127.0.0.1:9000/executor/status"
        );
        assert_eq!(
            worker.endpoint(&["task", "a/b c?d"]).unwrap().as_str(),
            "http://127.0.0.1:9000/task/a%2Fb%20c%3Fd"
        );

        let worker = RemoteWorker::new("w2", "https://worker.local/api/", client());
        assert_eq!(
            worker.endpoint(&["task", "r-1"]).unwrap().as_str(),
            "https://worker.local/api/task/r-1"
        );
    }

    #[test]
    fn test_error_counter() {
        let worker = RemoteWorker::new("w1", "127.0.0.1:9000", client());
        assert_eq!(worker.incr_error_count(), 1);
        assert_eq!(worker.incr_error_count(), 2);
        assert_eq!(worker.error_count(), 2);
        worker.reset_error_count();
        assert_eq!(worker.error_count(), 0);
    }

    #[test]
    fn test_dispatch_request_layout() {
        let task = Task::new("pdf", "pdfsplitter", serde_json::json!({"file": "a.pdf"}));
        let request = DispatchRequest {
            task_id: task.id(),
            task_type: task.task_type(),
            task_sub_type: task.sub_type(),
            task_detail: task.user_def(),
        };
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["taskId"], task.id());
        assert_eq!(value["taskType"], "pdf");
        assert_eq!(value["taskSubType"], "pdfsplitter");
        assert_eq!(value["taskDetail"]["file"], "a.pdf");
    }

    #[test]
    fn test_dispatch_ack_accepts_both_spellings() {
        let ack: DispatchAck = serde_json::from_str(r#"{"task_id":"w-1"}"#).unwrap();
        assert_eq!(ack.task_id, "w-1");
        let ack: DispatchAck = serde_json::from_str(r#"{"taskId":"w-2"}"#).unwrap();
        assert_eq!(ack.task_id, "w-2");
    }

    #[tokio::test]
    async fn test_unreachable_worker() {
        let worker = RemoteWorker::new("w1", "127.0.0.1:1", client());

        let err = worker.check_status().await.unwrap_err();
        match err {
            SchedulerError::StatusCheckFailure(call) => assert!(call.is_transport()),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(worker.error_count(), 1);

        let task = Task::new("pdf", "pdf2img", serde_json::json!({}));
        assert!(matches!(
            worker.exec(task).await,
            Err(SchedulerError::DispatchFailure(WorkerCallError::Transport { .. }))
        ));
    }
}
