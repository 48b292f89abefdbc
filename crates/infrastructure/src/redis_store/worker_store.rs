use std::time::Duration;

use async_trait::async_trait;
use docsched_core::{SchedulerError, SchedulerResult, WorkerId, WorkerRecord, WorkerStore};
use tracing::{debug, info, instrument, warn};

use super::connection::RedisConnection;

/// Redis Worker 注册表
///
/// 键布局：
/// - `{prefix}:worker:set` - Worker ID 集合，作为索引
/// - `{prefix}:worker:info:{id}` - Worker 记录 JSON，带过期时间
///
/// 记录是成员关系的唯一依据。集合中存在但记录已过期的 ID 视为不存在，
/// 读取时顺带从集合中清除。
pub struct RedisWorkerStore {
    redis: RedisConnection,
    ttl: Duration,
    set_key: String,
    info_key_prefix: String,
}

impl RedisWorkerStore {
    pub fn new(redis: RedisConnection, ttl: Duration) -> Self {
        let set_key = redis.key("worker:set");
        let info_key_prefix = redis.key("worker:info:");
        Self {
            redis,
            ttl,
            set_key,
            info_key_prefix,
        }
    }

    fn info_key(&self, id: &str) -> String {
        format!("{}{}", self.info_key_prefix, id)
    }

    /// 原子地写入记录（重置过期时间）并加入索引集合
    async fn write_record(&self, record: &WorkerRecord) -> SchedulerResult<()> {
        let payload = serde_json::to_string(record)?;
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("SET")
            .arg(self.info_key(&record.id))
            .arg(payload)
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .ignore()
            .cmd("SADD")
            .arg(&self.set_key)
            .arg(&record.id)
            .ignore();

        self.redis.query_pipe::<()>(&pipe).await
    }

    async fn prune_index(&self, stale_ids: &[WorkerId]) {
        if stale_ids.is_empty() {
            return;
        }

        let mut cmd = redis::cmd("SREM");
        cmd.arg(&self.set_key).arg(stale_ids);
        match self.redis.query::<i64>(&cmd).await {
            Ok(removed) => debug!("从Worker索引中清除 {} 个过期ID", removed),
            Err(e) => warn!("清理Worker索引失败: {}", e),
        }
    }
}

#[async_trait]
impl WorkerStore for RedisWorkerStore {
    #[instrument(skip(self, worker), fields(worker_id = %worker.id))]
    async fn add_worker(&self, worker: &WorkerRecord) -> SchedulerResult<()> {
        self.write_record(worker).await?;
        info!("Worker {} 已写入注册表: {}", worker.id, worker.addr);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn del_worker(&self, id: &str) -> SchedulerResult<()> {
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("SREM")
            .arg(&self.set_key)
            .arg(id)
            .ignore()
            .cmd("DEL")
            .arg(self.info_key(id))
            .ignore();

        self.redis.query_pipe::<()>(&pipe).await?;
        info!("Worker {} 已从注册表移除", id);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_worker(&self, id: &str) -> SchedulerResult<WorkerRecord> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(self.info_key(id));
        let payload: Option<String> = self.redis.query(&cmd).await?;

        match payload {
            Some(payload) => Ok(serde_json::from_str(&payload)?),
            None => {
                self.prune_index(&[id.to_string()]).await;
                Err(SchedulerError::worker_not_found(id))
            }
        }
    }

    #[instrument(skip(self))]
    async fn get_worker_ids(&self) -> SchedulerResult<Vec<WorkerId>> {
        let mut cmd = redis::cmd("SMEMBERS");
        cmd.arg(&self.set_key);
        let members: Vec<WorkerId> = self.redis.query(&cmd).await?;
        if members.is_empty() {
            return Ok(Vec::new());
        }

        let info_keys: Vec<String> = members.iter().map(|id| self.info_key(id)).collect();
        let mut cmd = redis::cmd("MGET");
        cmd.arg(&info_keys);
        let records: Vec<Option<String>> = self.redis.query(&cmd).await?;

        let (mut live, stale): (Vec<_>, Vec<_>) = members
            .into_iter()
            .zip(records)
            .partition(|(_, record)| record.is_some());

        let stale_ids: Vec<WorkerId> = stale.into_iter().map(|(id, _)| id).collect();
        self.prune_index(&stale_ids).await;

        live.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(live.into_iter().map(|(id, _)| id).collect())
    }

    #[instrument(skip(self, worker), fields(worker_id = %worker.id))]
    async fn heartbeat(&self, worker: &WorkerRecord) -> SchedulerResult<WorkerRecord> {
        let mut record = worker.clone();
        record.touch();

        // XX: 只覆盖已存在的记录，不触碰索引集合
        let mut cmd = redis::cmd("SET");
        cmd.arg(self.info_key(&record.id))
            .arg(serde_json::to_string(&record)?)
            .arg("EX")
            .arg(self.ttl.as_secs().max(1))
            .arg("XX");
        let written: Option<String> = self.redis.query(&cmd).await?;

        if written.is_none() {
            debug!("Worker {} 不在注册表中，忽略心跳", record.id);
            return Err(SchedulerError::worker_not_found(&record.id));
        }

        debug!("Worker {} 心跳已刷新", record.id);
        Ok(record)
    }
}
