use std::future::Future;
use std::time::Duration;

use docsched_core::{RedisConfig, SchedulerError, SchedulerResult};
use redis::aio::ConnectionManager;
use redis::{Client, Cmd, FromRedisValue, Pipeline, RedisError};
use tracing::{debug, error, info};

/// Redis 错误统一映射为存储不可用
pub(crate) fn store_error(context: &str, err: RedisError) -> SchedulerError {
    SchedulerError::StoreUnavailable(format!("{context}: {err}"))
}

/// 带超时的 Redis 连接
///
/// `ConnectionManager` 内部复用一条多路复用连接并自动重连，克隆开销很小，
/// 两个 Redis 注册表可以共享同一个实例。
#[derive(Clone)]
pub struct RedisConnection {
    conn: ConnectionManager,
    key_prefix: String,
    command_timeout: Duration,
}

impl RedisConnection {
    pub async fn connect(config: &RedisConfig) -> SchedulerResult<Self> {
        info!("连接Redis: {}", config.url);

        let client = Client::open(config.url.as_str())
            .map_err(|e| SchedulerError::Configuration(format!("Redis URL无效: {e}")))?;

        let command_timeout = config.command_timeout();
        let conn = with_timeout(command_timeout, "建立Redis连接", client.get_connection_manager())
            .await?;

        let connection = Self {
            conn,
            key_prefix: config.key_prefix.clone(),
            command_timeout,
        };
        connection.ping().await?;

        info!("Redis连接成功");
        Ok(connection)
    }

    /// 拼接带前缀的键
    pub fn key(&self, suffix: &str) -> String {
        format!("{}:{}", self.key_prefix, suffix)
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub async fn ping(&self) -> SchedulerResult<()> {
        let response: String = self.query(&redis::cmd("PING")).await?;
        if response != "PONG" {
            error!("Redis PING 响应异常: {}", response);
            return Err(SchedulerError::StoreUnavailable(format!(
                "Unexpected PING response: {response}"
            )));
        }
        debug!("Redis PING 成功");
        Ok(())
    }

    pub async fn query<T: FromRedisValue>(&self, cmd: &Cmd) -> SchedulerResult<T> {
        let mut conn = self.conn.clone();
        with_timeout(self.command_timeout, "Redis命令执行失败", cmd.query_async(&mut conn)).await
    }

    pub async fn query_pipe<T: FromRedisValue>(&self, pipe: &Pipeline) -> SchedulerResult<T> {
        let mut conn = self.conn.clone();
        with_timeout(
            self.command_timeout,
            "Redis管道执行失败",
            pipe.query_async(&mut conn),
        )
        .await
    }
}

async fn with_timeout<T, F>(timeout: Duration, context: &str, fut: F) -> SchedulerResult<T>
where
    F: Future<Output = Result<T, RedisError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(|e| {
            error!("{}: {}", context, e);
            store_error(context, e)
        }),
        Err(_) => {
            error!("{}: 超时 ({:?})", context, timeout);
            Err(SchedulerError::StoreUnavailable(format!(
                "{context}: 超时 ({timeout:?})"
            )))
        }
    }
}
