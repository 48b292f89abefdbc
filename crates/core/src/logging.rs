use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogConfig, LogFormat};
use crate::errors::{SchedulerError, SchedulerResult};

/// Initialize structured logging with tracing
///
/// `RUST_LOG` 优先于配置中的级别。全局订阅者已安装时返回 `Ok(false)`，
/// 测试和嵌入场景可以重复调用。
pub fn init_logging(config: &LogConfig) -> SchedulerResult<bool> {
    config
        .validate()
        .map_err(|e| SchedulerError::Configuration(e.to_string()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| SchedulerError::Configuration(format!("日志过滤器无效: {e}")))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match config.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_file(config.include_location)
                .with_line_number(config.include_location);

            registry.with(fmt_layer).try_init().is_ok()
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_file(config.include_location)
                .with_line_number(config.include_location);

            registry.with(fmt_layer).try_init().is_ok()
        }
    };

    if installed {
        info!(
            logging.format = ?config.format,
            logging.level = %config.level,
            "日志系统初始化完成"
        );
    }

    Ok(installed)
}
