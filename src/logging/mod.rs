use std::collections::HashMap;
use std::time::Instant;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::AppError;

/// 日志格式配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 人类可读格式
    Pretty,
    /// JSON 格式
    Json,
    /// 紧凑格式
    Compact,
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` 指令；`RUST_LOG` 存在时优先
    pub filter: String,
    /// 输出格式
    pub format: LogFormat,
    /// 是否显示目标模块
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否使用 ANSI 颜色
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
            show_target: true,
            show_thread_ids: false,
            ansi: true,
        }
    }
}

impl LoggingConfig {
    /// 命令行 -v
    pub fn verbose(mut self) -> Self {
        self.filter = "debug".to_string();
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.filter))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// 初始化日志系统（输出到 stderr，stdout 留给命令结果）
pub fn init_logging(config: LoggingConfig) -> Result<(), AppError> {
    let filter = config.env_filter();
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .pretty()
                    .with_target(config.show_target)
                    .with_thread_ids(config.show_thread_ids)
                    .with_ansi(config.ansi),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .json()
                    .with_target(config.show_target)
                    .with_thread_ids(config.show_thread_ids),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .compact()
                    .with_target(config.show_target)
                    .with_thread_ids(config.show_thread_ids)
                    .with_ansi(config.ansi),
            )
            .try_init(),
    };
    result.map_err(|e| AppError::Generic(format!("Failed to initialise logging: {}", e)))?;

    tracing::debug!(
        filter = %config.filter,
        format = ?config.format,
        "Logging system initialized"
    );

    Ok(())
}

/// 操作性能计时器
pub struct OperationTimer {
    start: Instant,
    operation: String,
    metadata: HashMap<String, String>,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            start: Instant::now(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// 完成计时并记录日志
    pub fn finish(self) {
        tracing::debug!(
            operation = %self.operation,
            duration_ms = self.start.elapsed().as_millis() as u64,
            metadata = ?self.metadata,
            "Operation completed"
        );
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}
