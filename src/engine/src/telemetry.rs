//! 日志初始化

use tracing_subscriber::EnvFilter;

use crate::errors::EngineError;

/// 安装 `fmt` 订阅者，过滤规则取自 `RUST_LOG`
///
/// 可重复调用：已有全局订阅者时返回 `EngineError::Telemetry`，调用方可忽略。
pub fn init_tracing() -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .map_err(|e| EngineError::Telemetry(e.to_string()))
}
