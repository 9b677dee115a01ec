//! 错误类型定义
//!
//! 开奖前、结果暂不可用、产品不支持等属于预期状态，以 `VerificationOutcome`
//! 取值表达；这里只放真正的失败。

use thiserror::Error;

/// 开奖结果提供方错误
///
/// 对调用方而言所有变体都折叠为同一个"暂不可用"结果，区分只用于日志。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("开奖结果尚未公布")]
    NotPublished,
    #[error("开奖结果服务不可用")]
    Unavailable,
    #[error("传输错误: {0}")]
    Transport(String),
}

/// 配置错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("配置项 {key} 的值无效: {value}")]
    InvalidValue { key: String, value: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, value: &str) -> Self {
        ConfigError::InvalidValue { key: key.to_string(), value: value.to_string() }
    }
}

/// 引擎构建错误
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("日志初始化失败: {0}")]
    Telemetry(String),
}
