//! 彩票开奖结果缓存、兑奖核验与提醒策略
//!
//! 解码后的彩票（`lotto_scan_payload::LotteryTicket`）在这里完成：
//! 开奖时间判断、开奖结果拉取与缓存、逐注定级、提醒调度决策。

pub mod config;
pub mod core;
pub mod errors;
pub mod telemetry;


use std::sync::Arc;

pub use lotto_scan_payload::{LotteryTicket, Product};

pub use crate::config::EngineConfig;
pub use crate::core::cache::{
    CacheBackend, CacheStore, InMemoryTtlCache, NullCache, ResultsCache, RoundKey,
};
pub use crate::core::clock::{Clock, ManualClock, SystemClock};
pub use crate::core::notification::{
    NotificationAction, NotificationCommand, NotificationPolicy, NotificationScope, TicketStatus,
};
pub use crate::core::prize::{PrizeAmount, PrizeRule, PrizeTier};
pub use crate::core::provider::{
    DrawResult, FirstPrize, InMemoryResultsProvider, ResultsProvider, WinningNumbers,
};
pub use crate::core::schedule::{
    DrawCalendar, DrawScheduleOracle, DrawState, DrawTime, RoundEstimate,
};
pub use crate::core::verification::{
    GameOutcome, MatchDetail, TicketResult, VerificationEngine, VerificationOutcome,
};
pub use crate::errors::{ConfigError, EngineError, ProviderError};

/// 按同一份配置组装的核验引擎与提醒策略
pub struct LotteryEngine {
    pub verification: VerificationEngine,
    pub notifications: NotificationPolicy,
}

impl LotteryEngine {
    pub fn new(
        config: &EngineConfig,
        provider: Arc<dyn ResultsProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            verification: VerificationEngine::from_config(config, provider, clock),
            notifications: NotificationPolicy::from_config(config),
        }
    }

    /// 从环境变量读取配置并使用系统时钟
    pub fn from_env(provider: Arc<dyn ResultsProvider>) -> Result<Self, EngineError> {
        let config = EngineConfig::from_env()?;
        tracing::info!(?config, "核验引擎配置已加载");
        Ok(Self::new(&config, provider, Arc::new(SystemClock)))
    }
}

/// 获取版本信息
pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
