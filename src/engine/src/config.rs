//! 引擎配置
//!
//! 从环境变量读取，未设置时使用默认值；设置了但无法解析时返回 `ConfigError`。

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::env;

use crate::core::cache::CacheBackend;
use crate::errors::ConfigError;

pub const ENV_CACHE_ENABLED: &str = "LOTTO_CACHE_ENABLED";
pub const ENV_CACHE_TTL_SECS: &str = "LOTTO_CACHE_TTL_SECS";
pub const ENV_REMINDER_OFFSET_SECS: &str = "LOTTO_REMINDER_OFFSET_SECS";
pub const ENV_DRAW_UTC_OFFSET_SECS: &str = "LOTTO_DRAW_UTC_OFFSET_SECS";
pub const ENV_PENSION_EPOCH: &str = "LOTTO_PENSION_EPOCH";

/// 开奖结果缓存 1 小时
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
/// 提醒在下次开奖后 10 分钟触发
pub const DEFAULT_REMINDER_OFFSET_SECS: u64 = 600;
/// 开奖所在时区：KST (UTC+9)
pub const DEFAULT_DRAW_UTC_OFFSET_SECS: i32 = 9 * 3600;

/// 缓存 TTL 与提醒偏移的上限：10 年
pub const MAX_DURATION_SECS: u64 = 10 * 365 * 86_400;
/// Pension720 每周四开奖，第 1 期也必须是周四
pub const PENSION_DRAW_WEEKDAY: Weekday = Weekday::Thu;

const SECONDS_PER_DAY: i32 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
    pub reminder_offset_secs: u64,
    pub draw_utc_offset_secs: i32,
    /// Pension720 第 1 期开奖日；未配置时不推算 Pension720 期号
    pub pension_epoch: Option<NaiveDate>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            reminder_offset_secs: DEFAULT_REMINDER_OFFSET_SECS,
            draw_utc_offset_secs: DEFAULT_DRAW_UTC_OFFSET_SECS,
            pension_epoch: None,
        }
    }
}

impl EngineConfig {
    /// 从进程环境变量读取
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源读取（测试中用于避免修改进程环境）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup(ENV_CACHE_ENABLED) {
            config.cache_enabled = parse_bool(ENV_CACHE_ENABLED, &v)?;
        }
        if let Some(v) = lookup(ENV_CACHE_TTL_SECS) {
            config.cache_ttl_secs = match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 && secs <= MAX_DURATION_SECS => secs,
                _ => return Err(ConfigError::invalid(ENV_CACHE_TTL_SECS, &v)),
            };
        }
        if let Some(v) = lookup(ENV_REMINDER_OFFSET_SECS) {
            config.reminder_offset_secs = match v.trim().parse::<u64>() {
                Ok(secs) if secs <= MAX_DURATION_SECS => secs,
                _ => return Err(ConfigError::invalid(ENV_REMINDER_OFFSET_SECS, &v)),
            };
        }
        if let Some(v) = lookup(ENV_DRAW_UTC_OFFSET_SECS) {
            config.draw_utc_offset_secs = match v.trim().parse::<i32>() {
                Ok(secs) if secs.abs() < SECONDS_PER_DAY => secs,
                _ => return Err(ConfigError::invalid(ENV_DRAW_UTC_OFFSET_SECS, &v)),
            };
        }
        if let Some(v) = lookup(ENV_PENSION_EPOCH) {
            config.pension_epoch = match NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d") {
                Ok(date) if date.weekday() == PENSION_DRAW_WEEKDAY => Some(date),
                _ => return Err(ConfigError::invalid(ENV_PENSION_EPOCH, &v)),
            };
        }

        Ok(config)
    }

    pub fn cache_backend(&self) -> CacheBackend {
        if self.cache_enabled {
            CacheBackend::InMem
        } else {
            CacheBackend::Disabled
        }
    }
}

/// 秒数转为 `Duration`，超过上限的值按上限处理
pub(crate) fn bounded_duration(secs: u64) -> Duration {
    // 上限远小于 i64::MAX
    Duration::seconds(secs.min(MAX_DURATION_SECS) as i64)
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::invalid(key, value)),
    }
}
