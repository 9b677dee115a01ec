//! 开奖时间推算
//!
//! 期号、开奖是否已完成、下次开奖时间都是 (产品, now) 的纯函数。
//! 时区以固定偏移表示（默认 KST），`now` 由调用方注入。

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday,
};
use lotto_scan_payload::Product;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{
    EngineConfig, DEFAULT_DRAW_UTC_OFFSET_SECS, ENV_PENSION_EPOCH, PENSION_DRAW_WEEKDAY,
};
use crate::errors::ConfigError;

const SECONDS_PER_WEEK: i64 = 7 * 86_400;

/// 本地时刻（时:分）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawTime {
    pub hour: u32,
    pub minute: u32,
}

impl DrawTime {
    pub const fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    fn seconds_of_day(&self) -> i64 {
        i64::from(self.hour) * 3600 + i64::from(self.minute) * 60
    }
}

/// 单个产品的开奖日历
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawCalendar {
    pub product: Product,
    /// 每周开奖日
    pub weekday: Weekday,
    /// 截止时刻：此时刻之后视为本期已开奖
    pub cutoff: DrawTime,
    /// 对外公布的下次开奖时刻
    pub next_draw: DrawTime,
    /// 第 1 期开奖日（本地日期）
    pub epoch: Option<NaiveDate>,
}

impl DrawCalendar {
    /// 2002-12-07（周六）第 1 期，每周六 20:45
    pub fn lotto645() -> Self {
        Self {
            product: Product::Lotto645,
            weekday: Weekday::Sat,
            cutoff: DrawTime::new(20, 45),
            next_draw: DrawTime::new(20, 45),
            epoch: NaiveDate::from_ymd_opt(2002, 12, 7),
        }
    }

    /// 每周四 19:00 截止、19:05 开奖；没有内置的第 1 期日期
    pub fn pension720() -> Self {
        Self {
            product: Product::Pension720,
            weekday: PENSION_DRAW_WEEKDAY,
            cutoff: DrawTime::new(19, 0),
            next_draw: DrawTime::new(19, 5),
            epoch: None,
        }
    }
}

/// 当前期号推算结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "round", rename_all = "snake_case")]
pub enum RoundEstimate {
    /// 第 1 期之前为 0
    Known(u32),
    Unsupported,
}

impl RoundEstimate {
    pub fn known(self) -> Option<u32> {
        match self {
            RoundEstimate::Known(r) => Some(r),
            RoundEstimate::Unsupported => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawState {
    Completed,
    Pending,
    Unsupported,
}

impl DrawState {
    pub fn is_completed(self) -> bool {
        self == DrawState::Completed
    }
}

/// 开奖时间推算器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawScheduleOracle {
    utc_offset_secs: i64,
    lotto: DrawCalendar,
    pension: DrawCalendar,
}

impl Default for DrawScheduleOracle {
    fn default() -> Self {
        Self::new(DEFAULT_DRAW_UTC_OFFSET_SECS)
    }
}

impl DrawScheduleOracle {
    pub fn new(utc_offset_secs: i32) -> Self {
        Self {
            utc_offset_secs: i64::from(utc_offset_secs),
            lotto: DrawCalendar::lotto645(),
            pension: DrawCalendar::pension720(),
        }
    }

    /// 配置中的 Pension720 epoch 不是开奖日时按未配置处理
    pub fn from_config(config: &EngineConfig) -> Self {
        let oracle = Self::new(config.draw_utc_offset_secs);
        match oracle.clone().with_pension_epoch(config.pension_epoch) {
            Ok(oracle) => oracle,
            Err(err) => {
                warn!(error = %err, "忽略 Pension720 epoch，期号不再推算");
                oracle
            }
        }
    }

    /// 设置 Pension720 第 1 期开奖日，必须落在开奖日（周四）
    pub fn with_pension_epoch(mut self, epoch: Option<NaiveDate>) -> Result<Self, ConfigError> {
        if let Some(date) = epoch {
            if date.weekday() != self.pension.weekday {
                return Err(ConfigError::invalid(ENV_PENSION_EPOCH, &date.to_string()));
            }
        }
        self.pension.epoch = epoch;
        Ok(self)
    }

    pub fn calendar(&self, product: Product) -> &DrawCalendar {
        match product {
            Product::Lotto645 => &self.lotto,
            Product::Pension720 => &self.pension,
        }
    }

    fn to_local(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.naive_utc() + Duration::seconds(self.utc_offset_secs)
    }

    fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        Utc.from_utc_datetime(&(local - Duration::seconds(self.utc_offset_secs)))
    }

    /// `floor((now - epoch) / 7天) + 1`，epoch 取第 1 期开奖日的本地零点
    pub fn current_round(&self, product: Product, now: DateTime<Utc>) -> RoundEstimate {
        let Some(epoch) = self.calendar(product).epoch else {
            return RoundEstimate::Unsupported;
        };
        let elapsed = self.to_local(now) - epoch.and_time(NaiveTime::default());
        if elapsed < Duration::zero() {
            return RoundEstimate::Known(0);
        }
        let weeks = elapsed.num_seconds() / SECONDS_PER_WEEK;
        RoundEstimate::Known(u32::try_from(weeks + 1).unwrap_or(u32::MAX))
    }

    /// 指定期号的开奖截止时刻；期号为 0 或未知第 1 期日期时为 `None`
    pub fn draw_instant(&self, product: Product, round: u32) -> Option<DateTime<Utc>> {
        if round == 0 {
            return None;
        }
        let calendar = self.calendar(product);
        let date = calendar
            .epoch?
            .checked_add_signed(Duration::weeks(i64::from(round) - 1))?;
        let local = date.and_time(NaiveTime::default())
            + Duration::seconds(calendar.cutoff.seconds_of_day());
        Some(self.to_utc(local))
    }

    /// 期号小于当前期为已开奖，大于当前期为未开奖，等于当前期时比较截止时刻
    pub fn is_draw_completed(
        &self,
        product: Product,
        round: u32,
        now: DateTime<Utc>,
    ) -> DrawState {
        let current = match self.current_round(product, now) {
            RoundEstimate::Known(c) => c,
            RoundEstimate::Unsupported => return DrawState::Unsupported,
        };
        if round < current {
            return DrawState::Completed;
        }
        if round > current {
            return DrawState::Pending;
        }
        match self.draw_instant(product, round) {
            Some(at) if now >= at => DrawState::Completed,
            Some(_) => DrawState::Pending,
            None => DrawState::Unsupported,
        }
    }

    /// 严格晚于 `now` 的下一次开奖时刻
    pub fn next_draw_timestamp(&self, product: Product, now: DateTime<Utc>) -> DateTime<Utc> {
        let calendar = self.calendar(product);
        let local = self.to_local(now);
        let today = local.date();
        let days_ahead = (7 + i64::from(calendar.weekday.num_days_from_monday())
            - i64::from(today.weekday().num_days_from_monday()))
            % 7;
        let mut candidate = today.and_time(NaiveTime::default())
            + Duration::days(days_ahead)
            + Duration::seconds(calendar.next_draw.seconds_of_day());
        if candidate <= local {
            candidate += Duration::weeks(1);
        }
        self.to_utc(candidate)
    }
}
