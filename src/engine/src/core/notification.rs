//! 开奖提醒决策
//!
//! 只根据调用方提供的"是否已查看"状态做决定，输出调度/取消指令，
//! 由外部的推送子系统执行。每个产品至多一条提醒，新指令替换旧指令。

use chrono::{DateTime, Duration, Utc};
use lotto_scan_payload::{LotteryTicket, Product};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{bounded_duration, EngineConfig};
use crate::core::schedule::DrawScheduleOracle;

/// 调用方存储中的彩票状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketStatus {
    pub product: Product,
    pub round: u32,
    pub checked: bool,
}

impl TicketStatus {
    pub fn new(product: Product, round: u32, checked: bool) -> Self {
        Self { product, round, checked }
    }

    pub fn from_ticket(ticket: &LotteryTicket, checked: bool) -> Self {
        Self::new(ticket.product, ticket.round, checked)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "product", rename_all = "snake_case")]
pub enum NotificationScope {
    All,
    Product(Product),
}

impl NotificationScope {
    fn includes(self, product: Product) -> bool {
        match self {
            NotificationScope::All => true,
            NotificationScope::Product(p) => p == product,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAction {
    Schedule,
    Cancel,
}

/// 提醒指令
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationCommand {
    pub action: NotificationAction,
    pub product: Product,
    /// 同一产品的提醒共用此标识，调度时替换已有提醒
    pub notification_id: String,
    pub firing_at: Option<DateTime<Utc>>,
    pub ticket_count: Option<usize>,
}

pub fn notification_id(product: Product) -> String {
    match product {
        Product::Lotto645 => "draw-reminder-lotto645".to_string(),
        Product::Pension720 => "draw-reminder-pension720".to_string(),
    }
}

/// 提醒策略
#[derive(Debug, Clone)]
pub struct NotificationPolicy {
    schedule: DrawScheduleOracle,
    reminder_offset: Duration,
}

impl NotificationPolicy {
    pub fn new(schedule: DrawScheduleOracle, reminder_offset_secs: u64) -> Self {
        Self { schedule, reminder_offset: bounded_duration(reminder_offset_secs) }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(DrawScheduleOracle::from_config(config), config.reminder_offset_secs)
    }

    pub fn unresolved_count(tickets: &[TicketStatus], scope: NotificationScope) -> usize {
        tickets.iter().filter(|t| !t.checked && scope.includes(t.product)).count()
    }

    /// 范围内是否有未查看的彩票
    pub fn has_unresolved(tickets: &[TicketStatus], scope: NotificationScope) -> bool {
        Self::unresolved_count(tickets, scope) > 0
    }

    /// 有未查看的彩票时调度一条提醒（下次开奖 + 偏移），否则取消
    pub fn schedule_or_cancel(
        &self,
        product: Product,
        tickets: &[TicketStatus],
        now: DateTime<Utc>,
    ) -> NotificationCommand {
        let count = Self::unresolved_count(tickets, NotificationScope::Product(product));
        let command = if count > 0 {
            let next_draw = self.schedule.next_draw_timestamp(product, now);
            let firing_at = next_draw.checked_add_signed(self.reminder_offset).unwrap_or_else(|| {
                warn!(product = %product, "提醒时间超出可表示范围，改为开奖时刻");
                next_draw
            });
            NotificationCommand {
                action: NotificationAction::Schedule,
                product,
                notification_id: notification_id(product),
                firing_at: Some(firing_at),
                ticket_count: Some(count),
            }
        } else {
            NotificationCommand {
                action: NotificationAction::Cancel,
                product,
                notification_id: notification_id(product),
                firing_at: None,
                ticket_count: None,
            }
        };
        debug!(product = %product, action = ?command.action, unresolved = count, "提醒决策");
        command
    }

    /// 对所有产品各给出一条指令
    pub fn evaluate_all(
        &self,
        tickets: &[TicketStatus],
        now: DateTime<Utc>,
    ) -> Vec<NotificationCommand> {
        Product::ALL
            .iter()
            .map(|product| self.schedule_or_cancel(*product, tickets, now))
            .collect()
    }
}
