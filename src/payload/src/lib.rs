//! 扫码内容解析 - 纯函数核心模块
//!
//! 将扫码得到的任意文本转换为结构化结果：
//! - `classifier`：通用内容分类（网址、电话、短信、邮件、Wi-Fi、位置、名片、日程、文本）
//! - `lottery`：彩票二维码解码（Lotto645 / Pension720）
//!
//! 本模块不做 I/O、不读时钟，所有函数可在任意线程并发调用。

pub mod classifier;
pub mod lottery;
pub mod types;
pub mod utils;

use serde::{Deserialize, Serialize};

pub use classifier::classify;
pub use lottery::{decode as decode_lottery, LOTTERY_DOMAIN_MARKER};
pub use types::*;

/// 一次扫码的解释结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ScanInterpretation {
    Lottery(LotteryTicket),
    Content(ScannedPayload),
}

/// 先尝试彩票解码，非彩票内容回落到通用分类
pub fn interpret(raw: &str) -> ScanInterpretation {
    match lottery::decode(raw) {
        LotteryDecode::Ticket(ticket) => ScanInterpretation::Lottery(ticket),
        LotteryDecode::NotALotteryPayload => ScanInterpretation::Content(classifier::classify(raw)),
    }
}

/// 获取模块版本信息
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
